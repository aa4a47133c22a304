use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::addr::WeakAddr;
use crate::dependencies::Dependencies;
use crate::value::Access;
use crate::{Derived, Evaluation, Hashed, Invalid, Observable, State, Value, Version};

type Derivation<T> = Rc<dyn Fn(&Evaluation) -> T>;

/// A value derived from signals and other computeds.
///
/// The dependency set is rebuilt on every evaluation: whatever the derivation
/// read through its [`Evaluation`] last time is exactly what can invalidate it
/// next. Evaluation is lazy; an invalidated computed recomputes on its next
/// read.
pub struct Computed<T>
where
	T: Hash + 'static,
{
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T>
where
	T: Hash,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct ComputedBody<T>
where
	T: Hash + 'static,
{
	value: RefCell<Option<Hashed<T>>>,
	inner: RefCell<ComputedInner<T>>,
}

struct ComputedInner<T>
where
	T: Hash + 'static,
{
	/// `None` for computeds driven by a component hook: those receive a fresh
	/// derivation on every render instead of keeping one.
	func: Option<Derivation<T>>,
	state: State,
	used_by: FxHashSet<WeakAddr<dyn Derived>>,
	dependencies: Dependencies,
	this: Weak<ComputedBody<T>>,
}

impl<T> Drop for ComputedInner<T>
where
	T: Hash + 'static,
{
	fn drop(&mut self) {
		let refr = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.release(&refr);
	}
}

impl<T> Computed<T>
where
	T: Hash + 'static,
{
	pub fn new(func: Box<dyn Fn(&Evaluation) -> T>) -> Self {
		Self::with_func(Some(Rc::from(func)))
	}

	pub(crate) fn detached() -> Self {
		Self::with_func(None)
	}

	fn with_func(func: Option<Derivation<T>>) -> Self {
		Computed {
			body: Rc::new_cyclic(|this| ComputedBody {
				value: RefCell::new(None),
				inner: RefCell::new(ComputedInner {
					func,
					state: State::Invalid(Invalid::Definitely),
					used_by: FxHashSet::default(),
					dependencies: Dependencies::new(),
					this: this.clone(),
				}),
			}),
		}
	}

	/// Untracked read, recomputing first if needed.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.get_once()
	}

	/// Tracked read, recomputing first if needed.
	#[inline]
	pub fn get<'a>(&'a self, cx: &'a impl AsRef<Evaluation>) -> Ref<'a, T> {
		self.body.get(cx.as_ref())
	}

	/// Runs `func` as this computed's derivation right now, regardless of
	/// state, and commits its result and dependency set.
	pub(crate) fn evaluate_with(&self, func: impl FnOnce(&Evaluation) -> T) {
		self.body.evaluate(func);
	}

	pub fn is_valid(&self) -> bool {
		self.body.inner.borrow().state == State::Valid
	}

	/// Number of observables read during the last evaluation.
	pub fn dependency_count(&self) -> usize {
		self.body.inner.borrow().dependencies.len()
	}

	/// Number of live derived nodes currently subscribed.
	pub fn observers(&self) -> usize {
		self.body
			.inner
			.borrow()
			.used_by
			.iter()
			.filter(|item| item.is_alive())
			.count()
	}
}

impl<T> ComputedBody<T>
where
	T: Hash + 'static,
{
	pub fn get_once(&self) -> Ref<'_, T> {
		self.inner_update();
		self.current()
	}

	pub fn get<'a>(&'a self, eval: &'_ Evaluation) -> Ref<'a, T> {
		self.inner_update();
		{
			let mut self_mut = self.inner.borrow_mut();
			if let Some(this) = self_mut.this.upgrade() {
				eval.based_on(this, self.version());
			}
			self_mut.used_by(eval.parent());
		}
		self.current()
	}

	fn current(&self) -> Ref<'_, T> {
		Ref::map(self.value.borrow(), |s| {
			&s.as_ref()
				.expect("computed read before its first evaluation")
				.value
		})
	}

	fn used_by(&self, observable: Weak<dyn Derived>) {
		self.inner.borrow_mut().used_by(observable);
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.inner.borrow_mut().not_used_by(derived);
	}

	// No borrow of `inner` is held while dependencies update or the
	// derivation runs: either may write a signal this computed reads.
	fn inner_update(&self) {
		let state = self.inner.borrow().state;
		match state {
			State::Valid => return,
			State::Invalid(Invalid::Definitely) => {}
			State::Invalid(Invalid::Maybe) => {
				let dependencies = mem::take(&mut self.inner.borrow_mut().dependencies);
				let is_valid = dependencies.are_valid();

				let mut self_mut = self.inner.borrow_mut();
				self_mut.dependencies = dependencies;
				if is_valid {
					self_mut.state = State::Valid;
					return;
				}
			}
		}

		let func = self.inner.borrow().func.clone();
		match func {
			Some(func) => self.evaluate(|ev| func(ev)),
			// Hook-driven: the owning component re-renders and re-evaluates.
			None => self.inner.borrow_mut().state = State::Valid,
		}
	}

	fn evaluate(&self, func: impl FnOnce(&Evaluation) -> T) {
		let parent = {
			// Marked valid up front so a write to one of its own inputs during
			// the run invalidates it again.
			let mut self_mut = self.inner.borrow_mut();
			self_mut.state = State::Valid;
			self_mut.this.clone() as Weak<dyn Derived>
		};
		let evaluation = Evaluation::new(parent.clone());
		let result = panic::catch_unwind(AssertUnwindSafe(|| func(&evaluation)));

		let mut self_mut = self.inner.borrow_mut();
		match result {
			Ok(value) => {
				self_mut.dependencies.swap(evaluation.take(), &parent);
				tracing::trace!(
					dependencies = self_mut.dependencies.len(),
					valid = self_mut.state == State::Valid,
					"computed evaluated"
				);
				*self.value.borrow_mut() = Some(Hashed::new(value));
			}
			Err(payload) => {
				// Keep listening to everything read before the failure, so a
				// fix to any of those inputs triggers another attempt. The
				// previous value, if any, stays current until then.
				self_mut.dependencies.merge(evaluation.take());
				if self.value.borrow().is_none() {
					self_mut.state = State::Invalid(Invalid::Definitely);
				}
				drop(self_mut);
				panic::resume_unwind(payload)
			}
		}
	}
}

impl<T> ComputedInner<T>
where
	T: Hash + 'static,
{
	fn used_by(&mut self, observable: Weak<dyn Derived>) {
		self.used_by.insert(WeakAddr::new(observable));
	}

	fn not_used_by(&mut self, derived: &Weak<dyn Derived>) {
		self.used_by.remove(&WeakAddr::new(derived.clone()));
	}
}

impl<T> Observable for ComputedBody<T>
where
	T: Hash + 'static,
{
	fn update(&self) -> Version {
		self.inner_update();
		self.version()
	}

	fn version(&self) -> Version {
		self.value
			.borrow()
			.as_ref()
			.map_or(Version::Hash(0), Hashed::version)
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		ComputedBody::used_by(self, derived)
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		ComputedBody::not_used_by(self, derived)
	}
}

impl<T> Access<T> for ComputedBody<T>
where
	T: Hash + 'static,
{
	fn get(&self, tracker: &Evaluation) -> Ref<'_, T> {
		ComputedBody::get(self, tracker)
	}

	fn get_once(&self) -> Ref<'_, T> {
		ComputedBody::get_once(self)
	}
}

impl<T> Derived for ComputedBody<T>
where
	T: Hash + 'static,
{
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		let targets: SmallVec<[Rc<dyn Derived>; 4]> = {
			let mut self_mut = self.inner.borrow_mut();
			if !matches!(self_mut.state, State::Valid) {
				return;
			}

			self_mut.state = State::Invalid(invalid);
			self_mut.used_by.retain(|item| item.is_alive());
			self_mut.used_by.iter().filter_map(|item| item.upgrade()).collect()
		};

		for item in targets {
			item.invalidate(Invalid::Maybe);
		}
	}
}

impl<T> From<Computed<T>> for Value<T>
where
	T: Hash + 'static,
{
	fn from(computed: Computed<T>) -> Self {
		Value::new(computed.body)
	}
}

impl<T> Debug for Computed<T>
where
	T: Hash + Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
