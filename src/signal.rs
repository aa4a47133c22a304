use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::addr::WeakAddr;
use crate::evaluation::Evaluation;
use crate::value::{Access, Value};
use crate::{Computed, Derived, Hashed, Invalid, Observable, Version};

/// A mutable reactive value.
///
/// Reading through [`Signal::get`] subscribes the running evaluation; every
/// write that changes the value's fingerprint invalidates the subscribers and,
/// when the signal was created by a component hook, schedules that component
/// to re-render.
pub struct Signal<T> {
	body: Rc<SignalBody<T>>,
}

pub(crate) struct SignalBody<T> {
	value: RefCell<Hashed<T>>,
	inner: RefCell<SignalInner<T>>,
}

struct SignalInner<T> {
	used_by: FxHashSet<WeakAddr<dyn Derived>>,
	owner: Option<Weak<dyn Derived>>,
	this: Weak<SignalBody<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Signal<T>
where
	T: Default + Hash + 'static,
{
	fn default() -> Self {
		Signal::new(Default::default())
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Signal<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		Signal {
			body: Rc::new_cyclic(|this| SignalBody {
				value: RefCell::new(Hashed::new(value)),
				inner: RefCell::new(SignalInner {
					used_by: FxHashSet::default(),
					owner: None,
					this: this.clone(),
				}),
			}),
		}
	}

	/// A signal whose writes always notify `owner`, independent of what
	/// `owner` read during its last evaluation.
	pub(crate) fn owned_by(value: T, owner: Weak<dyn Derived>) -> Self
	where
		T: Hash,
	{
		let signal = Signal::new(value);
		signal.body.inner.borrow_mut().owner = Some(owner);
		signal
	}

	pub(crate) fn release_owner(&self) {
		self.body.inner.borrow_mut().owner = None;
	}

	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Hash + 'static,
	{
		let this = self.body.clone();
		Computed::new(Box::new(move |ev| {
			let value = this.get(ev);
			func(&*value)
		}))
	}

	/// Tracked read: `eval` starts depending on this signal.
	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Ref<'_, T> {
		self.body.get(eval.as_ref())
	}

	/// Untracked read.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.get_once()
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		self.body.set(value)
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Hash,
	{
		self.update(T::toggle)
	}

	#[inline]
	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		self.body.replace(value)
	}

	/// Mutates the value in place. Observably the same as writing a new value:
	/// dependents are notified only if the mutation changed the fingerprint.
	/// An update that leaves the value hashing equal (setting a field to what
	/// it already holds, say) notifies nobody and re-renders nothing.
	#[inline]
	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		self.body.update(func)
	}

	/// Number of live derived nodes currently subscribed. The owning
	/// component is not counted.
	pub fn observers(&self) -> usize {
		self.body.observers()
	}
}

impl<T> SignalBody<T> {
	pub fn get_once(&self) -> Ref<'_, T> {
		Ref::map(self.value.borrow(), |s| &s.value)
	}

	pub fn get<'a>(&'a self, eval: &'_ Evaluation) -> Ref<'a, T>
	where
		T: 'static,
	{
		let value = self.value.borrow();

		{
			let mut self_mut = self.inner.borrow_mut();
			if let Some(this) = self_mut.this.upgrade() {
				eval.based_on(this, value.version());
			}
			self_mut.used_by(eval.parent());
		}

		Ref::map(value, |v| &v.value)
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		let changed = {
			let mut value = self.value.borrow_mut();
			func(&mut value.value);
			value.rehash()
		};

		if changed {
			self.invalidate()
		}
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		let new = Hashed::new(value);
		let hash = new.hash;

		let old = std::mem::replace(&mut *self.value.borrow_mut(), new);
		if old.hash != hash {
			self.invalidate();
		}

		old.value
	}

	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		let _ = self.replace(value);
	}

	fn observers(&self) -> usize {
		self.inner
			.borrow()
			.used_by
			.iter()
			.filter(|item| item.is_alive())
			.count()
	}

	fn invalidate(&self) {
		let targets: SmallVec<[Rc<dyn Derived>; 4]> = {
			let mut self_mut = self.inner.borrow_mut();
			self_mut.used_by.retain(|item| item.is_alive());
			self_mut
				.owner
				.iter()
				.chain(self_mut.used_by.iter().map(|item| &**item))
				.filter_map(Weak::upgrade)
				.collect()
		};

		tracing::trace!(notified = targets.len(), "signal changed");

		for item in targets {
			item.invalidate(Invalid::Definitely)
		}
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.inner.borrow_mut().used_by(derived);
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.inner.borrow_mut().not_used_by(derived);
	}
}

impl<T> SignalInner<T> {
	fn used_by(&mut self, derived: Weak<dyn Derived>) {
		self.used_by.insert(WeakAddr::new(derived));
	}

	fn not_used_by(&mut self, derived: &Weak<dyn Derived>) {
		self.used_by.remove(&WeakAddr::new(derived.clone()));
	}
}

impl<T: 'static> Observable for SignalBody<T> {
	fn version(&self) -> Version {
		self.value.borrow().version()
	}

	fn update(&self) -> Version {
		self.version()
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		SignalBody::used_by(self, derived)
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		SignalBody::not_used_by(self, derived)
	}
}

impl<T> Access<T> for SignalBody<T>
where
	T: 'static,
{
	fn get(&self, eval: &Evaluation) -> Ref<'_, T> {
		SignalBody::get(self, eval)
	}

	fn get_once(&self) -> Ref<'_, T> {
		SignalBody::get_once(self)
	}
}

impl<T> From<Signal<T>> for Value<T>
where
	T: 'static,
{
	fn from(signal: Signal<T>) -> Self {
		Value::new(signal.body)
	}
}

impl<T> Hash for Signal<T> {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		state.write_u64(self.body.value.borrow().hash);
	}
}

impl<T> Debug for Signal<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
