use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::hash::Hash;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::{Computed, Derived, Evaluation, Invalid, Signal};

/// Teardown returned by an effect; runs before the effect runs again and on
/// unmount.
pub type Cleanup = Box<dyn FnOnce()>;

/// A retained slot of a component.
pub(crate) trait Hook: Any {
	fn as_any_mut(&mut self) -> &mut dyn Any;

	fn unmount(self: Box<Self>);
}

/// The hook slots of one component, in call order.
#[derive(Default)]
pub(crate) struct Hooks {
	slots: SmallVec<[Box<dyn Hook>; 8]>,
}

impl Hooks {
	pub fn new() -> Self {
		Self::default()
	}

	fn effect(&mut self, index: usize) -> Option<&mut EffectHook> {
		self.slots
			.get_mut(index)
			.and_then(|slot| slot.as_any_mut().downcast_mut::<EffectHook>())
	}

	/// Records the new deps of the effect at `index` and hands back the
	/// cleanup of its previous run.
	pub fn begin_effect(&mut self, index: usize, deps: u64) -> Option<Cleanup> {
		let hook = self.effect(index)?;
		hook.deps = Some(deps);
		hook.cleanup.take()
	}

	/// Stores `cleanup` for the effect at `index`. Gives it back if the slot
	/// is gone.
	pub fn finish_effect(&mut self, index: usize, cleanup: Option<Cleanup>) -> Option<Cleanup> {
		match self.effect(index) {
			Some(hook) => {
				hook.cleanup = cleanup;
				None
			}
			None => cleanup,
		}
	}

	/// Tears the slots down, last declared first.
	pub fn unmount_all(self) {
		for hook in self.slots.into_iter().rev() {
			hook.unmount();
		}
	}
}

struct SignalHook<T>(Signal<T>);

impl<T: 'static> Hook for SignalHook<T> {
	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn unmount(self: Box<Self>) {
		self.0.release_owner();
	}
}

struct ComputedHook<T: Hash + 'static>(Computed<T>);

impl<T: Hash + 'static> Hook for ComputedHook<T> {
	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn unmount(self: Box<Self>) {}
}

struct RefHook<T>(Retained<T>);

impl<T: 'static> Hook for RefHook<T> {
	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn unmount(self: Box<Self>) {}
}

struct EffectHook {
	deps: Option<u64>,
	cleanup: Option<Cleanup>,
}

impl Hook for EffectHook {
	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn unmount(self: Box<Self>) {
		if let Some(cleanup) = self.cleanup {
			cleanup();
		}
	}
}

pub(crate) struct PendingEffect {
	pub index: usize,
	pub deps: u64,
	pub effect: Box<dyn FnOnce() -> Option<Cleanup>>,
}

/// A mutable cell retained across renders. Writing it does not re-render.
pub struct Retained<T> {
	cell: Rc<RefCell<T>>,
}

impl<T> Clone for Retained<T> {
	fn clone(&self) -> Self {
		Retained {
			cell: self.cell.clone(),
		}
	}
}

impl<T> Retained<T> {
	pub fn get(&self) -> Ref<'_, T> {
		self.cell.borrow()
	}

	pub fn replace(&self, value: T) -> T {
		self.cell.replace(value)
	}

	pub fn set(&self, value: T) {
		self.replace(value);
	}
}

/// Render context of a component. Hooks are matched to their slots by call
/// order, so every render must call the same hooks in the same order.
pub struct Scope {
	name: &'static str,
	evaluation: Evaluation,
	owner: Weak<dyn Derived>,
	hooks: RefCell<Hooks>,
	cursor: Cell<usize>,
	first: bool,
	effects: RefCell<Vec<PendingEffect>>,
}

impl AsRef<Evaluation> for Scope {
	fn as_ref(&self) -> &Evaluation {
		&self.evaluation
	}
}

impl Scope {
	pub(crate) fn new(
		name: &'static str,
		evaluation: Evaluation,
		owner: Weak<dyn Derived>,
		hooks: Hooks,
		first: bool,
	) -> Self {
		Scope {
			name,
			evaluation,
			owner,
			hooks: RefCell::new(hooks),
			cursor: Cell::new(0),
			first,
			effects: RefCell::new(Vec::new()),
		}
	}

	pub(crate) fn finish(self) -> (Evaluation, Hooks, Vec<PendingEffect>) {
		(
			self.evaluation,
			self.hooks.into_inner(),
			self.effects.into_inner(),
		)
	}

	pub(crate) fn check_complete(&self) {
		let declared = self.hooks.borrow().slots.len();
		let called = self.cursor.get();
		if !self.first && called != declared {
			panic!(
				"component `{}` called {} hooks, previous render called {}",
				self.name, called, declared
			);
		}
	}

	/// Name the component was mounted with.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Whether this is the component's initial render.
	pub fn is_first_render(&self) -> bool {
		self.first
	}

	fn hook<H, R>(&self, create: impl FnOnce() -> H, access: impl FnOnce(&mut H) -> R) -> R
	where
		H: Hook,
	{
		let index = self.cursor.get();
		self.cursor.set(index + 1);

		if index == self.hooks.borrow().slots.len() {
			if !self.first {
				panic!(
					"component `{}` called more hooks than during its previous render",
					self.name
				);
			}
			// Built before borrowing: initializers may read other signals.
			let hook = create();
			self.hooks.borrow_mut().slots.push(Box::new(hook));
		}

		let mut hooks = self.hooks.borrow_mut();
		let hook = hooks.slots[index]
			.as_any_mut()
			.downcast_mut::<H>()
			.unwrap_or_else(|| {
				panic!(
					"component `{}`: hook #{} changed kind between renders",
					self.name, index
				)
			});
		access(hook)
	}

	/// Declares a signal owned by this component. The value is used on the
	/// first render only; later renders get the same signal back.
	pub fn use_signal<T>(&self, value: T) -> Signal<T>
	where
		T: Hash + 'static,
	{
		self.use_signal_with(|| value)
	}

	/// Like [`Scope::use_signal`], with the initial value produced by `init`.
	/// `init` runs once, on the first render.
	pub fn use_signal_with<T>(&self, init: impl FnOnce() -> T) -> Signal<T>
	where
		T: Hash + 'static,
	{
		self.hook(
			|| SignalHook(Signal::owned_by(init(), self.owner.clone())),
			|hook: &mut SignalHook<T>| hook.0.clone(),
		)
	}

	/// Evaluates `derive` now, tracking what it reads, and returns the result.
	///
	/// The derivation is supplied on every render and always re-run; it may
	/// borrow render-local values, including results of earlier
	/// `use_computed` calls. When anything it read changes, the component
	/// re-renders.
	pub fn use_computed<T>(&self, derive: impl FnOnce(&Evaluation) -> T) -> T
	where
		T: Hash + Clone + 'static,
	{
		let computed = self.hook(
			|| ComputedHook(Computed::detached()),
			|hook: &mut ComputedHook<T>| hook.0.clone(),
		);

		computed.evaluate_with(derive);
		if !computed.is_valid() {
			// The derivation wrote one of its own inputs: render again.
			if let Some(owner) = self.owner.upgrade() {
				owner.invalidate(Invalid::Definitely);
			}
		}
		let value = computed.get(&self.evaluation).clone();
		value
	}

	/// A cell retained across renders; the value is used on the first render
	/// only.
	pub fn use_ref<T: 'static>(&self, value: T) -> Retained<T> {
		self.hook(
			|| {
				RefHook(Retained {
					cell: Rc::new(RefCell::new(value)),
				})
			},
			|hook: &mut RefHook<T>| hook.0.clone(),
		)
	}

	/// Runs `effect` after this render commits, if the hash of `deps` differs
	/// from the previous run. The cleanup it returns runs before the next run
	/// and on unmount.
	pub fn use_effect<D, F>(&self, deps: D, effect: F)
	where
		D: Hash,
		F: FnOnce() -> Option<Cleanup> + 'static,
	{
		let deps = fxhash::hash64(&deps);
		let index = self.cursor.get();
		let changed = self.hook(
			|| EffectHook {
				deps: None,
				cleanup: None,
			},
			|hook: &mut EffectHook| hook.deps != Some(deps),
		);

		if changed {
			self.effects.borrow_mut().push(PendingEffect {
				index,
				deps,
				effect: Box::new(effect),
			});
		}
	}
}
