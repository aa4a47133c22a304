use std::cell::{Cell, Ref, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use super::error::panic_message;
use super::scope::{Hooks, PendingEffect, Scope};
use super::{HostError, HostInner, Render};
use crate::dependencies::Dependencies;
use crate::{Derived, Evaluation, Invalid, State};

type RenderFn<O> = Box<dyn Fn(&Scope) -> O>;

/// A mounted component and its last rendered output.
///
/// Rendering is tracked like any other derivation: signals and computeds read
/// in the render body, and every signal or computed created through its hooks,
/// schedule it for re-render on change. Dropping the last handle unmounts it.
pub struct Component<O: 'static> {
	body: Rc<ComponentBody<O>>,
}

impl<O: 'static> Clone for Component<O> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct ComponentBody<O: 'static> {
	name: &'static str,
	host: Weak<HostInner>,
	state: Cell<State>,
	mounted: Cell<bool>,
	renders: Cell<u64>,
	output: RefCell<Option<O>>,
	inner: RefCell<ComponentInner<O>>,
	this: Weak<ComponentBody<O>>,
}

struct ComponentInner<O> {
	render: RenderFn<O>,
	hooks: Hooks,
	dependencies: Dependencies,
}

impl<O: 'static> Component<O> {
	pub(crate) fn new(name: &'static str, host: Weak<HostInner>, render: RenderFn<O>) -> Self {
		Component {
			body: Rc::new_cyclic(|this| ComponentBody {
				name,
				host,
				state: Cell::new(State::Invalid(Invalid::Definitely)),
				mounted: Cell::new(true),
				renders: Cell::new(0),
				output: RefCell::new(None),
				inner: RefCell::new(ComponentInner {
					render,
					hooks: Hooks::new(),
					dependencies: Dependencies::new(),
				}),
				this: this.clone(),
			}),
		}
	}

	pub(crate) fn render_now(&self) -> Result<bool, HostError> {
		self.body.render()
	}

	pub fn name(&self) -> &'static str {
		self.body.name
	}

	/// Output of the last successful render.
	pub fn output(&self) -> Ref<'_, O> {
		Ref::map(self.body.output.borrow(), |output| {
			output
				.as_ref()
				.expect("a mounted component has rendered at least once")
		})
	}

	/// Number of successful renders so far, the initial one included.
	pub fn renders(&self) -> u64 {
		self.body.renders.get()
	}

	pub fn is_mounted(&self) -> bool {
		self.body.mounted.get()
	}

	/// Runs effect cleanups, detaches the component from every signal and
	/// computed it was listening to, and drops its hooks. The last output
	/// stays readable. Idempotent.
	pub fn unmount(&self) {
		self.body.unmount()
	}
}

impl<O: 'static> ComponentBody<O> {
	fn parent(&self) -> Weak<dyn Derived> {
		self.this.clone() as Weak<dyn Derived>
	}

	fn unmount(&self) {
		if !self.mounted.replace(false) {
			return;
		}

		let hooks = {
			let mut inner = self.inner.borrow_mut();
			inner.dependencies.release(&self.parent());
			std::mem::take(&mut inner.hooks)
		};

		hooks.unmount_all();

		tracing::debug!(component = self.name, "unmounted");
	}

	fn run_effects(&self, effects: Vec<PendingEffect>) {
		for pending in effects {
			let previous = self.inner.borrow_mut().hooks.begin_effect(pending.index, pending.deps);
			if let Some(cleanup) = previous {
				cleanup();
			}

			let cleanup = (pending.effect)();

			let leftover = if self.mounted.get() {
				self.inner.borrow_mut().hooks.finish_effect(pending.index, cleanup)
			} else {
				cleanup
			};

			// Unmounted while the effect ran.
			if let Some(cleanup) = leftover {
				cleanup();
			}
		}
	}
}

impl<O: 'static> Render for ComponentBody<O> {
	fn render(&self) -> Result<bool, HostError> {
		if !self.mounted.get() || self.state.get() == State::Valid {
			return Ok(false);
		}

		// Writes made while rendering queue this component again.
		self.state.set(State::Valid);

		let parent = self.parent();
		let mut inner = self.inner.borrow_mut();
		let first = self.renders.get() == 0;
		let scope = Scope::new(
			self.name,
			Evaluation::new(parent.clone()),
			parent.clone(),
			std::mem::take(&mut inner.hooks),
			first,
		);

		let result = panic::catch_unwind(AssertUnwindSafe(|| {
			let output = (inner.render)(&scope);
			scope.check_complete();
			output
		}));

		let (evaluation, hooks, effects) = scope.finish();
		inner.hooks = hooks;

		match result {
			Ok(output) => {
				inner.dependencies.swap(evaluation.take(), &parent);
				let dependencies = inner.dependencies.len();
				drop(inner);

				*self.output.borrow_mut() = Some(output);
				self.renders.set(self.renders.get() + 1);
				tracing::debug!(
					component = self.name,
					renders = self.renders.get(),
					dependencies,
					"rendered"
				);

				self.run_effects(effects);
				Ok(true)
			}
			Err(payload) => {
				inner.dependencies.merge(evaluation.take());
				let message = panic_message(&*payload);
				tracing::error!(component = self.name, %message, "render panicked");
				Err(HostError::RenderPanicked {
					component: self.name,
					message,
				})
			}
		}
	}
}

impl<O: 'static> Derived for ComponentBody<O> {
	fn invalidate(self: Rc<Self>, _: Invalid) {
		if !self.mounted.get() || self.state.get() != State::Valid {
			return;
		}

		self.state.set(State::Invalid(Invalid::Definitely));
		if let Some(host) = self.host.upgrade() {
			host.schedule(self.this.clone() as Weak<dyn Render>, self.name);
		}
	}
}

impl<O: 'static> Drop for ComponentBody<O> {
	fn drop(&mut self) {
		self.unmount();
	}
}

impl<O: 'static> std::fmt::Debug for Component<O> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.body.name)
			.field("mounted", &self.body.mounted.get())
			.field("renders", &self.body.renders.get())
			.finish()
	}
}
