//! A minimal component host.
//!
//! It supplies what signals and computeds need from a UI framework: retained
//! per-component hook slots, effects that run after commit, and a render queue
//! that components land on when something they depend on is written.

mod component;
mod error;
mod options;
mod scope;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub use component::Component;
pub use error::HostError;
pub use options::HostOptions;
pub use scope::{Cleanup, Retained, Scope};

/// Something the host can re-render from its queue.
pub(crate) trait Render {
	/// Re-renders if still mounted and invalid. Returns whether a render
	/// actually happened.
	fn render(&self) -> Result<bool, HostError>;
}

/// Owns the render queue of a tree of components.
///
/// Each host is its own scheduling domain; nothing is shared between hosts.
#[derive(Clone, Default)]
pub struct Host {
	inner: Rc<HostInner>,
}

#[derive(Default)]
pub(crate) struct HostInner {
	options: HostOptions,
	queue: RefCell<Vec<Weak<dyn Render>>>,
	depth: Cell<usize>,
}

struct Batch<'a> {
	host: &'a HostInner,
}

impl Drop for Batch<'_> {
	fn drop(&mut self) {
		self.host.depth.set(self.host.depth.get() - 1);
	}
}

impl HostInner {
	fn enter(&self) -> Batch<'_> {
		self.depth.set(self.depth.get() + 1);
		Batch { host: self }
	}

	fn in_batch(&self) -> bool {
		self.depth.get() > 0
	}

	pub(crate) fn schedule(&self, component: Weak<dyn Render>, name: &'static str) {
		if !self.in_batch() && self.options.warn_outside_act {
			tracing::warn!(
				component = name,
				"update outside of Host::act; re-render is queued until Host::flush"
			);
		}
		self.queue.borrow_mut().push(component);
	}
}

impl Host {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_options(options: HostOptions) -> Self {
		Host {
			inner: Rc::new(HostInner {
				options,
				..Default::default()
			}),
		}
	}

	pub fn options(&self) -> &HostOptions {
		&self.inner.options
	}

	/// Mounts a component: renders it once, commits, and runs its effects.
	pub fn mount<O, F>(&self, name: &'static str, render: F) -> Result<Component<O>, HostError>
	where
		O: 'static,
		F: Fn(&Scope) -> O + 'static,
	{
		let component = Component::new(name, Rc::downgrade(&self.inner), Box::new(render));
		{
			let _batch = self.inner.enter();
			component.render_now()?;
		}
		tracing::debug!(component = name, "mounted");

		if !self.inner.in_batch() {
			self.flush()?;
		}
		Ok(component)
	}

	/// Runs `func` as one batch. Writes inside only queue re-renders; the
	/// queue is flushed once the outermost `act` returns.
	pub fn act<R>(&self, func: impl FnOnce() -> R) -> Result<R, HostError> {
		let result = {
			let _batch = self.inner.enter();
			func()
		};

		if !self.inner.in_batch() {
			self.flush()?;
		}
		Ok(result)
	}

	pub fn has_pending(&self) -> bool {
		!self.inner.queue.borrow().is_empty()
	}

	/// Re-renders queued components until the queue is empty. Returns the
	/// number of renders performed.
	pub fn flush(&self) -> Result<usize, HostError> {
		let _batch = self.inner.enter();
		let mut rendered = 0;
		let mut passes = 0;

		loop {
			let pending = std::mem::take(&mut *self.inner.queue.borrow_mut());
			if pending.is_empty() {
				break;
			}

			passes += 1;
			if passes > self.inner.options.max_render_passes {
				tracing::error!(passes, "render loop detected");
				self.inner.queue.borrow_mut().extend(pending);
				return Err(HostError::RenderLoop { passes });
			}

			let mut pending = pending.into_iter();
			while let Some(component) = pending.next() {
				let Some(component) = component.upgrade() else {
					continue;
				};

				match component.render() {
					Ok(true) => rendered += 1,
					Ok(false) => {}
					Err(err) => {
						// Whatever is left stays queued for the next flush.
						self.inner.queue.borrow_mut().extend(pending);
						return Err(err);
					}
				}
			}
		}

		if rendered > 0 {
			tracing::debug!(passes, rendered, "flushed");
		}
		Ok(rendered)
	}
}
