//! Signals and computed values for hook-based components.
//!
//! A [`Signal`] holds a value and notifies everything that read it when it is
//! written. A [`Computed`] derives a value from other signals and computeds;
//! its dependencies are discovered through the [`Evaluation`] passed into the
//! derivation, never declared up front.
//!
//! The [`host`] module provides the component side: a [`Host`] owns a render
//! queue, a [`Component`] re-renders when something it (or one of its hooks)
//! depends on changes, and [`Scope`] exposes the hooks.

pub mod macros;

mod addr;
mod computed;
mod dependencies;
mod evaluation;
mod hashed;
pub mod host;
mod signal;
mod value;

use std::rc::{Rc, Weak};

pub use computed::Computed;
pub use dependencies::Dependencies;
pub use evaluation::Evaluation;
pub use hashed::Hashed;
pub use host::{Cleanup, Component, Host, HostError, HostOptions, Retained, Scope};
pub use signal::{Signal, Toggle};
pub use value::Value;

pub trait Derived: 'static {
	fn invalidate(self: Rc<Self>, invalid: Invalid);
}

pub trait Observable: 'static {
	/// This function is called when we want
	/// this observable to recompute itself.
	fn update(&self) -> Version;

	/// This function should return the current
	/// computed version.
	fn version(&self) -> Version;

	/// Notify this observable that `derived` started
	/// to listen.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// Notify this observable that `derived` stopped
	/// to listen.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
	Valid,
	Invalid(Invalid),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Invalid {
	/// A transitive dependency changed; the node may still be up to date.
	Maybe,
	/// A direct dependency changed.
	Definitely,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Version {
	Hash(u64),
}
