use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::addr::RcAddr;
use crate::{Derived, Observable, Version};

/// The observables a derived node read during one evaluation, with the
/// version each one had at that moment.
#[derive(Default)]
pub struct Dependencies {
	based_on: FxHashMap<RcAddr<dyn Observable>, Version>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.based_on.len()
	}

	pub fn is_empty(&self) -> bool {
		self.based_on.is_empty()
	}

	/// Stops listening to every dependency and forgets them.
	pub fn release(&mut self, parent: &Weak<dyn Derived>) {
		for (item, _) in self.based_on.drain() {
			item.not_used_by(parent)
		}
	}

	pub fn based_on(&mut self, observable: Rc<dyn Observable>, version: Version) {
		self.based_on.insert(RcAddr::new(observable), version);
	}

	pub fn are_valid(&self) -> bool {
		self.based_on
			.iter()
			.all(|(base, version)| base.update() == *version)
	}

	/// Replaces the set with `next`, unsubscribing `parent` from everything
	/// that was read last time but not this time.
	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		let mut released = 0;
		for key in prev.keys() {
			if !self.based_on.contains_key(key) {
				key.not_used_by(parent);
				released += 1;
			}
		}

		tracing::trace!(kept = self.based_on.len(), released, "dependencies swapped");
	}

	/// Adds `next` to the current set without releasing anything. Used when
	/// an evaluation is aborted and only part of its reads are known.
	pub fn merge(&mut self, next: Dependencies) {
		self.based_on.extend(next.based_on);
	}
}
