use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

use crate::Version;

/// A value together with its fxhash fingerprint.
///
/// The fingerprint is the version of a signal or computed: a write that leaves
/// the fingerprint unchanged is not observable by dependents.
pub struct Hashed<T> {
	pub value: T,
	pub hash: u64,
}

impl<T> Hashed<T> {
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		let hash = fxhash::hash64(&value);
		Self { value, hash }
	}

	/// Recomputes the fingerprint after an in-place mutation and reports
	/// whether it changed.
	pub fn rehash(&mut self) -> bool
	where
		T: Hash,
	{
		let hash = fxhash::hash64(&self.value);
		let changed = hash != self.hash;
		self.hash = hash;
		changed
	}

	pub fn version(&self) -> Version {
		Version::Hash(self.hash)
	}
}

impl<T> Deref for Hashed<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.value
	}
}

impl<T> Debug for Hashed<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.value.fmt(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rehash_reports_changes_only() {
		let mut hashed = Hashed::new(vec![1, 2, 3]);
		let before = hashed.version();

		hashed.value.sort();
		assert!(!hashed.rehash());
		assert_eq!(hashed.version(), before);

		hashed.value.push(4);
		assert!(hashed.rehash());
		assert_ne!(hashed.version(), before);
	}
}
