use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Strong pointer compared and hashed by the address of its allocation.
///
/// Only the data address takes part; vtable pointers of `dyn` targets are
/// ignored so the same node reached through two coercions stays one key.
pub struct RcAddr<T: ?Sized> {
	ptr: Rc<T>,
}

impl<T: ?Sized> RcAddr<T> {
	pub fn new(ptr: Rc<T>) -> Self {
		RcAddr { ptr }
	}

	fn addr(&self) -> *const () {
		Rc::as_ptr(&self.ptr).cast::<()>()
	}
}

impl<T: ?Sized> Deref for RcAddr<T> {
	type Target = Rc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for RcAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for RcAddr<T> {}

impl<T: ?Sized> Hash for RcAddr<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}

/// Weak counterpart of [`RcAddr`]. The address stays valid as a key after the
/// target is dropped, so dead entries can still be removed.
pub struct WeakAddr<T: ?Sized> {
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakAddr<T> {
	pub fn new(ptr: Weak<T>) -> Self {
		WeakAddr { ptr }
	}

	fn addr(&self) -> *const () {
		Weak::as_ptr(&self.ptr).cast::<()>()
	}

	pub fn is_alive(&self) -> bool {
		self.ptr.strong_count() > 0
	}
}

impl<T: ?Sized> Clone for WeakAddr<T> {
	fn clone(&self) -> Self {
		WeakAddr {
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for WeakAddr<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for WeakAddr<T> {}

impl<T: ?Sized> Hash for WeakAddr<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}

#[cfg(test)]
mod tests {
	use std::fmt::Debug;

	use super::*;

	#[test]
	fn same_allocation_through_different_coercions_is_one_key() {
		let value = Rc::new(5_u32);
		let a = RcAddr::new(value.clone() as Rc<dyn Debug>);
		let b = RcAddr::new(value as Rc<dyn Debug>);
		assert!(a == b);

		let other = RcAddr::new(Rc::new(5_u32) as Rc<dyn Debug>);
		assert!(a != other);
	}

	#[test]
	fn weak_key_outlives_target() {
		let value = Rc::new(1_u8);
		let key = WeakAddr::new(Rc::downgrade(&value));
		let copy = key.clone();
		assert!(key.is_alive());

		drop(value);
		assert!(!key.is_alive());
		assert!(key == copy);
	}
}
