pub use enclose::*;

/// Builds a [`Computed`](crate::Computed), optionally cloning captured
/// handles first:
///
/// ```
/// use reactive_hooks::{computed, Signal};
///
/// let count = Signal::new(2);
/// let doubled = computed!((count) cx => *count.get(cx) * 2);
/// assert_eq!(*doubled.get_once(), 4);
///
/// count.set(5);
/// assert_eq!(*doubled.get_once(), 10);
/// ```
#[macro_export]
macro_rules! computed {
    (( $($d_tt:tt)* ) $ctx:ident => $($b:tt)*) => {
        $crate::Computed::new($crate::macros::enclose!(($( $d_tt )*) Box::new(move |$ctx: &$crate::Evaluation| { $($b)* })))
    };
    ($ctx:ident => $($b:tt)*) => {
        $crate::Computed::new(Box::new(move |$ctx: &$crate::Evaluation| { $($b)* }))
    };
}
