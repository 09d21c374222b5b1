#[cfg(feature = "loom")]
pub use loom::cell::Cell;
#[cfg(not(feature = "loom"))]
pub use std::cell::Cell;

#[cfg(feature = "loom")]
pub use loom::hint::spin_loop;
#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicUsize, Ordering, fence};
#[cfg(not(feature = "loom"))]
pub use std::hint::spin_loop;
#[cfg(not(feature = "loom"))]
pub use std::sync::atomic::{AtomicUsize, Ordering, fence};
