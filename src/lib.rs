//! Control-block based shared and weak pointers.
//!
//! A resource handed to [`SharedPtr::new`] is owned by a *control block* that
//! also holds two counts: the number of attached [`SharedPtr`]s (strong) and
//! the number of attached [`WeakPtr`]s (weak). Cloning a handle never creates
//! a new block, it attaches to the existing one.
//!
//! - When the strong count drops to zero the resource is dropped, exactly once.
//! - When both counts are zero the control block itself is freed, exactly once.
//! - A `WeakPtr` can only reach the resource by promotion ([`WeakPtr::lock`]),
//!   which yields an empty `SharedPtr` once the resource is gone.
//!
//! ```
//! use refcount_ptr::{SharedPtr, WeakPtr};
//!
//! let s1: SharedPtr<_> = SharedPtr::new(42);
//! let s2 = s1.clone();
//! let w = WeakPtr::from(&s1);
//! assert_eq!((s1.use_count(), s1.weak_count()), (2, 1));
//!
//! drop(s1);
//! drop(s2);
//! assert!(w.expired());
//! assert!(w.lock().is_empty());
//! ```
//!
//! # Reference cycles
//!
//! Counting cannot see cycles. If `A` holds a `SharedPtr` to `B` and `B`
//! holds a `SharedPtr` to `A`, neither strong count ever reaches zero once the
//! outside handles are gone, and both leak. Nothing reports this at runtime.
//!
//! The rule is that at least one edge of any possible ownership cycle is a
//! `WeakPtr`. Back references (child to parent, observer to subject) are the
//! usual candidates. When the outside owner of `A` goes away, `A` is dropped,
//! its `SharedPtr` to `B` goes with it, and `B`'s `WeakPtr` to `A` reports
//! expiry.
//!
//! ```
//! use refcount_ptr::{SharedPtr, WeakPtr};
//! use std::cell::RefCell;
//!
//! struct Parent {
//!     child: RefCell<SharedPtr<Child>>,
//! }
//!
//! struct Child {
//!     parent: RefCell<WeakPtr<Parent>>,
//! }
//!
//! let parent = SharedPtr::new(Parent { child: RefCell::new(SharedPtr::empty()) });
//! let child = SharedPtr::new(Child { parent: RefCell::new(WeakPtr::new()) });
//!
//! parent.child.borrow_mut().clone_from(&child);
//! child.parent.borrow_mut().assign_shared(&parent);
//! assert_eq!(child.use_count(), 2);
//! assert_eq!(parent.use_count(), 1);
//!
//! drop(parent);
//! assert!(child.parent.borrow().expired());
//! assert_eq!(child.use_count(), 1);
//! ```
//!
//! # Counting policies
//!
//! The default [`LocalCount`] policy uses plain counters; its handles are
//! neither `Send` nor `Sync`. [`SyncSharedPtr`] and [`SyncWeakPtr`] use
//! [`AtomicCount`], where teardown is decided by one atomic decrement and
//! promotion is an atomic increment-if-nonzero.
//!
//! # Features
//!
//! - `tracing`: emit control block lifecycle events at `TRACE` level.
//! - `loom`: model-check the atomic policy with `loom`.
//!
//! 基于控制块的共享指针与弱指针。
//!
//! 交给 [`SharedPtr::new`] 的资源由一个*控制块*拥有，控制块还持有两个计数：
//! 附着的 [`SharedPtr`] 数量（强）和附着的 [`WeakPtr`] 数量（弱）。
//! 克隆句柄永远不会创建新的控制块，而是附着到已有的控制块。
//!
//! - 当强计数降为零时，资源被 drop，恰好一次。
//! - 当两个计数都为零时，控制块本身被释放，恰好一次。
//! - `WeakPtr` 只能通过提升（[`WeakPtr::lock`]）访问资源，资源消失后提升得到空的 `SharedPtr`。
//!
//! 引用计数看不到循环。对任何可能的所有权循环，至少要有一条边是 `WeakPtr`。

mod block;
mod count;
mod link;
mod shared;
mod sync;
mod trace;
mod weak;

pub use count::{AtomicCount, LocalCount, RefCount};
pub use shared::SharedPtr;
pub use weak::WeakPtr;

/// A [`SharedPtr`] with atomic counts, shareable across threads.
/// 使用原子计数、可跨线程共享的 [`SharedPtr`]。
pub type SyncSharedPtr<T> = SharedPtr<T, AtomicCount>;

/// A [`WeakPtr`] with atomic counts, shareable across threads.
/// 使用原子计数、可跨线程共享的 [`WeakPtr`]。
pub type SyncWeakPtr<T> = WeakPtr<T, AtomicCount>;

#[cfg(test)]
mod tests;
