use crate::sync::{AtomicUsize, Cell, Ordering, fence, spin_loop};
use std::fmt;

/// Counts above this value abort the process, same limit as `std::rc::Rc`.
/// 超过此值的计数会中止进程，与 `std::rc::Rc` 的限制相同。
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Value a counter holds while [`RefCount::lock_if_unique`] has it locked.
/// 计数器被 [`RefCount::lock_if_unique`] 锁定期间保存的值。
pub(crate) const LOCKED: usize = usize::MAX;

mod private {
    pub trait Sealed {}
}

/// Counting policy for the strong and weak counts of a control block.
///
/// Two policies exist:
/// - [`LocalCount`]: plain `Cell<usize>` counters. This is the default and the
///   handles using it are `!Send` and `!Sync`.
/// - [`AtomicCount`]: `AtomicUsize` counters. Teardown is decided by a single
///   atomic decrement and promotion is an atomic increment-if-nonzero, so the
///   handles may be shared across threads.
///
/// The trait is sealed; the methods are only meaningful to the control block.
///
/// 控制块强/弱计数的计数策略。
///
/// 存在两种策略：
/// - [`LocalCount`]：普通的 `Cell<usize>` 计数器。这是默认策略，使用它的句柄是 `!Send` 和 `!Sync` 的。
/// - [`AtomicCount`]：`AtomicUsize` 计数器。销毁由单次原子递减决定，
///   提升是原子的"非零则递增"，因此句柄可以跨线程共享。
///
/// 该 trait 是密封的；其方法只对控制块有意义。
pub trait RefCount: private::Sealed {
    /// Create a counter holding `count`.
    fn with_count(count: usize) -> Self;

    /// Current value.
    fn load(&self) -> usize;

    /// Add one. Aborts on overflow.
    fn increment(&self);

    /// Subtract one and return the remaining count.
    ///
    /// Reaching zero synchronizes with every earlier decrement, so the caller
    /// that observes zero may tear down what the count protected.
    ///
    /// 减一并返回剩余计数。
    /// 到达零时与之前所有的递减同步，因此观察到零的调用者可以销毁计数所保护的内容。
    fn decrement(&self) -> usize;

    /// Add one unless the count is zero. Returns whether the increment happened.
    /// 计数非零时加一。返回是否发生了递增。
    fn increment_if_nonzero(&self) -> bool;

    /// Move the count from exactly one to zero. Returns whether it did.
    /// 将计数从恰好为一变为零。返回是否成功。
    fn release_if_unique(&self) -> bool;

    /// Lock a count of exactly one so no new reference can be added until
    /// [`unlock`](RefCount::unlock). Returns whether the lock was taken.
    ///
    /// 锁定恰好为一的计数，在 [`unlock`](RefCount::unlock) 之前不能增加新引用。返回是否加锁成功。
    fn lock_if_unique(&self) -> bool;

    /// Release a lock taken by `lock_if_unique`, restoring the count to one.
    fn unlock(&self);

    /// Like [`increment`](RefCount::increment), but waits while the count is locked.
    /// 与 [`increment`](RefCount::increment) 相同，但在计数被锁定时等待。
    fn increment_unlocked(&self);
}

#[cold]
#[inline(never)]
fn refcount_overflow() -> ! {
    std::process::abort()
}

/// Non-atomic counter, the default policy.
/// 非原子计数器，默认策略。
pub struct LocalCount(Cell<usize>);

impl private::Sealed for LocalCount {}

impl RefCount for LocalCount {
    #[inline]
    fn with_count(count: usize) -> Self {
        LocalCount(Cell::new(count))
    }

    #[inline]
    fn load(&self) -> usize {
        self.0.get()
    }

    #[inline]
    fn increment(&self) {
        let count = self.0.get();
        if count >= MAX_REFCOUNT {
            refcount_overflow();
        }
        self.0.set(count + 1);
    }

    #[inline]
    fn decrement(&self) -> usize {
        let count = self.0.get();
        debug_assert!(count > 0, "BUG: decrementing a reference count that is already zero");
        let remaining = count - 1;
        self.0.set(remaining);
        remaining
    }

    #[inline]
    fn increment_if_nonzero(&self) -> bool {
        if self.0.get() == 0 {
            return false;
        }
        self.increment();
        true
    }

    #[inline]
    fn release_if_unique(&self) -> bool {
        if self.0.get() == 1 {
            self.0.set(0);
            true
        } else {
            false
        }
    }

    // Single-threaded: nothing can increment between the check and the unlock.
    #[inline]
    fn lock_if_unique(&self) -> bool {
        self.0.get() == 1
    }

    #[inline]
    fn unlock(&self) {}

    #[inline]
    fn increment_unlocked(&self) {
        self.increment();
    }
}

impl fmt::Debug for LocalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalCount").field(&self.load()).finish()
    }
}

/// Atomic counter for handles shared between threads.
/// 用于跨线程共享句柄的原子计数器。
pub struct AtomicCount(AtomicUsize);

impl private::Sealed for AtomicCount {}

impl RefCount for AtomicCount {
    #[inline]
    fn with_count(count: usize) -> Self {
        AtomicCount(AtomicUsize::new(count))
    }

    #[inline]
    fn load(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn increment(&self) {
        // A new reference can only be made from an existing one, which
        // already keeps the counted object alive, so no ordering is needed.
        // 新引用只能从已有引用创建，已有引用已经保证了对象存活，因此不需要排序。
        let old = self.0.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFCOUNT {
            refcount_overflow();
        }
    }

    #[inline]
    fn decrement(&self) -> usize {
        let old = self.0.fetch_sub(1, Ordering::Release);
        debug_assert!(old > 0, "BUG: decrementing a reference count that is already zero");
        if old == 1 {
            // Pairs with the Release of every other decrement, making all
            // uses through other handles happen-before the teardown.
            // 与其他所有递减的 Release 配对，使通过其他句柄的所有使用 happen-before 销毁。
            fence(Ordering::Acquire);
        }
        old - 1
    }

    #[inline]
    fn increment_if_nonzero(&self) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return false;
            }
            if current > MAX_REFCOUNT {
                refcount_overflow();
            }
            match self.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    #[inline]
    fn release_if_unique(&self) -> bool {
        self.0
            .compare_exchange(1, 0, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn lock_if_unique(&self) -> bool {
        // Acquire pairs with the Release decrement of the last other
        // reference, so whatever was done through it is visible.
        // Acquire 与最后一个其他引用的 Release 递减配对，使通过它完成的操作可见。
        self.0
            .compare_exchange(1, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn unlock(&self) {
        self.0.store(1, Ordering::Release);
    }

    #[inline]
    fn increment_unlocked(&self) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            if current == LOCKED {
                spin_loop();
                current = self.0.load(Ordering::Relaxed);
                continue;
            }
            if current > MAX_REFCOUNT {
                refcount_overflow();
            }
            match self.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for AtomicCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCount").field(&self.load()).finish()
    }
}
