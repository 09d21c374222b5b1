use crate::count::{LOCKED, RefCount};
use crate::trace::lifecycle;
use std::boxed::Box;
use std::ptr::NonNull;

/// The shared out-of-band record behind every `SharedPtr`/`WeakPtr` pair.
///
/// The block is the sole owner of the resource. Handles never own the
/// resource directly, they only hold a count on the block.
///
/// **Counts**:
/// - `strong`: number of attached `SharedPtr`s.
/// - `weak`: number of attached `WeakPtr`s, plus one implicit reference held
///   collectively by the strong handles while `strong > 0`.
///
/// Releasing the last strong reference drops the resource and *then* releases
/// the implicit weak reference. Whoever brings `weak` to zero frees the block,
/// so the block is freed exactly once, after both counts reach zero, whichever
/// of them gets there last.
///
/// 每个 `SharedPtr`/`WeakPtr` 对背后的共享带外记录。
///
/// 控制块是资源的唯一所有者。句柄从不直接拥有资源，只在控制块上持有一个计数。
///
/// **计数**：
/// - `strong`：附着的 `SharedPtr` 数量。
/// - `weak`：附着的 `WeakPtr` 数量，加上在 `strong > 0` 期间由所有强句柄共同持有的一个隐式引用。
///
/// 释放最后一个强引用时先 drop 资源，*然后* 释放隐式弱引用。
/// 谁将 `weak` 减到零谁就释放控制块，因此控制块恰好被释放一次，
/// 且在两个计数都到达零之后，无论哪个计数最后到达零。
pub(crate) struct ControlBlock<T, C: RefCount> {
    strong: C,
    weak: C,
    /// Valid only while `strong > 0`. Dropped or moved out exactly once, by
    /// whoever takes `strong` to zero; never written.
    /// 仅在 `strong > 0` 时有效。由将 `strong` 减到零的一方恰好 drop 或移出一次；从不写入。
    resource: NonNull<T>,
}

impl<T, C: RefCount> ControlBlock<T, C> {
    /// Allocate a block owning `resource`, with strong = 1 and no weak handles.
    /// 分配一个拥有 `resource` 的控制块，strong = 1 且没有弱句柄。
    pub(crate) fn allocate(resource: Box<T>) -> NonNull<Self> {
        let block = Box::new(ControlBlock {
            strong: C::with_count(1),
            weak: C::with_count(1),
            resource: NonNull::from(Box::leak(resource)),
        });
        let block = NonNull::from(Box::leak(block));
        lifecycle!(block = ?block.as_ptr(), "control block allocated");
        block
    }

    #[inline]
    pub(crate) fn strong_count(&self) -> usize {
        self.strong.load()
    }

    /// Number of attached `WeakPtr`s, excluding the implicit reference.
    /// 附着的 `WeakPtr` 数量，不包括隐式引用。
    #[inline]
    pub(crate) fn weak_count(&self) -> usize {
        let weak = self.weak.load();
        if weak == LOCKED {
            // Only `is_unique` locks, and only when no `WeakPtr` exists.
            return 0;
        }
        if self.strong.load() > 0 {
            weak.saturating_sub(1)
        } else {
            weak
        }
    }

    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.strong.load() > 0
    }

    /// Raw pointer to the resource. Dangling once `strong` has reached zero,
    /// so only a strong holder may dereference it.
    ///
    /// 指向资源的原始指针。`strong` 到达零后悬空，因此只有强引用持有者可以解引用。
    #[inline]
    pub(crate) fn resource(&self) -> *mut T {
        self.resource.as_ptr()
    }

    /// Whether the caller's strong reference is the only reference of any kind.
    ///
    /// The weak count is locked while the strong count is read, so a
    /// `WeakPtr` cannot be promoted or created from another strong handle in
    /// between. Promotions made through weak handles that are already gone
    /// are visible to the strong load.
    ///
    /// 调用者的强引用是否是唯一的任何类型的引用。
    ///
    /// 读取强计数期间弱计数被锁定，因此期间无法提升 `WeakPtr`，也无法从其他强句柄创建 `WeakPtr`。
    /// 通过已经消失的弱句柄完成的提升对强计数的读取可见。
    pub(crate) fn is_unique(&self) -> bool {
        if !self.weak.lock_if_unique() {
            return false;
        }
        let unique = self.strong.load() == 1;
        self.weak.unlock();
        unique
    }

    #[inline]
    pub(crate) fn increment_strong(&self) {
        self.strong.increment();
    }

    /// Promotion: add a strong reference only if the resource is still alive.
    /// 提升：仅当资源仍然存活时才增加强引用。
    #[inline]
    pub(crate) fn try_increment_strong(&self) -> bool {
        self.strong.increment_if_nonzero()
    }

    #[inline]
    pub(crate) fn increment_weak(&self) {
        self.weak.increment_unlocked();
    }

    /// Give up one strong reference.
    ///
    /// On the 1 -> 0 transition the resource is dropped first, then the
    /// implicit weak reference is released (which may free the block).
    ///
    /// # Safety
    /// `this` must point to a live block on which the caller holds a strong
    /// reference. The caller must not use that reference afterwards.
    ///
    /// 放弃一个强引用。
    /// 在 1 -> 0 转换时先 drop 资源，然后释放隐式弱引用（可能会释放控制块）。
    pub(crate) unsafe fn release_strong(this: NonNull<Self>) {
        let block = unsafe { this.as_ref() };
        if block.strong.decrement() != 0 {
            return;
        }

        lifecycle!(block = ?this.as_ptr(), "last strong reference released, dropping resource");
        // The implicit weak reference is still held here, so the block
        // survives anything the resource's destructor does to it.
        // 此时仍持有隐式弱引用，因此无论资源的析构函数对控制块做什么，控制块都会存活。
        unsafe {
            drop(Box::from_raw(block.resource.as_ptr()));
        }

        unsafe { Self::release_weak(this) };
    }

    /// Give up one weak reference, freeing the block when none remain.
    ///
    /// # Safety
    /// `this` must point to a live block on which the caller holds a weak
    /// reference (explicit or the implicit one). The caller must not use that
    /// reference afterwards.
    ///
    /// 放弃一个弱引用，没有剩余引用时释放控制块。
    pub(crate) unsafe fn release_weak(this: NonNull<Self>) {
        if unsafe { this.as_ref() }.weak.decrement() != 0 {
            return;
        }

        lifecycle!(block = ?this.as_ptr(), "control block freed");
        unsafe {
            drop(Box::from_raw(this.as_ptr()));
        }
    }

    /// Move the resource out if the caller holds the only strong reference.
    ///
    /// On success the strong count is zero, the implicit weak reference has
    /// been released and the caller no longer holds a reference on the block.
    /// The resource is handed out instead of being dropped.
    ///
    /// # Safety
    /// `this` must point to a live block on which the caller holds a strong
    /// reference. On `Some`, the caller must treat that reference as gone.
    ///
    /// 如果调用者持有唯一的强引用，则移出资源。
    /// 成功时强计数为零，隐式弱引用已被释放，调用者不再持有控制块上的引用。
    /// 资源被交出而不是被 drop。
    pub(crate) unsafe fn try_take(this: NonNull<Self>) -> Option<Box<T>> {
        let block = unsafe { this.as_ref() };
        if !block.strong.release_if_unique() {
            return None;
        }

        // SAFETY: strong is zero and this caller took it there, so nobody else
        // reaches the resource again.
        let resource = unsafe { Box::from_raw(block.resource.as_ptr()) };
        lifecycle!(block = ?this.as_ptr(), "resource moved out of control block");
        unsafe { Self::release_weak(this) };

        Some(resource)
    }
}

impl<T, C: RefCount> Drop for ControlBlock<T, C> {
    fn drop(&mut self) {
        debug_assert!(
            self.strong.load() == 0,
            "BUG: control block freed while still owning its resource"
        );
    }
}
