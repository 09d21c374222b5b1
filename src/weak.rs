use crate::count::{AtomicCount, LocalCount, RefCount};
use crate::link::Link;
use crate::shared::SharedPtr;
use std::fmt;

/// A non-owning handle observing a resource held by [`SharedPtr`]s.
///
/// A `WeakPtr` keeps the control block allocated but never the resource.
/// It has no `Deref`: the only way to reach the resource is to promote the
/// handle with [`WeakPtr::lock`] (or [`WeakPtr::upgrade`]), which fails
/// cleanly once the last strong handle is gone.
///
/// Expiry is an expected outcome, not an error: `lock` returns an empty
/// `SharedPtr` and `upgrade` returns `None`.
///
/// ```
/// use refcount_ptr::{SharedPtr, WeakPtr};
///
/// let strong: SharedPtr<_> = SharedPtr::new(String::from("resource"));
/// let weak = WeakPtr::from(&strong);
/// assert!(!weak.expired());
/// assert_eq!(weak.lock().as_str(), "resource");
///
/// drop(strong);
/// assert!(weak.expired());
/// assert!(weak.lock().is_empty());
/// ```
///
/// 观察由 [`SharedPtr`] 持有的资源的非拥有型句柄。
///
/// `WeakPtr` 保持控制块的分配，但从不保持资源。
/// 它没有 `Deref`：访问资源的唯一途径是通过 [`WeakPtr::lock`]（或 [`WeakPtr::upgrade`]）
/// 提升句柄，一旦最后一个强句柄消失，提升会干净地失败。
///
/// 过期是预期的结果而不是错误：`lock` 返回空的 `SharedPtr`，`upgrade` 返回 `None`。
pub struct WeakPtr<T, C: RefCount = LocalCount> {
    pub(crate) link: Link<T, C>,
}

impl<T, C: RefCount> WeakPtr<T, C> {
    #[inline]
    pub(crate) fn from_link(link: Link<T, C>) -> Self {
        WeakPtr { link }
    }

    /// An empty handle, already expired.
    #[inline]
    pub const fn new() -> Self {
        WeakPtr { link: Link::empty() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.link.is_empty()
    }

    /// `true` if the handle is empty or the resource has been dropped.
    ///
    /// Always agrees with [`WeakPtr::lock`] called at the same point.
    ///
    /// 如果句柄为空或资源已被 drop，则返回 `true`。
    /// 总是与在同一时刻调用的 [`WeakPtr::lock`] 结果一致。
    #[inline]
    pub fn expired(&self) -> bool {
        self.link.block().is_none_or(|block| !block.is_alive())
    }

    /// Promote to a strong handle. Empty if the resource is gone.
    ///
    /// This never resurrects a dropped resource: the strong count is only
    /// incremented if it is still non-zero.
    ///
    /// 提升为强句柄。资源消失时返回空句柄。
    /// 这永远不会复活已被 drop 的资源：仅当强计数仍非零时才递增。
    #[inline]
    pub fn lock(&self) -> SharedPtr<T, C> {
        SharedPtr::from_weak(self)
    }

    /// Promote to a strong handle, `None` if the resource is gone.
    #[inline]
    pub fn upgrade(&self) -> Option<SharedPtr<T, C>> {
        let strong = self.lock();
        if strong.is_empty() { None } else { Some(strong) }
    }

    /// Strong count of the observed control block, 0 if empty or expired.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.link.strong_count()
    }

    /// Weak count of the observed control block, including this handle.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.link.weak_count()
    }

    /// Whether both handles observe the same control block.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.link.same_block(&other.link)
    }

    /// Observe whatever `strong` holds, detaching from the current block
    /// first. A no-op when already observing that block.
    ///
    /// 观察 `strong` 所持有的内容，先从当前控制块分离。已经在观察该控制块时不做任何操作。
    pub fn assign_shared(&mut self, strong: &SharedPtr<T, C>) {
        if self.link.same_block(&strong.link) {
            return;
        }
        let mut old = std::mem::replace(&mut self.link, strong.link.attach_weak());
        old.detach_weak();
    }

    /// Detach from the control block, leaving this handle empty. Frees the
    /// block if this was the last handle of any kind.
    ///
    /// 从控制块分离，使此句柄为空。如果这是任何类型的最后一个句柄，则释放控制块。
    #[inline]
    pub fn reset(&mut self) {
        self.link.detach_weak();
    }
}

impl<T, C: RefCount> Clone for WeakPtr<T, C> {
    #[inline]
    fn clone(&self) -> Self {
        Self::from_link(self.link.attach_weak())
    }

    /// Copy-assignment; a no-op when both already observe the same block.
    fn clone_from(&mut self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        let mut old = std::mem::replace(&mut self.link, source.link.attach_weak());
        old.detach_weak();
    }
}

impl<T, C: RefCount> Drop for WeakPtr<T, C> {
    #[inline]
    fn drop(&mut self) {
        self.link.detach_weak();
    }
}

impl<T, C: RefCount> Default for WeakPtr<T, C> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: RefCount> From<&SharedPtr<T, C>> for WeakPtr<T, C> {
    #[inline]
    fn from(strong: &SharedPtr<T, C>) -> Self {
        strong.downgrade()
    }
}

impl<T, C: RefCount> fmt::Debug for WeakPtr<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("block", &self.link.block_ptr())
            .field("expired", &self.expired())
            .finish()
    }
}

// SAFETY: see the matching impls on `SharedPtr`; a weak handle can be
// promoted to a strong one on any thread.
unsafe impl<T: Send + Sync> Send for WeakPtr<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Sync for WeakPtr<T, AtomicCount> {}
