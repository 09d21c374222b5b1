use crate::count::{AtomicCount, LocalCount, RefCount};
use crate::link::Link;
use crate::weak::WeakPtr;
use std::boxed::Box;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

/// An owning, reference-counted handle to a shared resource.
///
/// All `SharedPtr`s cloned from one another are views into the *same*
/// resource, held by one control block. The resource is dropped when the last
/// of them goes away, regardless of how many [`WeakPtr`]s remain.
///
/// A `SharedPtr` may be empty (see [`SharedPtr::empty`]). Dereferencing an
/// empty handle panics; use [`SharedPtr::get`] to check first.
///
/// **Counting policy**: `C` selects plain ([`LocalCount`], the default) or
/// atomic ([`AtomicCount`]) counters. See [`SyncSharedPtr`](crate::SyncSharedPtr).
///
/// **Method resolution**: the handle's own methods (`get`, `reset`, `swap`, ...)
/// take precedence over methods of `T` reached through `Deref`. Call those
/// as `(*ptr).method()`.
///
/// ```
/// use refcount_ptr::SharedPtr;
///
/// let a: SharedPtr<_> = SharedPtr::new(5);
/// let b = a.clone();
/// assert_eq!(a.use_count(), 2);
/// assert_eq!(*b, 5);
///
/// drop(a);
/// assert_eq!(b.use_count(), 1);
/// ```
///
/// 指向共享资源的拥有型引用计数句柄。
///
/// 相互克隆的所有 `SharedPtr` 都是*同一个*资源的视图，该资源由一个控制块持有。
/// 当最后一个 `SharedPtr` 消失时资源被 drop，无论还剩多少 [`WeakPtr`]。
///
/// `SharedPtr` 可以为空（见 [`SharedPtr::empty`]）。解引用空句柄会 panic；
/// 可以先用 [`SharedPtr::get`] 检查。
pub struct SharedPtr<T, C: RefCount = LocalCount> {
    pub(crate) link: Link<T, C>,
    _owns: PhantomData<T>,
}

impl<T, C: RefCount> SharedPtr<T, C> {
    #[inline]
    pub(crate) fn from_link(link: Link<T, C>) -> Self {
        SharedPtr {
            link,
            _owns: PhantomData,
        }
    }

    /// Allocate `value` and a new control block owning it (strong = 1, weak = 0).
    /// 分配 `value` 和一个拥有它的新控制块（strong = 1，weak = 0）。
    #[inline]
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Take ownership of an already boxed resource.
    #[inline]
    pub fn from_box(resource: Box<T>) -> Self {
        Self::from_link(Link::allocate(resource))
    }

    /// Take ownership of a raw resource pointer. A null pointer yields an
    /// empty handle.
    ///
    /// # Safety
    /// `resource` must be null or come from [`Box::into_raw`], and nothing else
    /// may own it afterwards. In particular, the same pointer must never be
    /// passed to `from_raw` twice: two unrelated control blocks would each
    /// drop it.
    ///
    /// 接管一个原始资源指针。空指针产生空句柄。
    ///
    /// # Safety
    /// `resource` 必须为空或来自 [`Box::into_raw`]，之后不得有其他所有者。
    /// 特别是，同一个指针绝不能两次传给 `from_raw`：两个无关的控制块会各自 drop 它。
    #[inline]
    pub unsafe fn from_raw(resource: *mut T) -> Self {
        if resource.is_null() {
            Self::empty()
        } else {
            Self::from_box(unsafe { Box::from_raw(resource) })
        }
    }

    /// A handle with no control block.
    #[inline]
    pub const fn empty() -> Self {
        SharedPtr {
            link: Link::empty(),
            _owns: PhantomData,
        }
    }

    /// Promote `weak`: a new strong handle if the resource is still alive,
    /// an empty handle otherwise. Same as [`WeakPtr::lock`].
    ///
    /// 提升 `weak`：资源仍然存活时返回新的强句柄，否则返回空句柄。与 [`WeakPtr::lock`] 相同。
    #[inline]
    pub fn from_weak(weak: &WeakPtr<T, C>) -> Self {
        Self::from_link(weak.link.promote())
    }

    /// Create a [`WeakPtr`] observing the same resource.
    #[inline]
    pub fn downgrade(&self) -> WeakPtr<T, C> {
        WeakPtr::from_link(self.link.attach_weak())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.link.is_empty()
    }

    /// Shared reference to the resource, `None` if empty.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: while this handle holds a strong reference the resource is alive.
        unsafe { self.link.resource().as_ref() }
    }

    /// Exclusive reference to the resource, available only when this is the
    /// single strong handle and no weak handle exists that could promote.
    ///
    /// 对资源的独占引用，仅当这是唯一的强句柄且不存在可以提升的弱句柄时可用。
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let block = self.link.block()?;
        if !block.is_unique() {
            return None;
        }
        // SAFETY: no other reference of either kind exists, and `&mut self`
        // prevents new handles being made from this one.
        unsafe { block.resource().as_mut() }
    }

    /// The raw resource pointer, null if empty. Counts are not affected.
    /// 原始资源指针，为空时返回 null。不影响计数。
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.link.resource() as *const T
    }

    /// Number of strong handles attached to this control block, 0 if empty.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.link.strong_count()
    }

    /// Number of weak handles attached to this control block, 0 if empty.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.link.weak_count()
    }

    /// Whether both handles are attached to the same control block.
    /// Two empty handles compare equal.
    ///
    /// 两个句柄是否附着在同一个控制块上。两个空句柄视为相等。
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.link.same_block(&other.link)
    }

    /// Detach from the control block, leaving this handle empty. Drops the
    /// resource if this was the last strong handle.
    ///
    /// 从控制块分离，使此句柄为空。如果这是最后一个强句柄，则 drop 资源。
    #[inline]
    pub fn reset(&mut self) {
        self.link.detach_strong();
    }

    /// Exchange control blocks with `other`. No count changes, no teardown.
    /// 与 `other` 交换控制块。不改变计数，不触发销毁。
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.link.swap(&mut other.link);
    }

    /// Move the attachment out, leaving this handle empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::empty())
    }

    /// Move the resource out if this is the only strong handle.
    ///
    /// Outstanding weak handles observe expiry afterwards, exactly as if the
    /// resource had been dropped, but its destructor does not run. Returns
    /// `Err(self)` when other strong handles exist or the handle is empty.
    ///
    /// 如果这是唯一的强句柄，则移出资源。
    ///
    /// 之后未释放的弱句柄会观察到过期，就像资源被 drop 了一样，但其析构函数不会运行。
    /// 当存在其他强句柄或句柄为空时返回 `Err(self)`。
    pub fn try_unwrap(mut self) -> Result<T, Self> {
        match self.link.take_resource() {
            Some(resource) => Ok(*resource),
            None => Err(self),
        }
    }
}

impl<T, C: RefCount> Clone for SharedPtr<T, C> {
    /// Attach to the same control block, incrementing the strong count.
    #[inline]
    fn clone(&self) -> Self {
        Self::from_link(self.link.attach_strong())
    }

    /// Copy-assignment. A no-op when both handles already share a control
    /// block; otherwise attaches to `source`'s block, then detaches from the
    /// old one (which may drop the old resource).
    ///
    /// Attaching happens before detaching. The final counts equal those of
    /// detaching first, and any destructor run by the detach already sees
    /// this handle on its new block.
    ///
    /// 拷贝赋值。当两个句柄已共享同一控制块时不做任何操作；
    /// 否则附着到 `source` 的控制块，然后从旧控制块分离（可能会 drop 旧资源）。
    ///
    /// 附着先于分离。最终计数与先分离相同，分离期间运行的任何析构函数都已经看到此句柄位于新控制块上。
    fn clone_from(&mut self, source: &Self) {
        if self.ptr_eq(source) {
            return;
        }
        let mut old = std::mem::replace(&mut self.link, source.link.attach_strong());
        old.detach_strong();
    }
}

impl<T, C: RefCount> Drop for SharedPtr<T, C> {
    #[inline]
    fn drop(&mut self) {
        self.link.detach_strong();
    }
}

impl<T, C: RefCount> Deref for SharedPtr<T, C> {
    type Target = T;

    /// # Panics
    /// Panics if the handle is empty.
    #[inline]
    #[track_caller]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced an empty SharedPtr"),
        }
    }
}

impl<T, C: RefCount> Default for SharedPtr<T, C> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, C: RefCount> From<T> for SharedPtr<T, C> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T, C: RefCount> From<Box<T>> for SharedPtr<T, C> {
    #[inline]
    fn from(resource: Box<T>) -> Self {
        Self::from_box(resource)
    }
}

impl<T: fmt::Debug, C: RefCount> fmt::Debug for SharedPtr<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f
                .debug_struct("SharedPtr")
                .field("value", value)
                .field("use_count", &self.use_count())
                .field("weak_count", &self.weak_count())
                .finish(),
            None => f.write_str("SharedPtr(<empty>)"),
        }
    }
}

impl<T, C: RefCount> fmt::Pointer for SharedPtr<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

// SAFETY: with atomic counts every count transition is a single atomic
// operation and the resource is dropped by exactly one thread.
// Sharing the handle shares `&T`, moving it may drop `T` elsewhere.
unsafe impl<T: Send + Sync> Send for SharedPtr<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Sync for SharedPtr<T, AtomicCount> {}

