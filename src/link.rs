use crate::block::ControlBlock;
use crate::count::RefCount;
use crate::trace::lifecycle;
use std::boxed::Box;
use std::ptr::{self, NonNull};

/// A possibly empty attachment to a control block.
///
/// This is the attach/detach capability shared by both handle kinds. A `Link`
/// does not know which count it holds; the handle that owns it decides, and
/// must pair `attach_strong`/`promote` with `detach_strong` and `attach_weak`
/// with `detach_weak`. `Link` has no `Drop`, detaching is the owner's job.
///
/// 一个可能为空的控制块附着。
///
/// 这是两种句柄共享的附着/分离能力。`Link` 不知道自己持有哪种计数；
/// 由拥有它的句柄决定，并且必须将 `attach_strong`/`promote` 与 `detach_strong` 配对，
/// 将 `attach_weak` 与 `detach_weak` 配对。`Link` 没有 `Drop`，分离是所有者的职责。
pub(crate) struct Link<T, C: RefCount> {
    block: Option<NonNull<ControlBlock<T, C>>>,
}

impl<T, C: RefCount> Link<T, C> {
    #[inline]
    pub(crate) const fn empty() -> Self {
        Link { block: None }
    }

    /// Allocate a fresh block around `resource`; the link holds its one strong reference.
    /// 围绕 `resource` 分配一个新控制块；该链接持有其唯一的强引用。
    #[inline]
    pub(crate) fn allocate(resource: Box<T>) -> Self {
        Link {
            block: Some(ControlBlock::allocate(resource)),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// The attached block. Alive for as long as this link stays attached.
    /// 附着的控制块。只要此链接保持附着，它就存活。
    #[inline]
    pub(crate) fn block(&self) -> Option<&ControlBlock<T, C>> {
        // SAFETY: an attached link holds a count on the block, which keeps it allocated.
        self.block.map(|block| unsafe { &*block.as_ptr() })
    }

    #[inline]
    pub(crate) fn block_ptr(&self) -> *const ControlBlock<T, C> {
        self.block
            .map_or(ptr::null(), |block| block.as_ptr() as *const _)
    }

    /// Identity comparison of the attached blocks.
    #[inline]
    pub(crate) fn same_block(&self, other: &Self) -> bool {
        self.block == other.block
    }

    /// Resource pointer, null if empty or torn down.
    #[inline]
    pub(crate) fn resource(&self) -> *mut T {
        self.block()
            .map_or(ptr::null_mut(), |block| block.resource())
    }

    #[inline]
    pub(crate) fn strong_count(&self) -> usize {
        self.block().map_or(0, |block| block.strong_count())
    }

    #[inline]
    pub(crate) fn weak_count(&self) -> usize {
        self.block().map_or(0, |block| block.weak_count())
    }

    /// A new link on the same block holding a new strong reference.
    ///
    /// The caller must hold a strong reference through `self`.
    #[inline]
    pub(crate) fn attach_strong(&self) -> Self {
        if let Some(block) = self.block() {
            block.increment_strong();
        }
        Link { block: self.block }
    }

    /// A new link on the same block holding a new weak reference.
    #[inline]
    pub(crate) fn attach_weak(&self) -> Self {
        if let Some(block) = self.block() {
            block.increment_weak();
        }
        Link { block: self.block }
    }

    /// A new link holding a strong reference, or an empty link if the
    /// resource is already gone. Never resurrects a dropped resource.
    ///
    /// 一个持有强引用的新链接；如果资源已经消失则返回空链接。永远不会复活已被 drop 的资源。
    #[inline]
    pub(crate) fn promote(&self) -> Self {
        match self.block() {
            Some(block) if block.try_increment_strong() => Link { block: self.block },
            Some(_) => {
                lifecycle!(block = ?self.block_ptr(), "promotion refused, resource expired");
                Link::empty()
            }
            None => Link::empty(),
        }
    }

    /// Release the strong reference held by this link and leave it empty.
    /// 释放此链接持有的强引用并将其置空。
    #[inline]
    pub(crate) fn detach_strong(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: the link held a strong reference and is now empty.
            unsafe { ControlBlock::release_strong(block) };
        }
    }

    /// Release the weak reference held by this link and leave it empty.
    /// 释放此链接持有的弱引用并将其置空。
    #[inline]
    pub(crate) fn detach_weak(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: the link held a weak reference and is now empty.
            unsafe { ControlBlock::release_weak(block) };
        }
    }

    /// Move the resource out through the strong reference held by this link.
    /// On success the link is left empty.
    ///
    /// 通过此链接持有的强引用移出资源。成功时链接被置空。
    #[inline]
    pub(crate) fn take_resource(&mut self) -> Option<Box<T>> {
        let block = self.block?;
        // SAFETY: the link holds a strong reference; on success it is cleared below.
        let resource = unsafe { ControlBlock::try_take(block) }?;
        self.block = None;
        Some(resource)
    }

    /// Exchange attachments without touching any count.
    #[inline]
    pub(crate) fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.block, &mut other.block);
    }
}
