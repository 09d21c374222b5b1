//! Control block lifetime tests.
//!
//! A counting global allocator with per-thread tallies observes when the
//! resource box and the control block are actually freed. Each test runs on
//! its own thread, so the tallies never mix.
//!
//! 控制块生命周期测试。
//! 使用带线程本地计数的全局分配器观察资源和控制块实际被释放的时机。

use refcount_ptr::{SharedPtr, SyncSharedPtr, WeakPtr};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

struct CountingAllocator;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = LIVE.try_with(|live| live.set(live.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let _ = LIVE.try_with(|live| live.set(live.get() - 1));
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Live allocations made by the current thread.
fn live() -> isize {
    LIVE.with(Cell::get)
}

/// 测试1: 没有弱句柄时，资源和控制块一起释放
#[test]
fn test_block_freed_with_last_strong() {
    let base = live();
    let strong: SharedPtr<u64> = SharedPtr::new(5u64);
    assert_eq!(live(), base + 2);

    let copy = strong.clone();
    assert_eq!(live(), base + 2);

    drop(strong);
    drop(copy);
    assert_eq!(live(), base);
}

/// 测试2: 强计数先归零，控制块等到最后一个弱句柄才释放
#[test]
fn test_block_outlives_resource_while_weak_remains() {
    let base = live();
    let strong: SharedPtr<u64> = SharedPtr::new(5u64);
    let weak = strong.downgrade();
    let weak2 = weak.clone();
    assert_eq!(live(), base + 2);

    drop(strong);
    assert_eq!(live(), base + 1, "resource freed, block kept for weak handles");

    drop(weak);
    assert_eq!(live(), base + 1);
    drop(weak2);
    assert_eq!(live(), base);
}

/// 测试3: 弱计数先归零不会释放控制块
#[test]
fn test_weak_reaching_zero_first_keeps_block() {
    let base = live();
    let strong: SharedPtr<u64> = SharedPtr::new(5u64);
    let weak = strong.downgrade();

    drop(weak);
    assert_eq!(live(), base + 2);
    assert_eq!(*strong, 5);

    drop(strong);
    assert_eq!(live(), base);
}

/// 测试4: 空句柄不分配
#[test]
fn test_empty_handles_do_not_allocate() {
    let base = live();
    let strong: SharedPtr<u64> = SharedPtr::empty();
    let weak: WeakPtr<u64> = WeakPtr::new();
    let promoted = weak.lock();
    assert_eq!(live(), base);
    drop((strong, weak, promoted));
    assert_eq!(live(), base);
}

/// 测试5: try_unwrap 释放资源的 Box，控制块等待弱句柄
#[test]
fn test_try_unwrap_frees_box_and_defers_block() {
    let base = live();
    let strong: SharedPtr<u64> = SharedPtr::new(9u64);
    let weak = strong.downgrade();

    let value = strong.try_unwrap().ok().unwrap();
    assert_eq!(value, 9);
    assert_eq!(live(), base + 1);

    drop(weak);
    assert_eq!(live(), base);
}

/// 测试6: 拷贝赋值释放无人持有的旧控制块
#[test]
fn test_clone_from_frees_old_block() {
    let base = live();
    let mut a: SharedPtr<u64> = SharedPtr::new(1u64);
    let b: SharedPtr<u64> = SharedPtr::new(2u64);
    assert_eq!(live(), base + 4);

    a.clone_from(&b);
    assert_eq!(live(), base + 2);

    drop((a, b));
    assert_eq!(live(), base);
}

/// 测试7: 原子策略遵循同样的释放顺序
#[test]
fn test_sync_block_freed_after_both_counts() {
    let base = live();
    let strong = SyncSharedPtr::new(3u64);
    let weak = strong.downgrade();

    drop(strong);
    assert_eq!(live(), base + 1);
    drop(weak);
    assert_eq!(live(), base);
}
