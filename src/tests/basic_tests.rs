/// 基础测试模块
/// 测试 SharedPtr 的构造、拷贝、重置和访问
use super::DropTally;
use crate::{SharedPtr, WeakPtr};
use std::cell::RefCell;

/// 测试1: 从资源构造，strong=1, weak=0
#[test]
fn test_new_shared_ptr_counts() {
    let ptr: SharedPtr<_> = SharedPtr::new(42i32);

    assert!(!ptr.is_empty());
    assert_eq!(ptr.use_count(), 1);
    assert_eq!(ptr.weak_count(), 0);
    assert_eq!(*ptr, 42);
}

/// 测试2: 拷贝构造附着到同一个控制块
#[test]
fn test_clone_attaches_to_same_block() {
    let a: SharedPtr<_> = SharedPtr::new(String::from("shared"));
    let b = a.clone();
    let c = b.clone();

    assert!(a.ptr_eq(&b));
    assert!(b.ptr_eq(&c));
    assert_eq!(a.as_ptr(), c.as_ptr());
    assert_eq!(a.use_count(), 3);
    assert_eq!(c.use_count(), 3);

    drop(b);
    assert_eq!(a.use_count(), 2);
    assert_eq!(c.use_count(), 2);
}

/// 测试3: 空句柄
#[test]
fn test_empty_shared_ptr() {
    let ptr: SharedPtr<i32> = SharedPtr::empty();

    assert!(ptr.is_empty());
    assert_eq!(ptr.use_count(), 0);
    assert_eq!(ptr.weak_count(), 0);
    assert!(ptr.get().is_none());
    assert!(ptr.as_ptr().is_null());

    let default: SharedPtr<i32> = SharedPtr::default();
    assert!(default.is_empty());
}

/// 测试4: 解引用空句柄会 panic
#[test]
#[should_panic(expected = "dereferenced an empty SharedPtr")]
fn test_deref_empty_panics() {
    let ptr: SharedPtr<i32> = SharedPtr::empty();
    let _value = *ptr;
}

/// 测试5: 重置后句柄为空，只有最后一个强句柄会销毁资源
#[test]
fn test_reset_detaches_and_tears_down_last() {
    let tally = DropTally::new();
    let mut a: SharedPtr<_> = SharedPtr::new(tally.probe(1));
    let mut b = a.clone();

    a.reset();
    assert!(a.is_empty());
    assert_eq!(b.use_count(), 1);
    assert_eq!(tally.count(), 0);

    b.reset();
    assert!(b.is_empty());
    assert_eq!(tally.count(), 1);

    // 对空句柄重置不做任何事
    b.reset();
    assert_eq!(tally.count(), 1);
}

/// 测试6: 通过一个句柄的修改对所有句柄可见
#[test]
fn test_mutation_visible_through_all_handles() {
    let a: SharedPtr<_> = SharedPtr::new(RefCell::new(vec![1, 2, 3]));
    let b = a.clone();

    b.borrow_mut().push(4);
    assert_eq!(*a.borrow(), vec![1, 2, 3, 4]);

    let tally = DropTally::new();
    let p: SharedPtr<_> = SharedPtr::new(tally.probe(10));
    let q = p.clone();
    q.value.set(20);
    assert_eq!(p.value.get(), 20);
}

/// 测试7: 拷贝赋值先附着新控制块，再从旧控制块分离
#[test]
fn test_clone_from_switches_blocks() {
    let tally = DropTally::new();
    let mut a: SharedPtr<_> = SharedPtr::new(tally.probe(1));
    let b: SharedPtr<_> = SharedPtr::new(tally.probe(2));

    a.clone_from(&b);

    // a 原来的资源没有其他所有者，应已销毁
    assert_eq!(tally.count(), 1);
    assert!(a.ptr_eq(&b));
    assert_eq!(a.use_count(), 2);
    assert_eq!(a.value.get(), 2);

    drop(a);
    drop(b);
    assert_eq!(tally.count(), 2);
}

/// 测试8: 拷贝赋值不会销毁仍有其他所有者的旧资源
#[test]
fn test_clone_from_keeps_shared_old_resource() {
    let tally = DropTally::new();
    let mut a: SharedPtr<_> = SharedPtr::new(tally.probe(1));
    let keep = a.clone();
    let b: SharedPtr<_> = SharedPtr::new(tally.probe(2));

    a.clone_from(&b);
    assert_eq!(tally.count(), 0);
    assert_eq!(keep.use_count(), 1);
    assert_eq!(b.use_count(), 2);
}

/// 测试9: 从空句柄拷贝赋值等同于重置
#[test]
fn test_clone_from_empty_resets() {
    let tally = DropTally::new();
    let mut a: SharedPtr<_> = SharedPtr::new(tally.probe(1));
    let empty = SharedPtr::empty();

    a.clone_from(&empty);
    assert!(a.is_empty());
    assert_eq!(tally.count(), 1);
}

/// 测试10: take 转移所有权，源句柄变为空
#[test]
fn test_take_moves_out() {
    let mut a: SharedPtr<_> = SharedPtr::new(7u8);
    let b = a.take();

    assert!(a.is_empty());
    assert_eq!(b.use_count(), 1);
    assert_eq!(*b, 7);
}

/// 测试11: 其他构造方式
#[test]
fn test_alternative_constructors() {
    let from_box: SharedPtr<_> = SharedPtr::from_box(Box::new(1i32));
    assert_eq!(*from_box, 1);

    let from_value: SharedPtr<i32> = SharedPtr::from(2);
    assert_eq!(*from_value, 2);

    let from_boxed: SharedPtr<i32> = Box::new(3).into();
    assert_eq!(*from_boxed, 3);

    let raw = Box::into_raw(Box::new(4i32));
    let from_raw: SharedPtr<_> = unsafe { SharedPtr::from_raw(raw) };
    assert_eq!(*from_raw, 4);
    assert_eq!(from_raw.as_ptr(), raw as *const i32);

    let from_null: SharedPtr<i32> = unsafe { SharedPtr::from_raw(std::ptr::null_mut()) };
    assert!(from_null.is_empty());
}

/// 测试12: get_mut 只在唯一所有者且没有弱句柄时可用
#[test]
fn test_get_mut_requires_unique_ownership() {
    let mut a: SharedPtr<_> = SharedPtr::new(5i32);
    *a.get_mut().unwrap() += 1;
    assert_eq!(*a, 6);

    let b = a.clone();
    assert!(a.get_mut().is_none());
    drop(b);

    let w = a.downgrade();
    assert!(a.get_mut().is_none());
    drop(w);

    assert!(a.get_mut().is_some());

    let mut empty: SharedPtr<i32> = SharedPtr::empty();
    assert!(empty.get_mut().is_none());
}

/// 测试13: try_unwrap 交出资源而不运行析构
#[test]
fn test_try_unwrap() {
    let tally = DropTally::new();
    let a: SharedPtr<_> = SharedPtr::new(tally.probe(9));
    let b = a.clone();

    let a = a.try_unwrap().err().unwrap();
    assert_eq!(a.use_count(), 2);
    drop(b);

    let w = WeakPtr::from(&a);
    let probe = a.try_unwrap().ok().unwrap();
    assert_eq!(tally.count(), 0);
    assert_eq!(probe.value.get(), 9);

    // 资源被取出后弱句柄观察到过期
    assert!(w.expired());
    assert!(w.lock().is_empty());

    drop(probe);
    assert_eq!(tally.count(), 1);

    let empty: SharedPtr<i32> = SharedPtr::empty();
    assert!(empty.try_unwrap().is_err());
}

/// 测试14: Debug 输出
#[test]
fn test_debug_format() {
    let ptr: SharedPtr<_> = SharedPtr::new(5i32);
    let _w = ptr.downgrade();
    let text = format!("{:?}", ptr);
    assert!(text.contains("value: 5"));
    assert!(text.contains("use_count: 1"));
    assert!(text.contains("weak_count: 1"));

    let empty: SharedPtr<i32> = SharedPtr::empty();
    assert_eq!(format!("{:?}", empty), "SharedPtr(<empty>)");
}

/// 测试15: get 不改变计数
#[test]
fn test_get_does_not_change_counts() {
    let ptr: SharedPtr<_> = SharedPtr::new(11i32);
    let raw = ptr.get().unwrap() as *const i32;

    assert_eq!(raw, ptr.as_ptr());
    assert_eq!(format!("{:p}", ptr), format!("{:p}", raw));
    assert_eq!(ptr.use_count(), 1);
}

/// 测试16: 所有强句柄看到同一个资源地址，资源在最后一个强句柄释放时恰好销毁一次
#[test]
fn test_resource_address_shared_until_teardown() {
    let tally = DropTally::new();
    let a: SharedPtr<_> = SharedPtr::new(tally.probe(1));
    let b = a.clone();
    let weak = a.downgrade();
    let promoted = weak.lock();

    assert_eq!(a.as_ptr(), b.as_ptr());
    assert_eq!(a.as_ptr(), promoted.as_ptr());

    drop((a, b));
    assert_eq!(tally.count(), 0);
    promoted.value.set(2);
    assert_eq!(promoted.value.get(), 2);

    drop(promoted);
    assert_eq!(tally.count(), 1);
    assert!(weak.expired());
    assert!(weak.lock().as_ptr().is_null());
}

/// 测试17: get_mut 在弱句柄提升并释放之后仍能看到新的强句柄
#[test]
fn test_get_mut_sees_handle_promoted_from_dropped_weak() {
    let mut a: SharedPtr<_> = SharedPtr::new(5i32);
    let weak = a.downgrade();
    let promoted = weak.lock();
    drop(weak);

    assert_eq!(a.weak_count(), 0);
    assert!(a.get_mut().is_none());

    drop(promoted);
    *a.get_mut().unwrap() = 7;
    assert_eq!(*a, 7);
}
