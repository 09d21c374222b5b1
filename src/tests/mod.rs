/// 单元测试模块
/// 测试夹具通过显式传入的计数器统计析构次数，不使用模块级全局状态
mod basic_tests;

use std::cell::Cell;
use std::rc::Rc;

/// Drop tally handed explicitly to each fixture.
/// 显式交给每个夹具的析构计数器。
#[derive(Clone, Default)]
pub(crate) struct DropTally(Rc<Cell<usize>>);

impl DropTally {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count(&self) -> usize {
        self.0.get()
    }

    pub(crate) fn probe(&self, value: i32) -> Probe {
        Probe {
            value: Cell::new(value),
            tally: self.clone(),
        }
    }

    fn record(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// A resource that reports its own teardown.
/// 会报告自身销毁的资源。
pub(crate) struct Probe {
    pub(crate) value: Cell<i32>,
    tally: DropTally,
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.tally.record();
    }
}
