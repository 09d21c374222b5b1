/// Emit a control block lifecycle event at `TRACE` level.
///
/// Expands to nothing unless the `tracing` feature is enabled.
///
/// 以 `TRACE` 级别发出控制块生命周期事件。
/// 未启用 `tracing` 特性时展开为空。
macro_rules! lifecycle {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        {
            ::tracing::trace!(target: "refcount_ptr", $($arg)+);
        }
    }};
}

pub(crate) use lifecycle;
