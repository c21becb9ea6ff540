//! Scoped interrupt masking

/// Grants an uninterruptible window for timing-critical code
///
/// The window is the closure passed to [`InterruptLock::with_interrupts_masked`];
/// interrupts are restored when the closure returns, on every return path.
pub trait InterruptLock {
    /// Run `f` with interrupts masked and restore the previous state afterwards.
    fn with_interrupts_masked<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

/// Masks interrupts through the global `critical-section` implementation
///
/// On single-core Cortex-M this is `cpsid i` / restore of PRIMASK.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalCriticalSection;

impl InterruptLock for GlobalCriticalSection {
    fn with_interrupts_masked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        critical_section::with(|_cs| f())
    }
}
