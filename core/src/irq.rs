//! External line interrupt registry
//!
//! Handlers are bound to line ids at registration time. Dispatch takes the
//! pending-line bitmask as read from the interrupt controller and calls the
//! handler of each pending line that has one.
//!
//! For boards whose sensors signal through EXTI lines; the Feather build
//! polls its single-wire sensor and wakes on the RTC alarm, so it has none.

use heapless::FnvIndexMap;

use crate::error::RegistryError;

/// External interrupt line number
pub type LineId = u8;

/// Handler called with the line that fired
pub type LineHandler = fn(LineId);

/// Most lines a registry can hold (one per bit of the pending mask)
pub const MAX_LINES: usize = 16;

/// Line id to handler map for a device with `LINES` interrupt lines
pub struct LineIrqRegistry<const LINES: u8> {
    handlers: FnvIndexMap<LineId, LineHandler, MAX_LINES>,
}

impl<const LINES: u8> Default for LineIrqRegistry<LINES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LINES: u8> LineIrqRegistry<LINES> {
    pub const fn new() -> Self {
        Self {
            handlers: FnvIndexMap::new(),
        }
    }

    /// Bind `handler` to `line`.
    pub fn register(&mut self, line: LineId, handler: LineHandler) -> Result<(), RegistryError> {
        if line >= LINES || usize::from(line) >= MAX_LINES {
            warn!("Rejected handler for line {} ({} lines)", line, LINES);
            return Err(RegistryError::LineOutOfRange { line, lines: LINES });
        }
        if self.handlers.contains_key(&line) {
            warn!("Line {} already has a handler", line);
            return Err(RegistryError::AlreadyRegistered(line));
        }
        self.handlers
            .insert(line, handler)
            .map_err(|_| RegistryError::Full)?;
        Ok(())
    }

    /// Remove the handler for `line`; returns whether one was bound.
    pub fn unregister(&mut self, line: LineId) -> bool {
        self.handlers.remove(&line).is_some()
    }

    pub fn is_registered(&self, line: LineId) -> bool {
        self.handlers.contains_key(&line)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler of every pending line, lowest line first.
    ///
    /// Pending lines without a handler are skipped. Returns the number of
    /// handlers run.
    pub fn dispatch(&self, pending: u16) -> usize {
        let mut handled = 0;
        for line in 0..LINES.min(MAX_LINES as u8) {
            if pending & (1 << line) == 0 {
                continue;
            }
            match self.handlers.get(&line) {
                Some(handler) => {
                    handler(line);
                    handled += 1;
                }
                None => trace!("No handler for pending line {}", line),
            }
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    // Each test owns its own counters; tests run in parallel.
    static DISPATCH_SEEN: AtomicU32 = AtomicU32::new(0);
    static UNREGISTER_SEEN: AtomicU32 = AtomicU32::new(0);

    fn record_dispatch(line: LineId) {
        DISPATCH_SEEN.fetch_or(1 << line, Ordering::SeqCst);
    }

    fn record_unregister(line: LineId) {
        UNREGISTER_SEEN.fetch_or(1 << line, Ordering::SeqCst);
    }

    fn ignore(_line: LineId) {}

    #[test]
    fn test_dispatch_pending_lines_only() {
        let mut registry = LineIrqRegistry::<16>::new();
        registry.register(0, record_dispatch).unwrap();
        registry.register(5, record_dispatch).unwrap();
        registry.register(15, record_dispatch).unwrap();

        // Line 3 is pending but unbound, line 15 is bound but not pending
        let handled = registry.dispatch((1 << 0) | (1 << 3) | (1 << 5));
        assert_eq!(handled, 2);
        assert_eq!(DISPATCH_SEEN.load(Ordering::SeqCst), (1 << 0) | (1 << 5));
    }

    #[test]
    fn test_out_of_range_line_rejected() {
        let mut registry = LineIrqRegistry::<8>::new();
        assert_eq!(
            registry.register(8, ignore),
            Err(RegistryError::LineOutOfRange { line: 8, lines: 8 })
        );
        assert_eq!(
            LineIrqRegistry::<32>::new().register(16, ignore),
            Err(RegistryError::LineOutOfRange { line: 16, lines: 32 })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = LineIrqRegistry::<16>::new();
        registry.register(4, ignore).unwrap();
        assert_eq!(
            registry.register(4, ignore),
            Err(RegistryError::AlreadyRegistered(4))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry = LineIrqRegistry::<16>::new();
        registry.register(2, record_unregister).unwrap();
        assert!(registry.is_registered(2));
        assert!(registry.unregister(2));
        assert!(!registry.unregister(2));
        assert!(!registry.is_registered(2));

        assert_eq!(registry.dispatch(0xFFFF), 0);
        assert_eq!(UNREGISTER_SEEN.load(Ordering::SeqCst), 0);

        // The line can be bound again once free
        registry.register(2, record_unregister).unwrap();
        assert_eq!(registry.dispatch(1 << 2), 1);
        assert_eq!(UNREGISTER_SEEN.load(Ordering::SeqCst), 1 << 2);
    }

    #[test]
    fn test_all_lines_fit() {
        let mut registry = LineIrqRegistry::<16>::new();
        for line in 0..16 {
            registry.register(line, ignore).unwrap();
        }
        assert_eq!(registry.len(), MAX_LINES);
        assert_eq!(registry.dispatch(0xFFFF), 16);
    }
}
