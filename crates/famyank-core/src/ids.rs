//! # Id Generation
//!
//! Timestamp-shaped ids that never collide inside a process.
//!
//! ```text
//!   now_ms = 1700000000000, last = 1699999999999 → 1700000000000
//!   now_ms = 1700000000000, last = 1700000000000 → 1700000000001
//!   now_ms = 1699999999000 (clock stepped back)  → 1700000000002
//! ```
//!
//! The caller passes the clock in, keeping this crate free of I/O.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix for sale ids.
pub const SALE_PREFIX: &str = "SALE-";
/// Prefix for generated product ids.
pub const PRODUCT_PREFIX: &str = "P-";
/// Prefix for generated staff account ids.
pub const USER_PREFIX: &str = "u-";

/// Monotonic sequence: `n = max(now_ms, last + 1)`.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence value, strictly greater than any before.
    pub fn next(&self, now_ms: u64) -> u64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current.saturating_add(1));
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }

    /// `<prefix><n>`.
    pub fn next_id(&self, prefix: &str, now_ms: u64) -> String {
        format!("{}{}", prefix, self.next(now_ms))
    }

    /// Advances the sequence past an id that already exists.
    ///
    /// Ids that do not carry a number after `prefix` are ignored.
    pub fn observe(&self, prefix: &str, id: &str) {
        if let Some(n) = parse_sequence(prefix, id) {
            self.last.fetch_max(n, Ordering::AcqRel);
        }
    }
}

/// Extracts `n` from `<prefix><n>`.
pub fn parse_sequence(prefix: &str, id: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_tick_does_not_collide() {
        let ids = IdGenerator::new();
        let a = ids.next_id(SALE_PREFIX, 1_000);
        let b = ids.next_id(SALE_PREFIX, 1_000);
        assert_eq!(a, "SALE-1000");
        assert_eq!(b, "SALE-1001");
    }

    #[test]
    fn test_clock_going_backwards_stays_monotonic() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next(5_000), 5_000);
        assert_eq!(ids.next(4_000), 5_001);
        assert_eq!(ids.next(9_000), 9_000);
    }

    #[test]
    fn test_observe_existing_ids() {
        let ids = IdGenerator::new();
        ids.observe(SALE_PREFIX, "SALE-7000");
        ids.observe(SALE_PREFIX, "legacy");
        ids.observe(USER_PREFIX, "u1");
        assert_eq!(ids.next(10), 7_001);
        assert_eq!(parse_sequence(PRODUCT_PREFIX, "P-42"), Some(42));
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let ids = std::sync::Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..250).map(|_| ids.next(1)).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1_000);
    }
}
