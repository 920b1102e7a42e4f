//! Shared, hot-reloadable scanners for concurrent packet threads.
//!
//! A DPI engine keeps matching traffic while its pattern set is edited (rule
//! reloads, dissector registration). This module separates the two sides:
//! mutation serializes on a lock around an always-open working copy, and
//! [`SharedScanner::publish`] finalizes a clone of it and atomically swaps it
//! in for readers. Reads are lock-free snapshot loads; a snapshot stays valid
//! and searchable for as long as the caller holds it, no matter how many
//! publishes happen behind it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;

use crate::matcher::{Added, Scanner, ScannerConfig};
use crate::ScanError;

/// A scanner shared between mutators and scanning threads.
///
/// ```
/// use flowscan::{ScanSession, SharedScanner};
///
/// let shared = SharedScanner::new();
/// shared.add_pattern(b"ssh", 22u16).unwrap();
/// shared.publish();
///
/// // packet thread:
/// let snapshot = shared.snapshot();
/// let mut session = ScanSession::new();
/// let mut hit = None;
/// snapshot
///     .scan(&mut session, b"xsshy", |m| {
///         hit = Some(*m.patterns[0].rep());
///         true
///     })
///     .unwrap();
/// assert_eq!(hit, Some(22));
/// ```
pub struct SharedScanner<R: Clone> {
    /// The published automaton - atomically swappable, lock-free reads.
    active: ArcSwap<Scanner<R>>,
    /// Working copy guarded for serialized mutation; kept open.
    working: Mutex<Scanner<R>>,
}

// SharedScanner is Send + Sync when R is:
// - ArcSwap<T> and Mutex<T> are Send + Sync for Send + Sync T
// - Scanner owns its node arena outright and has no interior mutability

impl<R: Clone> SharedScanner<R> {
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        let mut empty = Scanner::with_config(config);
        empty.finalize();
        Self {
            active: ArcSwap::from_pointee(empty),
            working: Mutex::new(Scanner::with_config(config)),
        }
    }

    /// Register a pattern in the working set. Readers see it after the next
    /// [`publish`](SharedScanner::publish).
    pub fn add_pattern(&self, bytes: &[u8], rep: R) -> Result<Added<R>, ScanError> {
        self.working.lock().add_pattern(bytes, rep)
    }

    /// Remove a pattern from the working set. Readers keep matching it until
    /// the next [`publish`](SharedScanner::publish).
    pub fn remove_pattern(&self, bytes: &[u8]) -> Result<R, ScanError> {
        self.working.lock().remove_pattern(bytes)
    }

    /// Finalize a clone of the working set and swap it in for readers.
    pub fn publish(&self) {
        let working = self.working.lock();
        let mut next = working.clone();
        next.finalize();
        debug!(
            patterns = next.pattern_count(),
            nodes = next.node_count(),
            "published pattern set"
        );
        self.active.store(Arc::new(next));
    }

    /// The most recently published automaton. Lock-free; scan it with a
    /// caller-owned [`ScanSession`](crate::ScanSession).
    pub fn snapshot(&self) -> Arc<Scanner<R>> {
        self.active.load_full()
    }

    /// Number of patterns in the working set (including unpublished edits).
    pub fn pattern_count(&self) -> usize {
        self.working.lock().pattern_count()
    }
}

impl<R: Clone> Default for SharedScanner<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanSession;

    fn reps(scanner: &Scanner<u16>, text: &[u8]) -> Vec<u16> {
        let mut session = ScanSession::new();
        let mut out = Vec::new();
        scanner
            .scan(&mut session, text, |m| {
                out.extend(m.patterns.iter().map(|p| *p.rep()));
                false
            })
            .unwrap();
        out
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedScanner<u16>>();
    }

    #[test]
    fn test_empty_snapshot_is_searchable() {
        let shared: SharedScanner<u16> = SharedScanner::new();
        assert!(reps(&shared.snapshot(), b"anything").is_empty());
    }

    #[test]
    fn test_edits_invisible_until_publish() {
        let shared = SharedScanner::new();
        shared.add_pattern(b"ssh", 22u16).unwrap();

        assert!(reps(&shared.snapshot(), b"ssh").is_empty());
        shared.publish();
        assert_eq!(reps(&shared.snapshot(), b"ssh"), vec![22]);
    }

    #[test]
    fn test_old_snapshot_survives_publish() {
        let shared = SharedScanner::new();
        shared.add_pattern(b"ssh", 22u16).unwrap();
        shared.publish();

        let before = shared.snapshot();
        shared.remove_pattern(b"ssh").unwrap();
        shared.add_pattern(b"dns", 53u16).unwrap();
        shared.publish();

        assert_eq!(reps(&before, b"ssh dns"), vec![22]);
        assert_eq!(reps(&shared.snapshot(), b"ssh dns"), vec![53]);
    }

    #[test]
    fn test_concurrent_scans_on_shared_snapshot() {
        let shared = SharedScanner::new();
        shared.add_pattern(b"tls", 443u16).unwrap();
        shared.publish();

        let snapshot = shared.snapshot();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let snapshot = Arc::clone(&snapshot);
                std::thread::spawn(move || reps(&snapshot, b"xtlsx"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![443]);
        }
    }
}
