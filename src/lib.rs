//! flowscan: streaming multi-pattern byte matching for packet inspection
//!
//! An incrementally built Aho-Corasick automaton over raw payload bytes:
//! register literal patterns, finalize once, then scan byte streams chunk by
//! chunk with a caller-owned [`ScanSession`] cursor. Patterns can be removed
//! again (reference-counted subtree reclamation) before re-finalizing, and
//! [`SharedScanner`] publishes finalized snapshots to concurrent packet
//! threads without locking the read path.
//!
//! ```
//! use flowscan::{ScanSession, Scanner};
//!
//! let mut scanner = Scanner::new();
//! scanner.add_pattern(b"ssh-2.0", 22u16).unwrap();
//! scanner.add_pattern(b"bittorrent", 6881u16).unwrap();
//! scanner.finalize();
//!
//! let mut session = ScanSession::new();
//! let mut hits = Vec::new();
//! scanner
//!     .scan(&mut session, b"...ssh-2.0-openssh...", |m| {
//!         hits.extend(m.patterns.iter().map(|p| *p.rep()));
//!         false
//!     })
//!     .unwrap();
//! assert_eq!(hits, vec![22]);
//! ```

mod matcher;
mod shared;

pub use matcher::{Added, Match, Pattern, ScanOutcome, ScanSession, Scanner, ScannerConfig};
pub use shared::SharedScanner;

use thiserror::Error;

/// Errors returned by pattern registration, removal, and scanning.
///
/// Duplicate registration is not an error: [`Scanner::add_pattern`] reports it
/// as [`Added::Duplicate`] carrying the previously registered representation,
/// and the caller decides whether that is acceptable policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Mutation attempted after `finalize` closed the automaton.
    #[error("automaton is closed; call reopen() before mutating the pattern set")]
    Closed,

    /// Scan attempted before the automaton was finalized.
    #[error("automaton is still open; call finalize() before scanning")]
    Open,

    /// Empty patterns match everywhere and are rejected outright.
    #[error("empty patterns cannot be registered")]
    EmptyPattern,

    /// The pattern exceeds the configured maximum length.
    #[error("pattern of {len} bytes exceeds the configured maximum of {max}")]
    PatternTooLong {
        /// Length of the rejected pattern.
        len: usize,
        /// Configured maximum, see [`ScannerConfig`].
        max: usize,
    },

    /// The removal target is not registered.
    #[error("no such pattern is registered")]
    PatternNotFound,
}
