//! The pattern automaton: trie construction, failure links, streaming search.
//!
//! # Module organization
//!
//! - `node`: arena-backed node/edge storage (`NodeId`, `Edge`, `Node`,
//!   `NodeArena`)
//! - `pattern`: registered patterns and the insert outcome type
//! - `scanner`: `Scanner` construction ops (insert, remove, finalize)
//! - `search`: the resumable streaming matcher (`ScanSession`, `scan`)
//! - `dump`: diagnostic tree rendering
//!
//! Lifecycle: a `Scanner` starts *open*; `add_pattern`/`remove_pattern` are
//! legal only in that phase. `finalize` computes failure links and merged
//! match lists, sorts edges for binary-search lookup, and closes the
//! automaton; `scan` is legal only once closed. `reopen` starts a new
//! construction epoch when the pattern set has to change again.

mod dump;
mod node;
mod pattern;
mod scanner;
mod search;

pub use pattern::{Added, Pattern};
pub use scanner::{Scanner, ScannerConfig};
pub use search::{Match, ScanOutcome, ScanSession};

#[cfg(test)]
mod tests;
