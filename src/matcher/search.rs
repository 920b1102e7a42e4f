//! The resumable streaming matcher.
//!
//! Cursor state lives in a caller-owned [`ScanSession`], not in the scanner:
//! once finalized the automaton is read-only, so any number of threads can
//! scan independent flows against one shared [`Scanner`], each with its own
//! session.

use crate::matcher::node::NodeId;
use crate::matcher::pattern::Pattern;
use crate::matcher::scanner::Scanner;
use crate::ScanError;

/// Resumable cursor over one logical byte stream.
///
/// Carries the current trie node and the absolute offset of the next chunk's
/// first byte, so consecutive [`Scanner::scan`] calls on the same session
/// match exactly as one call over the concatenated input would.
///
/// A session is bound to the finalize epoch it was scanned under: after a
/// `reopen`/`finalize` cycle it must be [`reset`](ScanSession::reset).
#[derive(Clone, Debug)]
pub struct ScanSession {
    pub(crate) node: NodeId,
    pub(crate) base: u64,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            node: NodeId::ROOT,
            base: 0,
        }
    }

    /// Rewind to the root at offset zero, ready for a new, unrelated stream.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Absolute offset of the next unscanned byte.
    pub fn position(&self) -> u64 {
        self.base
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One match report passed to the scan callback.
pub struct Match<'a, R> {
    /// Absolute stream offset one past the last byte of the match.
    pub position: u64,
    /// Every pattern ending at this position: the node's own terminal plus
    /// all suffix patterns merged along the failure chain. Never empty.
    pub patterns: &'a [Pattern<R>],
}

/// How a [`Scanner::scan`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The chunk was exhausted; the session now holds the resume state for
    /// the stream's next chunk.
    Continue,
    /// The callback asked to stop. The session is left unchanged; callers
    /// abandoning the stream simply stop issuing `scan` calls.
    Stopped,
}

impl<R: Clone> Scanner<R> {
    /// Scan one chunk of a byte stream, invoking `on_match` for every
    /// position where at least one pattern ends.
    ///
    /// Matching follows the classic automaton walk: a missing transition
    /// retries the same byte after following the failure link (failure does
    /// not consume input), and the root absorbs bytes nothing matches on. A
    /// match is reported only after a genuine byte transition into a final
    /// node; a pure failure fallback reports nothing, since that match was
    /// already reported at the node it fell back from. Overlapping suffix
    /// patterns ending at one position arrive in a single callback, not
    /// deduplicated across patterns.
    ///
    /// The reported pattern slices borrow from the scanner, so a callback may
    /// keep them for as long as the scanner borrow lives.
    ///
    /// Returning `true` from the callback aborts the scan immediately.
    pub fn scan<'s, F>(
        &'s self,
        session: &mut ScanSession,
        chunk: &[u8],
        mut on_match: F,
    ) -> Result<ScanOutcome, ScanError>
    where
        F: FnMut(&Match<'s, R>) -> bool,
    {
        if self.open {
            return Err(ScanError::Open);
        }

        let mut cur = session.node;
        let mut pos = 0usize;

        while pos < chunk.len() {
            let next = self.arena[cur].find_child_sorted(chunk[pos]);
            if next.is_none() {
                if cur == NodeId::ROOT {
                    pos += 1;
                } else {
                    // retry the same byte one suffix shorter
                    cur = self.arena[cur].fail;
                }
            } else {
                cur = next;
                pos += 1;
                let node = &self.arena[cur];
                if node.is_final {
                    let report = Match {
                        position: session.base + pos as u64,
                        patterns: &node.matches,
                    };
                    if on_match(&report) {
                        return Ok(ScanOutcome::Stopped);
                    }
                }
            }
        }

        session.node = cur;
        session.base += chunk.len() as u64;
        Ok(ScanOutcome::Continue)
    }
}
