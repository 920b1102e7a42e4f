//! Construction side of the automaton: insertion, removal, finalize.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::matcher::node::{Edge, Node, NodeArena, NodeId};
use crate::matcher::pattern::{Added, Pattern};
use crate::ScanError;

/// Construction limits for a [`Scanner`].
#[derive(Clone, Copy, Debug)]
pub struct ScannerConfig {
    /// Longest pattern accepted by `add_pattern`, in bytes.
    pub max_pattern_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_pattern_len: 1024,
        }
    }
}

/// A multi-pattern matching automaton.
///
/// The scanner starts *open*: [`add_pattern`](Scanner::add_pattern) and
/// [`remove_pattern`](Scanner::remove_pattern) build and edit the trie.
/// [`finalize`](Scanner::finalize) computes failure links and merged match
/// lists and closes the automaton; only then is
/// [`scan`](Scanner::scan) legal. [`reopen`](Scanner::reopen) starts a new
/// construction epoch when the pattern set has to change again.
///
/// `R` is the caller's opaque representation value (typically a protocol
/// identifier), returned on every match and on duplicate registration.
#[derive(Clone)]
pub struct Scanner<R> {
    pub(crate) arena: NodeArena<R>,
    pub(crate) open: bool,
    config: ScannerConfig,
    /// Length of the longest live pattern; recomputed from node depths at
    /// finalize so removals shrink it.
    longest: usize,
    pattern_count: usize,
}

impl<R: Clone> Scanner<R> {
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            open: true,
            config,
            longest: 0,
            pattern_count: 0,
        }
    }

    /// Register a literal pattern with its representation value.
    ///
    /// Walks the trie one byte at a time, reusing existing edges (and
    /// incrementing their reference counts) or allocating fresh nodes. If an
    /// identical byte sequence is already registered, nothing is mutated and
    /// the previously registered representation comes back as
    /// [`Added::Duplicate`]. O(pattern length).
    pub fn add_pattern(&mut self, bytes: &[u8], rep: R) -> Result<Added<R>, ScanError> {
        if !self.open {
            return Err(ScanError::Closed);
        }
        if bytes.is_empty() {
            return Err(ScanError::EmptyPattern);
        }
        if bytes.len() > self.config.max_pattern_len {
            return Err(ScanError::PatternTooLong {
                len: bytes.len(),
                max: self.config.max_pattern_len,
            });
        }

        // Probe before mutating: a duplicate must not leave incremented edge
        // reference counts behind.
        if let Some(existing) = self.probe_terminal(bytes) {
            return Ok(Added::Duplicate(existing));
        }

        let mut node = NodeId::ROOT;
        for &byte in bytes {
            node = match self.arena[node].find_edge(byte) {
                Some(i) => {
                    let edge = &mut self.arena[node].edges[i];
                    edge.refs += 1;
                    edge.child
                }
                None => {
                    let depth = self.arena[node].depth + 1;
                    let child = self.arena.register(Node::new(depth));
                    self.arena[node].edges.push(Edge {
                        byte,
                        child,
                        refs: 1,
                    });
                    child
                }
            };
        }

        let terminal = &mut self.arena[node];
        terminal.is_final = true;
        terminal.terminal = Some(Pattern::new(bytes, rep));
        self.pattern_count += 1;
        if bytes.len() > self.longest {
            self.longest = bytes.len();
        }
        trace!(
            len = bytes.len(),
            nodes = self.arena.node_count(),
            "pattern registered"
        );
        Ok(Added::New)
    }

    /// Walk the exact byte path and return the representation of the pattern
    /// terminating there, if one does.
    fn probe_terminal(&self, bytes: &[u8]) -> Option<R> {
        let mut node = NodeId::ROOT;
        for &byte in bytes {
            let i = self.arena[node].find_edge(byte)?;
            node = self.arena[node].edges[i].child;
        }
        self.arena[node].terminal.as_ref().map(|p| p.rep().clone())
    }

    /// Remove a previously registered pattern, returning its representation.
    ///
    /// Re-walks the pattern's byte path, then walks it back leaf-to-root
    /// decrementing each edge's reference count. An edge whose count reaches
    /// zero is unlinked and its child subtree released; a prefix shared with
    /// a surviving pattern keeps a positive count and is left untouched.
    ///
    /// Failure links and merged match lists are not recomputed: callers must
    /// run [`finalize`](Scanner::finalize) again before scanning.
    pub fn remove_pattern(&mut self, bytes: &[u8]) -> Result<R, ScanError> {
        if !self.open {
            return Err(ScanError::Closed);
        }
        if bytes.is_empty() {
            return Err(ScanError::EmptyPattern);
        }
        if bytes.len() > self.config.max_pattern_len {
            return Err(ScanError::PatternTooLong {
                len: bytes.len(),
                max: self.config.max_pattern_len,
            });
        }

        // Record the traversed (node, edge index) pairs for the backward walk.
        let mut path: Vec<(NodeId, usize)> = Vec::with_capacity(bytes.len());
        let mut node = NodeId::ROOT;
        for &byte in bytes {
            let i = self.arena[node]
                .find_edge(byte)
                .ok_or(ScanError::PatternNotFound)?;
            path.push((node, i));
            node = self.arena[node].edges[i].child;
        }

        let rep = {
            let terminal = &mut self.arena[node];
            let pattern = terminal.terminal.take().ok_or(ScanError::PatternNotFound)?;
            terminal.is_final = false;
            pattern.into_rep()
        };

        // Leaf to root: drop one reference per edge; unlink and reclaim the
        // child subtree once an edge goes unreferenced.
        for &(parent, i) in path.iter().rev() {
            let edge = &mut self.arena[parent].edges[i];
            edge.refs -= 1;
            if edge.refs == 0 {
                let child = edge.child;
                self.arena[parent].edges.swap_remove(i);
                self.release_subtree(child);
            }
        }

        self.pattern_count -= 1;
        trace!(
            len = bytes.len(),
            nodes = self.arena.node_count(),
            "pattern removed"
        );
        Ok(rep)
    }

    /// Release a subtree whose owning edge went unreferenced, then clear
    /// failure links of surviving nodes that pointed into it so pre-finalize
    /// diagnostics never chase a tombstoned slot.
    fn release_subtree(&mut self, start: NodeId) {
        let mut released = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.arena.release(id) {
                released.insert(id);
                for edge in &node.edges {
                    stack.push(edge.child);
                }
            }
        }

        for (_, node) in self.arena.iter_live_mut() {
            if !node.fail.is_none() && released.contains(&node.fail) {
                node.fail = NodeId::NONE;
            }
        }
    }

    /// Compute failure links and merged match lists, sort edges, and close
    /// the automaton against further edits.
    ///
    /// Runs in two passes over the node table. The second pass is a
    /// breadth-first traversal with an explicit worklist: nodes come off the
    /// queue in increasing depth order, so a node's failure target (always
    /// strictly shallower) is complete before the node itself is processed,
    /// and each merged list is just the own terminal plus the failure node's
    /// finished list.
    ///
    /// Calling finalize again after a `reopen` + mutation recomputes all
    /// derived state correctly.
    pub fn finalize(&mut self) {
        for (_, node) in self.arena.iter_live_mut() {
            node.fail = NodeId::NONE;
            node.matches.clear();
            node.is_final = node.terminal.is_some();
            node.edges.sort_unstable_by_key(|e| e.byte);
        }

        let mut max_depth = 0usize;
        let mut scratch: Vec<(u8, NodeId)> = Vec::new();
        let mut queue = VecDeque::with_capacity(64);
        queue.push_back(NodeId::ROOT);

        while let Some(id) = queue.pop_front() {
            let fail = self.arena[id].fail;
            let inherited = if fail.is_none() {
                None
            } else {
                let f = &self.arena[fail];
                Some((f.matches.clone(), f.is_final))
            };
            {
                let node = &mut self.arena[id];
                if let Some(ref own) = node.terminal {
                    node.matches.push(own.clone());
                }
                if let Some((patterns, is_final)) = inherited {
                    node.matches.extend(patterns);
                    node.is_final |= is_final;
                }
                max_depth = max_depth.max(node.depth as usize);
            }

            // Derive each child's failure link from this node's: retry the
            // transition byte down the failure chain, the root absorbing.
            scratch.clear();
            scratch.extend(self.arena[id].edges.iter().map(|e| (e.byte, e.child)));
            for &(byte, child) in &scratch {
                let link = if id == NodeId::ROOT {
                    NodeId::ROOT
                } else {
                    self.fail_target(self.arena[id].fail, byte)
                };
                self.arena[child].fail = link;
                queue.push_back(child);
            }
        }

        self.longest = max_depth;
        self.open = false;
        debug!(
            nodes = self.arena.node_count(),
            patterns = self.pattern_count,
            longest = self.longest,
            "automaton finalized"
        );
    }

    /// Walk the failure chain from `from`, looking for a transition on
    /// `byte`. Falls back to the root when the chain is exhausted.
    fn fail_target(&self, mut from: NodeId, byte: u8) -> NodeId {
        loop {
            let candidate = self.arena[from].find_child_sorted(byte);
            if !candidate.is_none() {
                return candidate;
            }
            if from == NodeId::ROOT {
                return NodeId::ROOT;
            }
            from = self.arena[from].fail;
        }
    }

    /// Start a new construction epoch: the automaton accepts mutations again
    /// and rejects scans until the next [`finalize`](Scanner::finalize).
    /// Derived state (failure links, merged lists) is stale until then.
    /// Outstanding [`ScanSession`](crate::ScanSession)s must be reset after
    /// the re-finalize.
    pub fn reopen(&mut self) {
        self.open = true;
    }

    /// Drop every pattern and node, returning to a fresh open automaton.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.open = true;
        self.longest = 0;
        self.pattern_count = 0;
    }

    /// Iterate all currently registered patterns in node-id order.
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern<R>> {
        self.arena.iter_live().filter_map(|(_, n)| n.terminal.as_ref())
    }

    /// Number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_count == 0
    }

    /// Number of live trie nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// True while the automaton accepts mutations (and rejects scans).
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The configured maximum pattern length.
    pub fn max_pattern_len(&self) -> usize {
        self.config.max_pattern_len
    }

    /// Length of the longest registered pattern.
    pub fn longest_pattern(&self) -> usize {
        self.longest
    }
}

impl<R: Clone> Default for Scanner<R> {
    fn default() -> Self {
        Self::new()
    }
}
