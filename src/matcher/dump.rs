//! Diagnostic rendering of the trie. Not a stable serialization format.

use std::fmt::Write;

use crate::matcher::node::NodeId;
use crate::matcher::scanner::Scanner;

impl<R: Clone + std::fmt::Debug> Scanner<R> {
    /// Render the automaton as an indented tree: one line per node with its
    /// id, the edge that reaches it, the edge's reference count, the
    /// failure-link target, and the merged pattern list of final nodes.
    ///
    /// Intended for debugging; the format may change between releases.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "automaton: {} nodes, {} patterns, longest {}, {}",
            self.node_count(),
            self.pattern_count(),
            self.longest_pattern(),
            if self.is_open() { "open" } else { "ready" },
        );

        // explicit DFS stack; depth can reach the longest pattern length
        let mut stack: Vec<(NodeId, Option<(u8, u32)>, usize)> = vec![(NodeId::ROOT, None, 0)];
        while let Some((id, via, indent)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };

            for _ in 0..indent {
                out.push_str("  ");
            }
            match via {
                None => {
                    let _ = write!(out, "NODE({})", id.index());
                }
                Some((byte, refs)) => {
                    let _ = write!(out, "{} -> NODE({}) refs={}", render_byte(byte), id.index(), refs);
                }
            }
            if !node.fail.is_none() {
                let _ = write!(out, " fail=NODE({})", node.fail.index());
            }
            if node.is_final {
                let _ = write!(out, " final {:?}", node.matches);
            }
            out.push('\n');

            // reversed so children print in edge order
            for edge in node.edges.iter().rev() {
                stack.push((edge.child, Some((edge.byte, edge.refs)), indent + 1));
            }
        }
        out
    }
}

fn render_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("0x{byte:02x}")
    }
}
