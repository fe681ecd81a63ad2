//! Proof trees.
//!
//! A [`Timestamp`] is one vertex of a proof: a message, the attestations
//! made directly on that message, and a set of outgoing operation edges.
//! Each edge owns the child reached by applying its operation to this
//! node's message, so
//!
//! ```text
//! child.msg == op.apply(parent.msg)
//! ```
//!
//! holds for every edge. The only way to add an edge is through
//! [`Timestamp::add_op`], deserialization or merge, all of which compute the
//! child message themselves.
//!
//! Several edges out of one node are independent proof paths for the same
//! message (for example the same digest submitted to two calendars).
//!
//! # Sub-modules
//!
//! - [`wire`]: the recursive binary grammar.
//! - [`merge`]: structural union of two proofs for the same message.

pub mod merge;
pub mod wire;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use wire::DEFAULT_MAX_DEPTH;

use crate::attestation::Attestation;
use crate::error::Result;
use crate::op::Op;

/// A node of a proof tree.
///
/// Attestations and edges live in ordered containers keyed by value, so two
/// separately constructed but equal operations address the same child, and
/// iteration (and therefore serialization) order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    msg: Vec<u8>,
    attestations: BTreeSet<Attestation>,
    ops: BTreeMap<Op, Timestamp>,
}

impl Timestamp {
    /// A bare node for `msg`: no attestations, no edges.
    #[must_use]
    pub fn new(msg: impl Into<Vec<u8>>) -> Self {
        Self {
            msg: msg.into(),
            attestations: BTreeSet::new(),
            ops: BTreeMap::new(),
        }
    }

    /// The message this node commits to.
    #[must_use]
    pub fn msg(&self) -> &[u8] {
        &self.msg
    }

    #[must_use]
    pub const fn attestations(&self) -> &BTreeSet<Attestation> {
        &self.attestations
    }

    /// Outgoing edges, in `(tag, argument)` order.
    #[must_use]
    pub const fn ops(&self) -> &BTreeMap<Op, Self> {
        &self.ops
    }

    /// Attach an attestation. Returns `false` if an equal one was already
    /// present.
    pub fn attest(&mut self, attestation: Attestation) -> bool {
        self.attestations.insert(attestation)
    }

    /// Add the edge `op` and return its child.
    ///
    /// If an equal operation already labels an edge, the existing child is
    /// returned untouched.
    ///
    /// # Errors
    ///
    /// Whatever [`Op::apply`] reports for this node's message; the tree is
    /// unchanged in that case.
    pub fn add_op(&mut self, op: Op) -> Result<&mut Self> {
        match self.ops.entry(op) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let child = Self::new(entry.key().apply(&self.msg)?);
                Ok(entry.insert(child))
            }
        }
    }

    /// The child reached through `op`, if that edge exists.
    #[must_use]
    pub fn child(&self, op: &Op) -> Option<&Self> {
        self.ops.get(op)
    }

    /// A node with no attestations and no edges asserts nothing.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.attestations.is_empty() && self.ops.is_empty()
    }

    /// Every attestation in the tree with the message it attests, depth
    /// first, a node's own attestations before its children's.
    #[must_use]
    pub fn all_attestations(&self) -> Vec<(&[u8], &Attestation)> {
        let mut out = Vec::new();
        self.collect_attestations(&mut out);
        out
    }

    fn collect_attestations<'a>(&'a self, out: &mut Vec<(&'a [u8], &'a Attestation)>) {
        out.extend(self.attestations.iter().map(|a| (self.msg.as_slice(), a)));
        for child in self.ops.values() {
            child.collect_attestations(out);
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ops.values().map(|c| c.depth() + 1).max().unwrap_or(0)
    }

    /// Compact proof tree: `verify <attestation>` lines, with ` -> <op>`
    /// introducing each branch where a node fans out.
    #[must_use]
    pub fn str_tree(&self) -> String {
        Tree {
            root: self,
            verbose: false,
        }
        .to_string()
    }

    /// Like [`Timestamp::str_tree`], with the hex message each step and
    /// attestation applies to.
    #[must_use]
    pub fn str_tree_verbose(&self) -> String {
        Tree {
            root: self,
            verbose: true,
        }
        .to_string()
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize, verbose: bool) -> fmt::Result {
        let pad = "\t".repeat(indent);
        let msg_hex = hex::encode(&self.msg);

        for attestation in &self.attestations {
            write!(f, "{pad}verify {attestation}")?;
            if verbose {
                write!(f, " ({msg_hex})")?;
            }
            writeln!(f)?;
        }

        let fan_out = self.ops.len() > 1;
        for (op, child) in &self.ops {
            if fan_out {
                write!(f, "{pad} -> {op}")?;
            } else {
                write!(f, "{pad}{op}")?;
            }
            if verbose {
                write!(f, " ({msg_hex})")?;
            }
            writeln!(f)?;
            child.write_tree(f, if fan_out { indent + 1 } else { indent }, verbose)?;
        }
        Ok(())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "\t".repeat(indent);
        writeln!(f, "{pad}msg: {}", hex::encode(&self.msg))?;
        writeln!(f, "{pad}{} attestations:", self.attestations.len())?;
        for (i, attestation) in self.attestations.iter().enumerate() {
            writeln!(f, "{pad}[{i}] {attestation}")?;
        }
        writeln!(f, "{pad}{} ops:", self.ops.len())?;
        for (i, (op, child)) in self.ops.iter().enumerate() {
            writeln!(f, "{pad}[{i}] op: {op}")?;
            writeln!(f, "{pad}[{i}] timestamp:")?;
            child.fmt_indented(f, indent + 1)?;
        }
        Ok(())
    }
}

/// Proof-tree rendering behind [`Timestamp::str_tree`].
struct Tree<'a> {
    root: &'a Timestamp,
    verbose: bool,
}

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_tree(f, 0, self.verbose)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
