//! Recursive binary form of a proof tree.
//!
//! A node is a flat list of branches. Every branch except the last is
//! prefixed with the sentinel `0xff`; the last has no prefix, so a node of
//! any arity needs no count field:
//!
//! ```text
//! node    := (0xff branch)* branch
//! branch  := 0x00 attestation
//!          | op-tag [op-arg] node        // child of op.apply(msg)
//! ```
//!
//! The node's message is never written; the reader knows the root message
//! and recomputes every child message by applying the edge operation.
//!
//! Branches are written attestations first (canonical attestation order),
//! then edges in `(tag, argument)` order.

use tracing::{trace, warn};

use super::Timestamp;
use crate::attestation::Attestation;
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::op::Op;

/// Tag introducing an attestation branch.
pub const ATTESTATION_TAG: u8 = 0x00;

/// Sentinel announcing that another branch follows this one.
pub const BRANCH_SENTINEL: u8 = 0xFF;

/// Default limit on how deeply a proof may nest while being parsed.
pub const DEFAULT_MAX_DEPTH: usize = 256;

impl Timestamp {
    /// Parse the proof for `msg` from `r`, nesting at most
    /// [`DEFAULT_MAX_DEPTH`] levels.
    ///
    /// # Errors
    ///
    /// Any codec, operation or attestation error met anywhere in the tree;
    /// nothing partial is returned.
    pub fn deserialize(r: &mut ByteReader<'_>, msg: impl Into<Vec<u8>>) -> Result<Self> {
        Self::deserialize_with_limit(r, msg, DEFAULT_MAX_DEPTH)
    }

    /// Parse with an explicit nesting limit.
    ///
    /// # Errors
    ///
    /// [`Error::RecursionLimit`] if the proof nests deeper than
    /// `max_depth`, otherwise as [`Timestamp::deserialize`].
    pub fn deserialize_with_limit(
        r: &mut ByteReader<'_>,
        msg: impl Into<Vec<u8>>,
        max_depth: usize,
    ) -> Result<Self> {
        parse_node(r, msg.into(), max_depth, max_depth)
    }

    /// Parse a complete proof held in `bytes`.
    ///
    /// # Errors
    ///
    /// As [`Timestamp::deserialize`], plus [`Error::TrailingBytes`] if the
    /// proof ends before `bytes` does.
    pub fn from_bytes(bytes: &[u8], msg: impl Into<Vec<u8>>) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let ts = Self::deserialize(&mut r, msg)?;
        r.assert_eof()?;
        Ok(ts)
    }

    /// Write this node and everything below it.
    ///
    /// A bare node is written as a lone `0x00`. That is not a readable
    /// proof; it only occurs for trees that assert nothing.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if an operation argument or attestation
    /// payload exceeds its bound; [`Error::MalformedAttestation`] for a
    /// pending URI that would not parse back.
    pub fn serialize(&self, w: &mut ByteWriter) -> Result<()> {
        if self.is_bare() {
            warn!(msg = %hex::encode(&self.msg), "serializing a timestamp with no attestations or ops");
            w.write_byte(ATTESTATION_TAG);
            return Ok(());
        }

        let total = self.attestations.len() + self.ops.len();
        let mut written = 0;

        for attestation in &self.attestations {
            written += 1;
            if written < total {
                w.write_byte(BRANCH_SENTINEL);
            }
            w.write_byte(ATTESTATION_TAG);
            attestation.serialize(w)?;
        }

        for (op, child) in &self.ops {
            written += 1;
            if written < total {
                w.write_byte(BRANCH_SENTINEL);
            }
            op.serialize(w)?;
            child.serialize(w)?;
        }
        Ok(())
    }

    /// Serialize into a fresh buffer.
    ///
    /// # Errors
    ///
    /// As [`Timestamp::serialize`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.serialize(&mut w)?;
        Ok(w.into_bytes())
    }
}

fn parse_node(
    r: &mut ByteReader<'_>,
    msg: Vec<u8>,
    depth_left: usize,
    limit: usize,
) -> Result<Timestamp> {
    if depth_left == 0 {
        return Err(Error::RecursionLimit { limit });
    }
    trace!(msg = %hex::encode(&msg), offset = r.position(), "parsing timestamp node");

    let mut node = Timestamp::new(msg);
    let mut tag = r.read_byte()?;
    while tag == BRANCH_SENTINEL {
        let branch = r.read_byte()?;
        parse_branch(r, &mut node, branch, depth_left, limit)?;
        tag = r.read_byte()?;
    }
    parse_branch(r, &mut node, tag, depth_left, limit)?;
    Ok(node)
}

fn parse_branch(
    r: &mut ByteReader<'_>,
    node: &mut Timestamp,
    tag: u8,
    depth_left: usize,
    limit: usize,
) -> Result<()> {
    if tag == ATTESTATION_TAG {
        let attestation = Attestation::deserialize(r)?;
        trace!(%attestation, "attestation");
        if !node.attest(attestation) {
            warn!("duplicate attestation branch in proof; keeping one copy");
        }
        return Ok(());
    }

    let op = Op::deserialize_from_tag(r, tag)?;
    let child_msg = op.apply(&node.msg)?;
    trace!(%op, result = %hex::encode(&child_msg), "edge");
    let child = parse_node(r, child_msg, depth_left - 1, limit)?;

    if let Some(existing) = node.ops.get_mut(&op) {
        warn!(%op, "duplicate operation branch in proof; merging subtrees");
        // on error the whole parse is discarded
        existing.merge_in_place(&child)?;
    } else {
        node.ops.insert(op, child);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{TAG_SHA1, TAG_SHA256};

    fn bitcoin(height: u64) -> Attestation {
        Attestation::Bitcoin { height }
    }

    fn bitcoin_branch(height: u8) -> Vec<u8> {
        let mut out = vec![ATTESTATION_TAG];
        out.extend_from_slice(&crate::attestation::BITCOIN_TAG);
        out.extend_from_slice(&[0x01, height]);
        out
    }

    #[test]
    fn single_attestation_has_no_sentinel() {
        let mut ts = Timestamp::new(b"m".to_vec());
        ts.attest(bitcoin(5));
        assert_eq!(ts.to_bytes().expect("serialize"), bitcoin_branch(5));
    }

    #[test]
    fn sentinel_precedes_all_but_last_branch() {
        let mut ts = Timestamp::new(b"m".to_vec());
        ts.attest(bitcoin(1));
        ts.attest(bitcoin(2));
        ts.add_op(Op::Sha256).expect("add").attest(bitcoin(3));

        let mut expected = vec![BRANCH_SENTINEL];
        expected.extend(bitcoin_branch(1));
        expected.push(BRANCH_SENTINEL);
        expected.extend(bitcoin_branch(2));
        expected.push(TAG_SHA256);
        expected.extend(bitcoin_branch(3));

        let bytes = ts.to_bytes().expect("serialize");
        assert_eq!(bytes, expected);
        assert_eq!(Timestamp::from_bytes(&bytes, b"m".to_vec()).expect("parse"), ts);
    }

    #[test]
    fn last_attestation_is_written_once_when_ops_follow() {
        let mut ts = Timestamp::new(b"m".to_vec());
        ts.attest(bitcoin(9));
        ts.add_op(Op::Sha1).expect("add").attest(bitcoin(8));
        let bytes = ts.to_bytes().expect("serialize");
        let needle = bitcoin_branch(9);
        let hits = bytes.windows(needle.len()).filter(|w| *w == needle.as_slice()).count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn bare_node_writes_lone_attestation_tag() {
        let ts = Timestamp::new(b"m".to_vec());
        assert_eq!(ts.to_bytes().expect("serialize"), vec![ATTESTATION_TAG]);
        // ...which does not parse back.
        assert!(Timestamp::from_bytes(&[ATTESTATION_TAG], b"m".to_vec()).is_err());
    }

    #[test]
    fn unknown_operation_tag() {
        let err = Timestamp::from_bytes(&[0x7A], b"m".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnknownOperationTag(0x7A)));
    }

    #[test]
    fn empty_input() {
        let err = Timestamp::from_bytes(&[], b"m".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfInput { offset: 0 }));
    }

    #[test]
    fn dangling_sentinel() {
        let err = Timestamp::from_bytes(&[BRANCH_SENTINEL], b"m".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfInput { .. }));
    }

    #[test]
    fn error_deep_in_tree_aborts_parse() {
        // sha256 -> sha1 -> unknown tag
        let bytes = [TAG_SHA256, TAG_SHA1, 0x7A];
        let err = Timestamp::from_bytes(&bytes, b"m".to_vec()).unwrap_err();
        assert!(matches!(err, Error::UnknownOperationTag(0x7A)));
    }

    #[test]
    fn apply_failure_during_parse_is_reported() {
        // reverse of an empty root message
        let mut bytes = vec![crate::op::TAG_REVERSE];
        bytes.extend(bitcoin_branch(1));
        let err = Timestamp::from_bytes(&bytes, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyMessage(_)));
    }

    #[test]
    fn trailing_bytes_rejected_by_from_bytes() {
        let mut bytes = bitcoin_branch(1);
        bytes.push(0x00);
        let err = Timestamp::from_bytes(&bytes, b"m".to_vec()).unwrap_err();
        assert!(matches!(err, Error::TrailingBytes { remaining: 1 }));

        // deserialize itself stops at the end of the proof
        let mut r = ByteReader::new(&bytes);
        Timestamp::deserialize(&mut r, b"m".to_vec()).expect("parse");
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn recursion_limit() {
        let mut bytes = vec![TAG_SHA256; 5];
        bytes.extend(bitcoin_branch(1));
        assert!(Timestamp::deserialize_with_limit(&mut ByteReader::new(&bytes), b"m".to_vec(), 6).is_ok());
        let err = Timestamp::deserialize_with_limit(&mut ByteReader::new(&bytes), b"m".to_vec(), 5)
            .unwrap_err();
        assert!(matches!(err, Error::RecursionLimit { limit: 5 }));
    }

    #[test]
    fn many_duplicate_branches_fold_into_one_child() {
        let mut bytes = Vec::new();
        for height in 0..200u8 {
            bytes.push(BRANCH_SENTINEL);
            bytes.push(TAG_SHA256);
            bytes.extend(bitcoin_branch(height % 100));
        }
        bytes.push(TAG_SHA256);
        bytes.extend(bitcoin_branch(100));

        let ts = Timestamp::from_bytes(&bytes, b"m".to_vec()).expect("parse");
        assert_eq!(ts.ops().len(), 1);
        let child = ts.child(&Op::Sha256).expect("child");
        assert_eq!(child.attestations().len(), 101);
    }

    #[test]
    fn unparseable_pending_uri_is_not_written() {
        let mut ts = Timestamp::new(b"m".to_vec());
        ts.add_op(Op::Sha256).expect("add").attest(Attestation::Pending {
            uri: "has space".to_string(),
        });
        let err = ts.to_bytes().unwrap_err();
        assert!(matches!(err, Error::MalformedAttestation(_)));
    }

    #[test]
    fn duplicate_branches_are_merged() {
        // 0xff sha256 <att 1>  sha256 <att 2>
        let mut bytes = vec![BRANCH_SENTINEL, TAG_SHA256];
        bytes.extend(bitcoin_branch(1));
        bytes.push(TAG_SHA256);
        bytes.extend(bitcoin_branch(2));

        let ts = Timestamp::from_bytes(&bytes, b"m".to_vec()).expect("parse");
        assert_eq!(ts.ops().len(), 1);
        let child = ts.child(&Op::Sha256).expect("child");
        assert_eq!(child.attestations().len(), 2);
    }
}
