//! Structural union of two proofs for the same message.
//!
//! After `a.merge(&b)` every attestation and every edge reachable in `b` is
//! reachable in `a` at the same path. Merge is idempotent, commutative and
//! associative up to tree equality.

use std::collections::btree_map::Entry;

use tracing::{debug, instrument};

use super::Timestamp;
use crate::error::{Error, Result};

impl Timestamp {
    /// Fold `other` into `self`.
    ///
    /// The union is computed on a copy and committed only once it is
    /// complete, so `self` is untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// [`Error::MessageMismatch`] if the two roots commit to different
    /// messages, or any error from recomputing a new child's message.
    #[instrument(skip_all, fields(msg = %hex::encode(&self.msg)))]
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        let mut merged = self.clone();
        merged.merge_in_place(other)?;

        let (attestations, edges) = merged.count();
        debug!(attestations, edges, "merged timestamps");
        *self = merged;
        Ok(())
    }

    /// Non-atomic union. On error `self` may be partly merged; callers that
    /// discard `self` on error can skip the copy [`Timestamp::merge`] makes.
    pub(super) fn merge_in_place(&mut self, other: &Self) -> Result<()> {
        if self.msg != other.msg {
            return Err(Error::MessageMismatch {
                ours: hex::encode(&self.msg),
                theirs: hex::encode(&other.msg),
            });
        }

        self.attestations
            .extend(other.attestations.iter().cloned());

        for (op, theirs) in &other.ops {
            match self.ops.entry(op.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().merge_in_place(theirs)?,
                Entry::Vacant(entry) => {
                    let mut child = Self::new(op.apply(&self.msg)?);
                    child.merge_in_place(theirs)?;
                    entry.insert(child);
                }
            }
        }
        Ok(())
    }

    fn count(&self) -> (usize, usize) {
        self.ops
            .values()
            .fold((self.attestations.len(), self.ops.len()), |(a, e), child| {
                let (ca, ce) = child.count();
                (a + ca, e + ce)
            })
    }
}
