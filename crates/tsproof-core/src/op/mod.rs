//! Byte-transform operations labelling the edges of a proof.
//!
//! An [`Op`] is an immutable value: a one-byte tag and, for the binary
//! operations, a byte-string argument. Two operations are equal exactly when
//! tag and argument are equal, and they order by `(tag, argument)`, which is
//! the order edges are written in.
//!
//! # Applying an operation
//!
//! [`Op::apply`] is the only way to run a transform. It checks the input
//! against [`Op::max_msg_length`] before doing any work, runs the variant's
//! transform, and only then checks the output against
//! [`Op::max_result_length`]. Hash operations therefore always digest their
//! whole input before a result bound can reject it.
//!
//! # Wire form
//!
//! ```text
//! unary:  [tag]
//! binary: [tag] [varint len] [arg bytes]     (len <= MAX_RESULT_LENGTH)
//! ```

mod hash;
mod registry;

use std::cmp::Ordering;
use std::fmt;
use std::io::Read;

pub use hash::{HASH_CHUNK_SIZE, HashAlgo};
pub use registry::{
    OpKind, TAG_APPEND, TAG_HEXLIFY, TAG_PREPEND, TAG_REVERSE, TAG_RIPEMD160, TAG_SHA1,
    TAG_SHA256,
};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Default upper bound on an operation's input, in bytes.
pub const MAX_MSG_LENGTH: usize = 4096;

/// Default upper bound on an operation's output (and on a binary argument).
pub const MAX_RESULT_LENGTH: usize = 4096;

/// A single proof step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Sha1,
    Ripemd160,
    Sha256,
    /// `msg ++ arg`
    Append(Vec<u8>),
    /// `arg ++ msg`
    Prepend(Vec<u8>),
    Reverse,
    /// Lowercase hex encoding of the message.
    Hexlify,
}

impl Op {
    /// Build an append operation.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if `arg` is longer than
    /// [`MAX_RESULT_LENGTH`].
    pub fn append(arg: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::Append(check_arg(arg.into())?))
    }

    /// Build a prepend operation.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if `arg` is longer than
    /// [`MAX_RESULT_LENGTH`].
    pub fn prepend(arg: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::Prepend(check_arg(arg.into())?))
    }

    #[must_use]
    pub const fn kind(&self) -> OpKind {
        match self {
            Self::Sha1 => OpKind::Sha1,
            Self::Ripemd160 => OpKind::Ripemd160,
            Self::Sha256 => OpKind::Sha256,
            Self::Append(_) => OpKind::Append,
            Self::Prepend(_) => OpKind::Prepend,
            Self::Reverse => OpKind::Reverse,
            Self::Hexlify => OpKind::Hexlify,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> u8 {
        self.kind().tag()
    }

    /// The argument of a binary operation.
    #[must_use]
    pub fn arg(&self) -> Option<&[u8]> {
        match self {
            Self::Append(arg) | Self::Prepend(arg) => Some(arg),
            _ => None,
        }
    }

    /// The digest behind a hash operation.
    #[must_use]
    pub const fn hash_algo(&self) -> Option<HashAlgo> {
        match self {
            Self::Sha1 => Some(HashAlgo::Sha1),
            Self::Ripemd160 => Some(HashAlgo::Ripemd160),
            Self::Sha256 => Some(HashAlgo::Sha256),
            _ => None,
        }
    }

    /// Largest input [`Op::apply`] accepts.
    #[must_use]
    pub const fn max_msg_length(&self) -> usize {
        match self {
            // Output is twice the input; keep it inside the result bound.
            Self::Hexlify => MAX_RESULT_LENGTH / 2,
            _ => MAX_MSG_LENGTH,
        }
    }

    /// Largest output [`Op::apply`] returns.
    #[must_use]
    pub const fn max_result_length(&self) -> usize {
        MAX_RESULT_LENGTH
    }

    /// Apply this operation to `msg`, enforcing both length bounds.
    ///
    /// # Errors
    ///
    /// - [`Error::MessageTooLong`] if `msg` exceeds
    ///   [`Op::max_msg_length`]; the transform is not run.
    /// - [`Error::EmptyMessage`] for `reverse`/`hexlify` on empty input.
    /// - [`Error::ResultTooLong`] if the computed result exceeds
    ///   [`Op::max_result_length`].
    pub fn apply(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let max_msg = self.max_msg_length();
        if msg.len() > max_msg {
            return Err(Error::MessageTooLong {
                op: self.kind(),
                len: msg.len(),
                max: max_msg,
            });
        }

        let result = self.transform(msg)?;

        let max_result = self.max_result_length();
        if result.len() > max_result {
            return Err(Error::ResultTooLong {
                op: self.kind(),
                len: result.len(),
                max: max_result,
            });
        }
        Ok(result)
    }

    /// Stream `reader` through this operation's digest.
    ///
    /// Only hash operations have a streaming form; no length bound applies.
    ///
    /// # Errors
    ///
    /// [`Error::NotAHashOperation`] for non-hash operations, [`Error::Io`]
    /// on read failure.
    pub fn hash_reader<R: Read>(&self, reader: R) -> Result<Vec<u8>> {
        let algo = self
            .hash_algo()
            .ok_or(Error::NotAHashOperation(self.kind()))?;
        algo.hash_reader(reader)
    }

    fn transform(&self, msg: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Sha1 => Ok(HashAlgo::Sha1.digest(msg)),
            Self::Ripemd160 => Ok(HashAlgo::Ripemd160.digest(msg)),
            Self::Sha256 => Ok(HashAlgo::Sha256.digest(msg)),
            Self::Append(arg) => {
                let mut out = Vec::with_capacity(msg.len() + arg.len());
                out.extend_from_slice(msg);
                out.extend_from_slice(arg);
                Ok(out)
            }
            Self::Prepend(arg) => {
                let mut out = Vec::with_capacity(msg.len() + arg.len());
                out.extend_from_slice(arg);
                out.extend_from_slice(msg);
                Ok(out)
            }
            Self::Reverse => {
                if msg.is_empty() {
                    return Err(Error::EmptyMessage(OpKind::Reverse));
                }
                Ok(msg.iter().rev().copied().collect())
            }
            Self::Hexlify => {
                if msg.is_empty() {
                    return Err(Error::EmptyMessage(OpKind::Hexlify));
                }
                Ok(hex::encode(msg).into_bytes())
            }
        }
    }

    /// Write the wire form of this operation.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if a binary argument exceeds
    /// [`MAX_RESULT_LENGTH`] (only possible when the variant was built
    /// directly rather than through [`Op::append`]/[`Op::prepend`]).
    pub fn serialize(&self, w: &mut ByteWriter) -> Result<()> {
        w.write_byte(self.tag());
        if let Some(arg) = self.arg() {
            w.write_varbytes(arg, MAX_RESULT_LENGTH)?;
        }
        Ok(())
    }

    /// Read one operation, tag included.
    ///
    /// # Errors
    ///
    /// See [`Op::deserialize_from_tag`].
    pub fn deserialize(r: &mut ByteReader<'_>) -> Result<Self> {
        let tag = r.read_byte()?;
        Self::deserialize_from_tag(r, tag)
    }

    /// Read the rest of an operation whose tag has already been consumed.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOperationTag`] if `tag` is not registered; codec
    /// errors if a binary argument is truncated or over-long.
    pub fn deserialize_from_tag(r: &mut ByteReader<'_>, tag: u8) -> Result<Self> {
        let kind = OpKind::from_tag(tag).ok_or(Error::UnknownOperationTag(tag))?;
        let op = match kind {
            OpKind::Sha1 => Self::Sha1,
            OpKind::Ripemd160 => Self::Ripemd160,
            OpKind::Sha256 => Self::Sha256,
            OpKind::Append => Self::Append(r.read_varbytes(MAX_RESULT_LENGTH)?.to_vec()),
            OpKind::Prepend => Self::Prepend(r.read_varbytes(MAX_RESULT_LENGTH)?.to_vec()),
            OpKind::Reverse => Self::Reverse,
            OpKind::Hexlify => Self::Hexlify,
        };
        Ok(op)
    }
}

fn check_arg(arg: Vec<u8>) -> Result<Vec<u8>> {
    if arg.len() > MAX_RESULT_LENGTH {
        return Err(Error::MalformedVarbytes {
            len: arg.len() as u64,
            max: MAX_RESULT_LENGTH,
        });
    }
    Ok(arg)
}

impl Ord for Op {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag()
            .cmp(&other.tag())
            .then_with(|| self.arg().cmp(&other.arg()))
    }
}

impl PartialOrd for Op {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arg() {
            Some(arg) => write!(f, "{} {}", self.kind(), hex::encode(arg)),
            None => write!(f, "{}", self.kind()),
        }
    }
}
