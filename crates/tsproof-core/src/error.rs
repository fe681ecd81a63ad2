//! Error types for proof parsing, operation application and merge.
//!
//! Every failure is returned to the caller as an [`Error`]; nothing in this
//! crate logs a problem and carries on. [`Error::code`] gives a stable
//! [`ErrorCode`] for callers that branch on the kind of failure.

use std::fmt;

use crate::op::OpKind;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MessageTooLong,
    ResultTooLong,
    EmptyMessage,
    UnknownOperationTag,
    MalformedVarbytes,
    MalformedVarint,
    UnexpectedEndOfInput,
    TrailingBytes,
    MessageMismatch,
    RecursionLimit,
    MalformedAttestation,
    NotAHashOperation,
    Io,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::MessageTooLong,
        Self::ResultTooLong,
        Self::EmptyMessage,
        Self::UnknownOperationTag,
        Self::MalformedVarbytes,
        Self::MalformedVarint,
        Self::UnexpectedEndOfInput,
        Self::TrailingBytes,
        Self::MessageMismatch,
        Self::RecursionLimit,
        Self::MalformedAttestation,
        Self::NotAHashOperation,
        Self::Io,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MessageTooLong => "E1001",
            Self::ResultTooLong => "E1002",
            Self::EmptyMessage => "E1003",
            Self::UnknownOperationTag => "E2001",
            Self::MalformedVarbytes => "E2002",
            Self::MalformedVarint => "E2003",
            Self::UnexpectedEndOfInput => "E2004",
            Self::TrailingBytes => "E2005",
            Self::MalformedAttestation => "E2006",
            Self::RecursionLimit => "E2007",
            Self::MessageMismatch => "E3001",
            Self::NotAHashOperation => "E4001",
            Self::Io => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MessageTooLong => "Operation input too long",
            Self::ResultTooLong => "Operation result too long",
            Self::EmptyMessage => "Operation needs a non-empty message",
            Self::UnknownOperationTag => "Unknown operation tag",
            Self::MalformedVarbytes => "Length-prefixed field out of bounds",
            Self::MalformedVarint => "Malformed varint",
            Self::UnexpectedEndOfInput => "Unexpected end of input",
            Self::TrailingBytes => "Trailing bytes after proof",
            Self::MessageMismatch => "Proofs commit to different messages",
            Self::RecursionLimit => "Proof nesting too deep",
            Self::MalformedAttestation => "Malformed attestation",
            Self::NotAHashOperation => "Operation is not a hash",
            Self::Io => "I/O error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::UnknownOperationTag => {
                Some("The proof uses an operation this build does not support.")
            }
            Self::UnexpectedEndOfInput | Self::TrailingBytes => {
                Some("The proof bytes are truncated or padded; fetch the proof again.")
            }
            Self::MessageMismatch => Some("Only proofs for the same root message can be merged."),
            Self::RecursionLimit => Some("Raise `limits.max_depth` if the proof is trusted."),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by the operation model, the wire codec and merge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation input exceeds the operation's message bound. The transform
    /// was not run.
    #[error("{op}: message of {len} bytes exceeds maximum {max}")]
    MessageTooLong { op: OpKind, len: usize, max: usize },

    /// Operation output exceeds the operation's result bound. The transform
    /// ran; its output was discarded.
    #[error("{op}: result of {len} bytes exceeds maximum {max}")]
    ResultTooLong { op: OpKind, len: usize, max: usize },

    /// `reverse` or `hexlify` applied to an empty message.
    #[error("{0}: cannot apply to an empty message")]
    EmptyMessage(OpKind),

    #[error("unknown operation tag 0x{0:02x}")]
    UnknownOperationTag(u8),

    /// A length-prefixed field declares (or carries) more bytes than allowed.
    #[error("varbytes length {len} exceeds maximum {max}")]
    MalformedVarbytes { len: u64, max: usize },

    #[error("varint overflows 64 bits")]
    MalformedVarint,

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEndOfInput { offset: usize },

    #[error("{remaining} trailing bytes after end of proof")]
    TrailingBytes { remaining: usize },

    /// Merge of two proofs that do not share a root message.
    #[error("cannot merge timestamps for different messages: {ours} vs {theirs}")]
    MessageMismatch { ours: String, theirs: String },

    #[error("proof nesting exceeds the limit of {limit} levels")]
    RecursionLimit { limit: usize },

    #[error("malformed attestation: {0}")]
    MalformedAttestation(String),

    #[error("{0} is not a hash operation")]
    NotAHashOperation(OpKind),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Return the machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MessageTooLong { .. } => ErrorCode::MessageTooLong,
            Self::ResultTooLong { .. } => ErrorCode::ResultTooLong,
            Self::EmptyMessage(_) => ErrorCode::EmptyMessage,
            Self::UnknownOperationTag(_) => ErrorCode::UnknownOperationTag,
            Self::MalformedVarbytes { .. } => ErrorCode::MalformedVarbytes,
            Self::MalformedVarint => ErrorCode::MalformedVarint,
            Self::UnexpectedEndOfInput { .. } => ErrorCode::UnexpectedEndOfInput,
            Self::TrailingBytes { .. } => ErrorCode::TrailingBytes,
            Self::MessageMismatch { .. } => ErrorCode::MessageMismatch,
            Self::RecursionLimit { .. } => ErrorCode::RecursionLimit,
            Self::MalformedAttestation(_) => ErrorCode::MalformedAttestation,
            Self::NotAHashOperation(_) => ErrorCode::NotAHashOperation,
            Self::Io(_) => ErrorCode::Io,
        }
    }
}

/// Wraps `std::result::Result` around our [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
