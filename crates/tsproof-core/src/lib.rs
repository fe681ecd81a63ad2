//! tsproof-core: verifiable timestamp proofs.
//!
//! A proof is a tree rooted at a message. Each edge is an [`Op`] (hash,
//! append, prepend, ...) taking its parent's message to its child's, and
//! each leaf ends in one or more [`Attestation`]s. Anyone holding the root
//! message can replay the operations and check that every attestation
//! commits to the message it is attached to.
//!
//! ```
//! use tsproof_core::{Attestation, Op, Timestamp};
//!
//! let mut proof = Timestamp::new(b"hello".to_vec());
//! proof
//!     .add_op(Op::Sha256)?
//!     .attest(Attestation::pending("https://calendar.example")?);
//!
//! let bytes = proof.to_bytes()?;
//! assert_eq!(Timestamp::from_bytes(&bytes, b"hello".to_vec())?, proof);
//! # Ok::<(), tsproof_core::Error>(())
//! ```
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`error::Result`]; config
//!   loading returns `anyhow::Result` with file context.
//! - **Logging**: `tracing` macros only. No subscriber is installed here.

pub mod attestation;
pub mod codec;
pub mod config;
pub mod error;
pub mod op;
pub mod timestamp;

pub use attestation::Attestation;
pub use error::{Error, ErrorCode, Result};
pub use op::{HashAlgo, Op, OpKind};
pub use timestamp::Timestamp;
