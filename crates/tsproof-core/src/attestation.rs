//! Attestations: the claims a proof path ends in.
//!
//! The engine only needs an attestation to serialize, deserialize, compare
//! and render itself. Checking a claim against a ledger or calendar belongs
//! to the caller.
//!
//! # Wire form
//!
//! ```text
//! [tag: 8 bytes] [varint len] [payload: len bytes]     (len <= 8192)
//! ```
//!
//! | Tag                       | Payload                         |
//! |---------------------------|---------------------------------|
//! | `83 df e3 0d 2e f9 0c 8e` | pending: `varbytes(uri)`        |
//! | `05 88 96 0d 73 d7 19 01` | bitcoin: `varint(block height)` |
//! | anything else             | kept verbatim as `Unknown`      |
//!
//! Attestations order by their serialized bytes, which is the canonical
//! order they are written in.

use std::cmp::Ordering;
use std::fmt;

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Length of an attestation tag.
pub const TAG_SIZE: usize = 8;

/// Largest attestation payload accepted.
pub const MAX_PAYLOAD_SIZE: usize = 8192;

/// Longest calendar URI a pending attestation may carry.
pub const MAX_URI_LENGTH: usize = 1000;

pub const PENDING_TAG: [u8; TAG_SIZE] = [0x83, 0xdf, 0xe3, 0x0d, 0x2e, 0xf9, 0x0c, 0x8e];
pub const BITCOIN_TAG: [u8; TAG_SIZE] = [0x05, 0x88, 0x96, 0x0d, 0x73, 0xd7, 0x19, 0x01];

/// A claim that a message existed at some point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attestation {
    /// Submitted to a calendar; the complete proof is fetched from `uri`
    /// later.
    Pending { uri: String },
    /// Committed in the merkle root of the bitcoin block at `height`.
    Bitcoin { height: u64 },
    /// An attestation kind this build does not understand.
    Unknown {
        tag: [u8; TAG_SIZE],
        payload: Vec<u8>,
    },
}

impl Attestation {
    /// Build a pending attestation.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedAttestation`] if `uri` is too long or contains a
    /// character outside `[A-Za-z0-9._/:-]`.
    pub fn pending(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        check_uri(uri.as_bytes())?;
        Ok(Self::Pending { uri })
    }

    #[must_use]
    pub const fn tag(&self) -> [u8; TAG_SIZE] {
        match self {
            Self::Pending { .. } => PENDING_TAG,
            Self::Bitcoin { .. } => BITCOIN_TAG,
            Self::Unknown { tag, .. } => *tag,
        }
    }

    /// Write tag and length-prefixed payload.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if the payload is over
    /// [`MAX_PAYLOAD_SIZE`]; [`Error::MalformedAttestation`] if a pending URI
    /// is too long or has a disallowed character.
    pub fn serialize(&self, w: &mut ByteWriter) -> Result<()> {
        if let Self::Pending { uri } = self {
            check_uri(uri.as_bytes())?;
        }
        w.write_bytes(&self.tag());
        w.write_varbytes(&self.payload(), MAX_PAYLOAD_SIZE)
    }

    /// Payload bytes as they go on the wire, without any bound check.
    fn payload(&self) -> Vec<u8> {
        let mut payload = ByteWriter::new();
        match self {
            Self::Pending { uri } => {
                payload.write_varuint(uri.len() as u64);
                payload.write_bytes(uri.as_bytes());
            }
            Self::Bitcoin { height } => payload.write_varuint(*height),
            Self::Unknown { payload: raw, .. } => payload.write_bytes(raw),
        }
        payload.into_bytes()
    }

    /// Read one attestation.
    ///
    /// # Errors
    ///
    /// Codec errors for truncated input or an over-long payload;
    /// [`Error::MalformedAttestation`] if a known payload does not parse or
    /// is followed by extra bytes.
    pub fn deserialize(r: &mut ByteReader<'_>) -> Result<Self> {
        let tag: [u8; TAG_SIZE] = r.read_array()?;
        let payload = r.read_varbytes(MAX_PAYLOAD_SIZE)?;
        let mut p = ByteReader::new(payload);

        let attestation = match tag {
            PENDING_TAG => {
                let raw = p.read_varbytes(MAX_URI_LENGTH).map_err(malformed)?;
                check_uri(raw)?;
                // check_uri admits ASCII only
                let uri = String::from_utf8_lossy(raw).into_owned();
                Self::Pending { uri }
            }
            BITCOIN_TAG => Self::Bitcoin {
                height: p.read_varuint().map_err(malformed)?,
            },
            _ => {
                return Ok(Self::Unknown {
                    tag,
                    payload: payload.to_vec(),
                });
            }
        };

        if !p.is_eof() {
            return Err(Error::MalformedAttestation(format!(
                "{} trailing payload bytes",
                p.remaining()
            )));
        }
        Ok(attestation)
    }

    /// Serialize into a fresh buffer.
    ///
    /// # Errors
    ///
    /// As [`Attestation::serialize`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = ByteWriter::new();
        self.serialize(&mut w)?;
        Ok(w.into_bytes())
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Pending { .. } => 0,
            Self::Bitcoin { .. } => 1,
            Self::Unknown { .. } => 2,
        }
    }

    /// Wire bytes with bounds ignored. For every attestation that
    /// serializes, this is exactly its serialized form.
    fn sort_key(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut key = ByteWriter::new();
        key.write_bytes(&self.tag());
        key.write_varuint(payload.len() as u64);
        key.write_bytes(&payload);
        key.into_bytes()
    }
}

fn malformed(e: Error) -> Error {
    Error::MalformedAttestation(e.to_string())
}

fn check_uri(uri: &[u8]) -> Result<()> {
    if uri.len() > MAX_URI_LENGTH {
        return Err(Error::MalformedAttestation(format!(
            "uri of {} bytes exceeds maximum {MAX_URI_LENGTH}",
            uri.len()
        )));
    }
    if let Some(&bad) = uri
        .iter()
        .find(|&&c| !(c.is_ascii_alphanumeric() || b"-._/:".contains(&c)))
    {
        return Err(Error::MalformedAttestation(format!(
            "uri contains disallowed byte 0x{bad:02x}"
        )));
    }
    Ok(())
}

impl Ord for Attestation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            // an Unknown built by hand under a known tag
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for Attestation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { uri } => write!(f, "PendingAttestation('{uri}')"),
            Self::Bitcoin { height } => write!(f, "BitcoinBlockHeaderAttestation({height})"),
            Self::Unknown { tag, payload } => write!(
                f,
                "UnknownAttestation({}, {})",
                hex::encode(tag),
                hex::encode(payload)
            ),
        }
    }
}
