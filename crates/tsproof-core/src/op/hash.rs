//! Digest algorithms behind the hash operations.
//!
//! Each algorithm can hash an in-memory message or stream an arbitrary
//! [`Read`] source in bounded chunks, for roots that are whole files rather
//! than short handles.

use std::fmt;
use std::io::{ErrorKind, Read};

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::Result;

/// Chunk size used when streaming a reader through a digest (1 MiB).
pub const HASH_CHUNK_SIZE: usize = 1 << 20;

/// Fixed-output digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgo {
    Sha1,
    Ripemd160,
    Sha256,
}

impl HashAlgo {
    /// Length in bytes of this algorithm's digest.
    #[must_use]
    pub const fn digest_length(self) -> usize {
        match self {
            Self::Sha1 | Self::Ripemd160 => 20,
            Self::Sha256 => 32,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Ripemd160 => "ripemd160",
            Self::Sha256 => "sha256",
        }
    }

    /// Hash an in-memory message.
    #[must_use]
    pub fn digest(self, msg: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(msg).to_vec(),
            Self::Ripemd160 => Ripemd160::digest(msg).to_vec(),
            Self::Sha256 => Sha256::digest(msg).to_vec(),
        }
    }

    /// Hash everything `reader` yields, [`HASH_CHUNK_SIZE`] bytes at a time.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than [`ErrorKind::Interrupted`].
    pub fn hash_reader<R: Read>(self, reader: R) -> Result<Vec<u8>> {
        self.hash_reader_chunked(reader, HASH_CHUNK_SIZE)
    }

    /// Like [`HashAlgo::hash_reader`] with an explicit chunk size. A zero
    /// chunk size is treated as one byte.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than [`ErrorKind::Interrupted`].
    pub fn hash_reader_chunked<R: Read>(self, reader: R, chunk_size: usize) -> Result<Vec<u8>> {
        match self {
            Self::Sha1 => stream::<Sha1, R>(self, reader, chunk_size),
            Self::Ripemd160 => stream::<Ripemd160, R>(self, reader, chunk_size),
            Self::Sha256 => stream::<Sha256, R>(self, reader, chunk_size),
        }
    }
}

impl fmt::Display for HashAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn stream<D: Digest, R: Read>(algo: HashAlgo, mut reader: R, chunk_size: usize) -> Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total: u64 = 0;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buf[..n]);
                total += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    trace!(%algo, bytes = total, "hashed stream");
    Ok(hasher.finalize().to_vec())
}
