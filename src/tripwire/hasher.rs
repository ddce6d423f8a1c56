//! PV-014: Streaming artifact digests for every supported algorithm.

use crate::core::error::{ProvenanceError, Result};
use crate::core::types::HashAlgorithm;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Incremental hasher over any supported algorithm.
enum StreamHasher {
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha224 => Self::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha224(h) => format!("{:x}", h.finalize()),
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Sha384(h) => format!("{:x}", h.finalize()),
            Self::Sha512(h) => format!("{:x}", h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Hash a file's contents. Returns the lowercase hex digest.
///
/// A missing, unreadable, or non-regular path is `ArtifactNotFound`.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let not_found = |reason: String| ProvenanceError::ArtifactNotFound {
        path: path.to_path_buf(),
        reason,
    };

    let meta = std::fs::metadata(path).map_err(|e| not_found(e.to_string()))?;
    if !meta.is_file() {
        return Err(not_found("not a regular file".to_string()));
    }

    let mut file = std::fs::File::open(path).map_err(|e| not_found(e.to_string()))?;
    let mut hasher = StreamHasher::new(algorithm);
    let mut buf = vec![0u8; STREAM_BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| not_found(format!("read error: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    tracing::debug!(path = %path.display(), %algorithm, bytes = total, "hashed artifact");
    Ok(hasher.finalize_hex())
}

/// Hash an in-memory byte slice. Returns the lowercase hex digest.
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    let mut hasher = StreamHasher::new(algorithm);
    hasher.update(data);
    hasher.finalize_hex()
}

/// Whether `digest` is lowercase hex of the length `algorithm` produces.
pub fn is_valid_digest(digest: &str, algorithm: HashAlgorithm) -> bool {
    digest.len() == algorithm.digest_hex_len()
        && digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
