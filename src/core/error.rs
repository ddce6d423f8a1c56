//! PV-003: Error taxonomy for record and verify operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by provenance operations. All are terminal for the
/// operation attempted; a verification mismatch is not an error.
#[derive(Error, Debug)]
pub enum ProvenanceError {
    /// Artifact path does not exist, is unreadable, or is not a regular file
    #[error("artifact not found: {}: {reason}", .path.display())]
    ArtifactNotFound { path: PathBuf, reason: String },

    /// Hash algorithm name is not in the supported set
    #[error("unsupported hash algorithm '{0}' (supported: sha224, sha256, sha384, sha512, blake3)")]
    UnsupportedAlgorithm(String),

    /// Provenance file could not be read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Provenance file is not a well-formed record
    #[error("malformed provenance record {}: {reason}", .path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    /// A required free-form input was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Configuration file could not be loaded or failed validation
    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

impl ProvenanceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for provenance operations.
pub type Result<T> = std::result::Result<T, ProvenanceError>;
