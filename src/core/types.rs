//! PV-001: Provenance types — records, hash algorithms, verdicts, events.
//!
//! `ProvenanceRecord` fields are declared in canonical output order; serde
//! emits them in declaration order, which keeps the JSON key order stable.

use super::error::ProvenanceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// Hash algorithms
// ============================================================================

/// Supported artifact digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [HashAlgorithm; 5] = [
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Blake3,
    ];

    /// Canonical lowercase name as written into records.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Number of hex characters in a digest produced by this algorithm.
    pub fn digest_hex_len(self) -> usize {
        match self {
            Self::Sha224 => 56,
            Self::Sha256 | Self::Blake3 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ProvenanceError;

    /// Case-insensitive; `SHA-256` and `sha256` name the same algorithm.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| ProvenanceError::UnsupportedAlgorithm(s.to_string()))
    }
}

// ============================================================================
// Provenance record
// ============================================================================

/// How an artifact was produced, anchored by a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Path or identifier of the artifact at recording time
    pub artifact_path: String,

    /// Build command that produced the artifact
    pub command: String,

    /// Version of the build tool
    pub tool_version: String,

    /// Algorithm used for `artifact_hash`
    pub hash_algorithm: HashAlgorithm,

    /// Lowercase hex digest of the artifact bytes
    pub artifact_hash: String,

    /// Creation time, whole seconds, UTC
    #[serde(with = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

/// `recorded_at` wire format: `YYYY-MM-DDTHH:MM:SSZ`.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Outcome of comparing a record against the current artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Current digest equals the recorded digest
    Match,
    /// Artifact changed since recording, or the record is stale
    Mismatch,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

/// Result of a completed verification.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub verdict: Verdict,
    pub record: ProvenanceRecord,
    /// Artifact that was actually hashed
    pub artifact_path: PathBuf,
    pub expected_hash: String,
    pub actual_hash: String,
}

impl VerificationResult {
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

// ============================================================================
// Provenance events
// ============================================================================

/// Audit event for the JSONL event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvenanceEvent {
    Recorded {
        artifact: String,
        provenance_file: String,
        hash_algorithm: HashAlgorithm,
        artifact_hash: String,
    },
    Verified {
        artifact: String,
        provenance_file: String,
        verdict: Verdict,
        expected_hash: String,
        actual_hash: String,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: ProvenanceEvent,
}

// ============================================================================
// Tests
// ============================================================================
