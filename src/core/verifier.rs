//! PV-016: Provenance verification — load, validate, re-hash, compare.

use super::error::{ProvenanceError, Result};
use super::types::{timestamp, HashAlgorithm, ProvenanceRecord, VerificationResult, Verdict};
use crate::tripwire::hasher;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Loose on-disk shape, so a missing or mistyped field can be named
/// precisely instead of surfacing a generic serde error.
#[derive(Debug, Deserialize)]
struct RecordDocument {
    artifact_path: Option<String>,
    command: Option<String>,
    tool_version: Option<String>,
    hash_algorithm: Option<String>,
    artifact_hash: Option<String>,
    recorded_at: Option<String>,
}

fn required(value: Option<String>, field: &str, path: &Path) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ProvenanceError::malformed(
            path,
            format!("field '{}' is empty", field),
        )),
        None => Err(ProvenanceError::malformed(
            path,
            format!("missing field '{}'", field),
        )),
    }
}

/// Parse and validate record JSON. `origin` is used only in error messages.
pub fn parse_record(json: &str, origin: &Path) -> Result<ProvenanceRecord> {
    let doc: RecordDocument =
        serde_json::from_str(json).map_err(|e| ProvenanceError::malformed(origin, e.to_string()))?;

    let artifact_path = required(doc.artifact_path, "artifact_path", origin)?;
    let command = required(doc.command, "command", origin)?;
    let tool_version = required(doc.tool_version, "tool_version", origin)?;
    let algorithm_name = required(doc.hash_algorithm, "hash_algorithm", origin)?;
    let artifact_hash = required(doc.artifact_hash, "artifact_hash", origin)?;
    let recorded_at = required(doc.recorded_at, "recorded_at", origin)?;

    let hash_algorithm: HashAlgorithm = algorithm_name.parse()?;
    if !hasher::is_valid_digest(&artifact_hash, hash_algorithm) {
        return Err(ProvenanceError::malformed(
            origin,
            format!(
                "artifact_hash is not a {}-character lowercase hex {} digest",
                hash_algorithm.digest_hex_len(),
                hash_algorithm
            ),
        ));
    }
    let recorded_at = timestamp::parse(&recorded_at).map_err(|e| {
        ProvenanceError::malformed(origin, format!("recorded_at '{}': {}", recorded_at, e))
    })?;

    Ok(ProvenanceRecord {
        artifact_path,
        command,
        tool_version,
        hash_algorithm,
        artifact_hash,
        recorded_at,
    })
}

/// Load and validate a provenance file from disk.
pub fn load_record(provenance_file: &Path) -> Result<ProvenanceRecord> {
    let content = std::fs::read_to_string(provenance_file)
        .map_err(|e| ProvenanceError::io(provenance_file, e))?;
    parse_record(&content, provenance_file)
}

/// Compare a record against the current bytes of an artifact.
///
/// `artifact_path` overrides the path stored in the record. The record is
/// never modified.
pub fn verify_record(
    record: ProvenanceRecord,
    artifact_path: Option<&Path>,
) -> Result<VerificationResult> {
    let artifact = artifact_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&record.artifact_path));

    let actual = hasher::hash_file(&artifact, record.hash_algorithm)?;
    let verdict = if actual.as_bytes() == record.artifact_hash.as_bytes() {
        Verdict::Match
    } else {
        Verdict::Mismatch
    };

    match verdict {
        Verdict::Match => tracing::info!(artifact = %artifact.display(), "provenance verified"),
        Verdict::Mismatch => tracing::warn!(
            artifact = %artifact.display(),
            expected = %record.artifact_hash,
            actual = %actual,
            "artifact does not match provenance record"
        ),
    }

    Ok(VerificationResult {
        verdict,
        expected_hash: record.artifact_hash.clone(),
        actual_hash: actual,
        artifact_path: artifact,
        record,
    })
}

/// Load a provenance file and verify it against the artifact.
pub fn verify(provenance_file: &Path, artifact_path: Option<&Path>) -> Result<VerificationResult> {
    let record = load_record(provenance_file)?;
    verify_record(record, artifact_path)
}
