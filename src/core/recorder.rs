//! PV-010: Provenance recording — hash the artifact, assemble, save (atomic).
//!
//! Checks run before any output is touched, so a failed `record` never
//! leaves a provenance file behind.

use super::error::{ProvenanceError, Result};
use super::types::{HashAlgorithm, ProvenanceRecord};
use crate::tripwire::hasher;
use chrono::{SubsecRound, Utc};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Inputs for a single `record` call.
#[derive(Debug, Clone)]
pub struct RecordRequest<'a> {
    pub artifact_path: &'a Path,
    pub command: &'a str,
    pub tool_version: &'a str,
    /// Algorithm name as given by the caller (e.g. `"sha256"`)
    pub hash_algorithm: &'a str,
}

/// Hash the artifact and assemble a record. Writes nothing.
pub fn create_record(req: &RecordRequest<'_>) -> Result<ProvenanceRecord> {
    let algorithm: HashAlgorithm = req.hash_algorithm.parse()?;
    if req.command.trim().is_empty() {
        return Err(ProvenanceError::EmptyField("command"));
    }
    if req.tool_version.trim().is_empty() {
        return Err(ProvenanceError::EmptyField("tool_version"));
    }

    let artifact_hash = hasher::hash_file(req.artifact_path, algorithm)?;

    Ok(ProvenanceRecord {
        artifact_path: req.artifact_path.to_string_lossy().into_owned(),
        command: req.command.to_string(),
        tool_version: req.tool_version.to_string(),
        hash_algorithm: algorithm,
        artifact_hash,
        recorded_at: Utc::now().trunc_subsecs(0),
    })
}

/// Serialize a record to canonical JSON: declaration-order keys, two-space
/// indentation, one trailing newline.
pub fn to_canonical_json(record: &ProvenanceRecord) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');
    Ok(json)
}

/// Whether `a` and `b` resolve to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Temp path used while writing `dest`: same directory, `.tmp` appended.
fn temp_path(dest: &Path) -> Result<PathBuf> {
    let name = dest.file_name().ok_or_else(|| {
        ProvenanceError::io(
            dest,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination has no file name"),
        )
    })?;
    let mut tmp_name = OsString::from(name);
    tmp_name.push(".tmp");
    Ok(dest.with_file_name(tmp_name))
}

/// Save a record atomically (write to temp, then rename).
pub fn save_record(record: &ProvenanceRecord, dest: &Path) -> Result<()> {
    if dest.is_dir() {
        return Err(ProvenanceError::io(
            dest,
            std::io::Error::new(std::io::ErrorKind::IsADirectory, "destination is a directory"),
        ));
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProvenanceError::io(parent, e))?;
    }

    let json = to_canonical_json(record).map_err(|e| {
        ProvenanceError::io(dest, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    let tmp = temp_path(dest)?;
    std::fs::write(&tmp, json.as_bytes()).map_err(|e| ProvenanceError::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, dest) {
        let _ = std::fs::remove_file(&tmp);
        return Err(ProvenanceError::io(dest, e));
    }

    Ok(())
}

/// Record provenance for an artifact and write it to `provenance_file`.
///
/// The destination must not be the artifact itself.
pub fn record(req: &RecordRequest<'_>, provenance_file: &Path) -> Result<ProvenanceRecord> {
    if provenance_file.exists() && same_file(provenance_file, req.artifact_path) {
        return Err(ProvenanceError::io(
            provenance_file,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination is the artifact being recorded",
            ),
        ));
    }
    let rec = create_record(req)?;
    save_record(&rec, provenance_file)?;
    tracing::info!(
        artifact = %rec.artifact_path,
        algorithm = %rec.hash_algorithm,
        hash = %rec.artifact_hash,
        dest = %provenance_file.display(),
        "recorded provenance"
    );
    Ok(rec)
}
