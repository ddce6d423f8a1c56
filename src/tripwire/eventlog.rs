//! PV-015: Append-only JSONL provenance event log.

use crate::core::error::{ProvenanceError, Result};
use crate::core::types::{timestamp, ProvenanceEvent, TimestampedEvent};
use chrono::{SubsecRound, Utc};
use std::io::Write;
use std::path::Path;

/// Generate an ISO 8601 UTC timestamp with whole-second precision.
pub fn now_iso8601() -> String {
    timestamp::format(&Utc::now().trunc_subsecs(0))
}

/// Append an event to the log at `path`, creating parent directories.
pub fn append_event(path: &Path, event: ProvenanceEvent) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProvenanceError::io(parent, e))?;
    }

    let te = TimestampedEvent {
        ts: now_iso8601(),
        event,
    };
    let json = serde_json::to_string(&te).map_err(|e| {
        ProvenanceError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ProvenanceError::io(path, e))?;

    writeln!(file, "{}", json).map_err(|e| ProvenanceError::io(path, e))?;
    tracing::debug!(log = %path.display(), "appended provenance event");

    Ok(())
}

/// Read every event from a log. Blank lines are skipped.
pub fn read_events(path: &Path) -> Result<Vec<TimestampedEvent>> {
    let content = std::fs::read_to_string(path).map_err(|e| ProvenanceError::io(path, e))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| ProvenanceError::malformed(path, format!("line {}: {}", i + 1, e)))
        })
        .collect()
}
