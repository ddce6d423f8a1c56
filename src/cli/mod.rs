//! PV-017: CLI subcommands — record, verify, show.

use crate::core::config::{self, ProvenanceConfig};
use crate::core::types::{ProvenanceEvent, ProvenanceRecord, VerificationResult};
use crate::core::{recorder, verifier};
use crate::tripwire::eventlog;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash a built artifact and write its provenance record
    Record {
        /// Path to the built artifact
        artifact: PathBuf,

        /// Build command that produced the artifact
        #[arg(long)]
        command: String,

        /// Version of the build tool
        #[arg(long = "version")]
        tool_version: String,

        /// Provenance file to write (default: provenance.json)
        #[arg(long = "provenance_file", visible_alias = "provenance-file")]
        provenance_file: Option<PathBuf>,

        /// sha224, sha256, sha384, sha512, or blake3 (default: sha256)
        #[arg(long = "hash_algorithm", visible_alias = "hash-algorithm")]
        hash_algorithm: Option<String>,

        /// Append a `recorded` event to this JSONL log
        #[arg(long)]
        event_log: Option<PathBuf>,

        /// Config file (default: ./provrec.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Re-hash an artifact and compare it against its provenance record
    Verify {
        /// Artifact to check (default: path stored in the record)
        artifact: Option<PathBuf>,

        /// Provenance file to read (default: provenance.json)
        #[arg(long = "provenance_file", visible_alias = "provenance-file")]
        provenance_file: Option<PathBuf>,

        /// Exit non-zero on mismatch (for CI/cron)
        #[arg(long)]
        tripwire: bool,

        /// Append a `verified` event to this JSONL log
        #[arg(long)]
        event_log: Option<PathBuf>,

        /// Config file (default: ./provrec.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate and print a provenance record
    Show {
        /// Provenance file to read (default: provenance.json)
        #[arg(long = "provenance_file", visible_alias = "provenance-file")]
        provenance_file: Option<PathBuf>,

        /// Config file (default: ./provrec.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    let cwd = std::env::current_dir().map_err(|e| format!("cannot read working directory: {}", e))?;
    match cmd {
        Commands::Record {
            artifact,
            command,
            tool_version,
            provenance_file,
            hash_algorithm,
            event_log,
            config,
        } => {
            let cfg = load_config(config.as_deref(), &cwd)?;
            cmd_record(
                &cfg,
                &artifact,
                &command,
                &tool_version,
                provenance_file.as_deref(),
                hash_algorithm.as_deref(),
                event_log.as_deref(),
            )
        }
        Commands::Verify {
            artifact,
            provenance_file,
            tripwire,
            event_log,
            config,
        } => {
            let cfg = load_config(config.as_deref(), &cwd)?;
            cmd_verify(
                &cfg,
                provenance_file.as_deref(),
                artifact.as_deref(),
                tripwire,
                event_log.as_deref(),
            )
        }
        Commands::Show {
            provenance_file,
            config,
        } => {
            let cfg = load_config(config.as_deref(), &cwd)?;
            cmd_show(&cfg, provenance_file.as_deref())
        }
    }
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ProvenanceConfig, String> {
    config::load_config(explicit, cwd).map_err(|e| e.to_string())
}

/// Append to the audit log. A failed append is a warning, never a failing exit.
fn append_event_or_warn(log: &Path, event: ProvenanceEvent) -> bool {
    match eventlog::append_event(log, event) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(log = %log.display(), error = %e, "event log append failed");
            false
        }
    }
}

fn cmd_record(
    cfg: &ProvenanceConfig,
    artifact: &Path,
    command: &str,
    tool_version: &str,
    provenance_file: Option<&Path>,
    hash_algorithm: Option<&str>,
    event_log: Option<&Path>,
) -> Result<(), String> {
    let dest = cfg.resolve_provenance_file(provenance_file);
    let algorithm = cfg.resolve_algorithm(hash_algorithm);
    let req = recorder::RecordRequest {
        artifact_path: artifact,
        command,
        tool_version,
        hash_algorithm: &algorithm,
    };
    let rec = recorder::record(&req, &dest).map_err(|e| e.to_string())?;

    if let Some(log) = cfg.resolve_event_log(event_log) {
        let event = ProvenanceEvent::Recorded {
            artifact: rec.artifact_path.clone(),
            provenance_file: dest.display().to_string(),
            hash_algorithm: rec.hash_algorithm,
            artifact_hash: rec.artifact_hash.clone(),
        };
        append_event_or_warn(&log, event);
    }

    println!("Recorded {} ({})", rec.artifact_path, rec.hash_algorithm);
    println!("  Hash:       {}", rec.artifact_hash);
    println!("  Provenance: {}", dest.display());
    Ok(())
}

fn cmd_verify(
    cfg: &ProvenanceConfig,
    provenance_file: Option<&Path>,
    artifact: Option<&Path>,
    tripwire: bool,
    event_log: Option<&Path>,
) -> Result<(), String> {
    let source = cfg.resolve_provenance_file(provenance_file);
    let result = verifier::verify(&source, artifact).map_err(|e| e.to_string())?;

    if let Some(log) = cfg.resolve_event_log(event_log) {
        let event = ProvenanceEvent::Verified {
            artifact: result.artifact_path.display().to_string(),
            provenance_file: source.display().to_string(),
            verdict: result.verdict,
            expected_hash: result.expected_hash.clone(),
            actual_hash: result.actual_hash.clone(),
        };
        append_event_or_warn(&log, event);
    }

    print_verification(&result);

    if !result.is_match() && (tripwire || cfg.tripwire) {
        return Err(format!(
            "tampering detected: {} does not match {}",
            result.artifact_path.display(),
            source.display()
        ));
    }
    Ok(())
}

fn print_verification(result: &VerificationResult) {
    println!(
        "{}: {} ({})",
        result.verdict,
        result.artifact_path.display(),
        result.record.hash_algorithm
    );
    if !result.is_match() {
        println!("  Expected: {}", result.expected_hash);
        println!("  Actual:   {}", result.actual_hash);
    }
}

fn cmd_show(cfg: &ProvenanceConfig, provenance_file: Option<&Path>) -> Result<(), String> {
    let source = cfg.resolve_provenance_file(provenance_file);
    let rec = verifier::load_record(&source).map_err(|e| e.to_string())?;
    print_record(&rec);
    Ok(())
}

fn print_record(rec: &ProvenanceRecord) {
    println!("Artifact:  {}", rec.artifact_path);
    println!("  Command:   {}", rec.command);
    println!("  Tool:      {}", rec.tool_version);
    println!("  Algorithm: {}", rec.hash_algorithm);
    println!("  Hash:      {}", rec.artifact_hash);
    println!(
        "  Recorded:  {}",
        crate::core::types::timestamp::format(&rec.recorded_at)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Verdict;

    fn write_artifact(dir: &Path, content: &str) -> PathBuf {
        let artifact = dir.join("app.bin");
        std::fs::write(&artifact, content).unwrap();
        artifact
    }

    fn record_default(cfg: &ProvenanceConfig, artifact: &Path, dest: &Path) {
        cmd_record(
            cfg,
            artifact,
            "cargo build --release",
            "rustc 1.88.0",
            Some(dest),
            None,
            None,
        )
        .unwrap();
    }

    #[test]
    fn test_pv017_record_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(dir.path(), "binary");
        let dest = dir.path().join("provenance.json");
        let cfg = ProvenanceConfig::default();
        record_default(&cfg, &artifact, &dest);

        let rec = verifier::load_record(&dest).unwrap();
        assert_eq!(rec.hash_algorithm.name(), "sha256");
        cmd_verify(&cfg, Some(&dest), None, true, None).unwrap();
        cmd_show(&cfg, Some(&dest)).unwrap();
    }

    #[test]
    fn test_pv017_mismatch_exit_policy() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(dir.path(), "binary");
        let dest = dir.path().join("provenance.json");
        let cfg = ProvenanceConfig::default();
        record_default(&cfg, &artifact, &dest);
        std::fs::write(&artifact, "tampered").unwrap();

        // Reported, not failed, without tripwire
        cmd_verify(&cfg, Some(&dest), None, false, None).unwrap();

        let result = cmd_verify(&cfg, Some(&dest), None, true, None);
        assert!(result.unwrap_err().contains("tampering detected"));

        let strict = ProvenanceConfig {
            tripwire: true,
            ..ProvenanceConfig::default()
        };
        assert!(cmd_verify(&strict, Some(&dest), None, false, None).is_err());
    }

    #[test]
    fn test_pv017_config_algorithm_and_flag_override() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(dir.path(), "binary");
        let dest = dir.path().join("provenance.json");
        let cfg = ProvenanceConfig {
            hash_algorithm: Some("blake3".to_string()),
            ..ProvenanceConfig::default()
        };
        record_default(&cfg, &artifact, &dest);
        assert_eq!(verifier::load_record(&dest).unwrap().hash_algorithm.name(), "blake3");

        cmd_record(&cfg, &artifact, "make", "4.3", Some(&dest), Some("sha512"), None).unwrap();
        assert_eq!(verifier::load_record(&dest).unwrap().hash_algorithm.name(), "sha512");
    }

    #[test]
    fn test_pv017_record_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("provenance.json");
        let cfg = ProvenanceConfig::default();
        let missing = dir.path().join("missing.bin");
        let err = cmd_record(&cfg, &missing, "make", "4.3", Some(&dest), None, None).unwrap_err();
        assert!(err.contains("artifact not found"));
        assert!(err.contains("missing.bin"));

        let artifact = write_artifact(dir.path(), "x");
        let err =
            cmd_record(&cfg, &artifact, "make", "4.3", Some(&dest), Some("md5"), None).unwrap_err();
        assert!(err.contains("unsupported hash algorithm"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_pv017_event_log() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(dir.path(), "binary");
        let dest = dir.path().join("provenance.json");
        let log = dir.path().join("events.jsonl");
        let cfg = ProvenanceConfig {
            event_log: Some(log.clone()),
            ..ProvenanceConfig::default()
        };
        record_default(&cfg, &artifact, &dest);
        std::fs::write(&artifact, "changed").unwrap();
        cmd_verify(&cfg, Some(&dest), None, false, None).unwrap();

        let events = eventlog::read_events(&log).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, ProvenanceEvent::Recorded { .. }));
        assert!(matches!(
            events[1].event,
            ProvenanceEvent::Verified { verdict: Verdict::Mismatch, .. }
        ));
    }

    #[test]
    fn test_pv017_unwritable_event_log_keeps_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_artifact(dir.path(), "binary");
        let dest = dir.path().join("provenance.json");
        // A directory cannot be opened for appending
        let log_dir = dir.path().join("logdir");
        std::fs::create_dir(&log_dir).unwrap();
        let cfg = ProvenanceConfig {
            event_log: Some(log_dir.clone()),
            ..ProvenanceConfig::default()
        };

        record_default(&cfg, &artifact, &dest);
        assert!(verifier::load_record(&dest).is_ok());
        cmd_verify(&cfg, Some(&dest), None, true, None).unwrap();
        assert!(!append_event_or_warn(
            &log_dir,
            ProvenanceEvent::Recorded {
                artifact: "a".to_string(),
                provenance_file: "p".to_string(),
                hash_algorithm: crate::core::types::HashAlgorithm::Sha256,
                artifact_hash: "h".to_string(),
            }
        ));
    }

    #[test]
    fn test_pv017_show_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("provenance.json");
        std::fs::write(&dest, "{\"command\": \"make\"}").unwrap();
        let err = cmd_show(&ProvenanceConfig::default(), Some(&dest)).unwrap_err();
        assert!(err.contains("malformed provenance record"));
    }

    #[test]
    fn test_pv017_parse_cli_flags() {
        use clap::Parser;

        #[derive(Parser, Debug)]
        struct TestCli {
            #[command(subcommand)]
            command: Commands,
        }

        let cli = TestCli::try_parse_from([
            "provrec",
            "record",
            "dist/app.bin",
            "--command",
            "gcc -O2 -o app.bin main.c",
            "--version",
            "gcc-12.2",
            "--provenance_file",
            "out.json",
            "--hash_algorithm",
            "sha512",
        ])
        .unwrap();
        match cli.command {
            Commands::Record {
                artifact,
                command,
                tool_version,
                provenance_file,
                hash_algorithm,
                ..
            } => {
                assert_eq!(artifact, PathBuf::from("dist/app.bin"));
                assert_eq!(command, "gcc -O2 -o app.bin main.c");
                assert_eq!(tool_version, "gcc-12.2");
                assert_eq!(provenance_file, Some(PathBuf::from("out.json")));
                assert_eq!(hash_algorithm.as_deref(), Some("sha512"));
            }
            other => panic!("expected record, got {:?}", other),
        }

        let cli = TestCli::try_parse_from([
            "provrec",
            "verify",
            "--provenance-file",
            "out.json",
            "--tripwire",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Verify { tripwire: true, artifact: None, .. }
        ));
    }
}
