//! Provrec — build provenance recording and tamper verification.
//!
//! Records the command, tool version, and content hash of a built artifact
//! into a canonical JSON file, then re-verifies the artifact against it.

pub mod cli;
pub mod core;
pub mod tripwire;
