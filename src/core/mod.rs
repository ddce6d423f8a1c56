//! Core provenance logic — types, errors, config, recording, verification.

pub mod config;
pub mod error;
pub mod recorder;
pub mod types;
pub mod verifier;
