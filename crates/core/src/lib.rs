//! rew core - protocol and state for reversible execution
//!
//! This crate provides:
//! - The exit-code protocol carrying rewind distances and checkpoint codes
//! - The named-checkpoint registry
//! - Per-generation state (`is_root`, depth, registry)
//! - Configuration loading
//! - Shared error types

pub mod config;
pub mod error;
pub mod generation;
pub mod registry;
pub mod status;

// Re-export main types for convenience
pub use config::{EngineConfig, LogConfig, RewConfig, TraceConfig, DEFAULT_RETRIES};
pub use error::RewError;
pub use generation::Generation;
pub use registry::{CheckpointName, Registry};
pub use status::{Distance, StatusByte, ALL_SENTINEL};

/// Common result type used throughout rew
pub type Result<T> = std::result::Result<T, RewError>;
