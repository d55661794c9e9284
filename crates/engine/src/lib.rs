//! Reversible execution through process duplication
//!
//! This crate provides:
//! - [`Timeline`]: the checkpoint/rewind engine for one generation
//! - Anonymous checkpoints addressed by rewind distance
//! - Named checkpoints addressed through the registry
//! - A process-wide timeline behind free functions
//! - Retry scopes built on top of them
//!
//! ```no_run
//! use rew_engine::{checkpoint, rewind, Distance};
//!
//! let mut draws = vec![rand_draw()];
//! checkpoint(1)?;
//! // Runs twice: once in the descendant, once more after the rewind lands
//! draws.push(rand_draw());
//! rewind(Distance::ONE);
//! # fn rand_draw() -> u32 { 4 }
//! # Ok::<(), rew_engine::RewError>(())
//! ```

mod anonymous;
mod named;
mod process;
pub mod retry;
mod timeline;

pub use retry::{attempt, retry, NamedRetry, NamedRetryGuard, Retry, RetryGuard};
pub use rew_core::{CheckpointName, Distance, EngineConfig, Result, RewError, DEFAULT_RETRIES};
pub use timeline::Timeline;

use parking_lot::{const_mutex, Mutex};

/// Timeline of this process, shared by the free functions and trace hooks
///
/// Its lock is held across duplication by the calling thread only; the
/// descendant inherits the held guard on its own stack and releases it when
/// the call returns.
static TIMELINE: Mutex<Timeline> = const_mutex(Timeline::new(EngineConfig::DEFAULT));

/// Replace the engine settings of the process-wide timeline
pub fn configure(config: EngineConfig) {
    TIMELINE.lock().set_config(config);
}

/// See [`Timeline::checkpoint`]
pub fn checkpoint(retries: u32) -> Result<()> {
    TIMELINE.lock().checkpoint(retries)
}

/// Checkpoint with the configured `default_retries` budget
pub fn checkpoint_default() -> Result<()> {
    let mut timeline = TIMELINE.lock();
    let retries = timeline.config().default_retries;
    timeline.checkpoint(retries)
}

/// See [`Timeline::rewind`]
pub fn rewind(distance: Distance) {
    TIMELINE.lock().rewind(distance)
}

/// See [`Timeline::rewind_all`]
pub fn rewind_all() {
    TIMELINE.lock().rewind_all()
}

/// See [`Timeline::named_checkpoint`]
pub fn named_checkpoint(name: &str) -> Result<()> {
    let name = CheckpointName::new(name)?;
    TIMELINE.lock().named_checkpoint(&name)
}

/// See [`Timeline::named_rewind`]
pub fn named_rewind(name: &str) -> Result<()> {
    let name = CheckpointName::new(name)?;
    TIMELINE.lock().named_rewind(&name)
}

/// Whether this process is the root generation
pub fn is_root() -> bool {
    TIMELINE.lock().is_root()
}

/// Number of live ancestors of this process
pub fn depth() -> u32 {
    TIMELINE.lock().depth()
}

/// Names resolvable by [`named_rewind`] from this process
pub fn named_checkpoints() -> Vec<String> {
    TIMELINE
        .lock()
        .named_checkpoints()
        .map(|name| name.to_string())
        .collect()
}
