//! Execution tracing for rew
//!
//! This crate provides:
//! - A process-wide hook table, one callback per event granularity
//! - Probe macros reporting statements and calls with their source unit
//! - The installer that turns trace events into automatic checkpoints

pub mod hook;
pub mod installer;

pub use hook::{current_hook, emit, set_hook, Granularity, TraceEvent, TraceFn};
pub use installer::{checkpoint_each, checkpoint_each_call, checkpoint_each_statement};
