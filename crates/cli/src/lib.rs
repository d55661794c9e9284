//! rew CLI library
//!
//! This crate provides:
//! - The line evaluator behind `rew shell`
//! - Shell input handling (undo commands, unbuffered line reads)

pub mod eval;
pub mod input;

pub use eval::{Bindings, EvalError, Interpreter, Scope};
pub use input::{classify, read_line, Input};
