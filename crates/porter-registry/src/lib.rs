//! Runner registry for porter.
//!
//! Picks a backend by name and holds its one-time state for a process.

pub mod context;
pub mod kind;

pub use context::RunnerContext;
pub use kind::{RunnerKind, UnknownRunner};
