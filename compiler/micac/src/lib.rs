//! Mica compiler driver library.
//!
//! Owns the per-module state (interner, arena, scope tree, type table,
//! diagnostics) and runs the phases strictly in order: parse (closing the
//! `#load` graph), resolve, type check. Each phase gate checks the
//! diagnostic counts; no phase sees partial output of its successor.

pub mod tracing_setup;
pub mod workspace;

pub use workspace::{Workspace, WorkspaceOptions};
