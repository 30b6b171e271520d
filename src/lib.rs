//! agecalc library crate: the evaluation engine behind `agecalc-eval`.
//!
//! The primary interface is the `agecalc-eval` binary. Modules are public so
//! integration tests can drive the dataset, scorer and gate directly.

pub mod agent;
pub mod check;
pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod telemetry;
