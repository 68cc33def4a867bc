//! Sri Lankan personal income tax assessment.
//!
//! `core` holds the engine: taxonomy, classifier, aggregator, relief
//! resolver, bracket calculator and edit history. `cmd` is the thin CLI
//! layer over it.

pub mod cmd;
pub mod core;
