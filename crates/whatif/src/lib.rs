//! Command-line driver for scenario and sensitivity runs.
//!
//! Loads a YAML plan, checks its field table against the engine schema and
//! prints shaped results from `whatif_core`.

pub mod commands;
pub mod logging;
pub mod plan;
pub mod report;

pub use commands::OutputFormat;
pub use logging::init_logging;
pub use plan::PlanFile;
