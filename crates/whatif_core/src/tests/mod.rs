//! Integration tests for the scenario orchestrator
//!
//! Tests are organized by topic:
//! - `mock` - Scripted in-memory `SimulationClient`
//! - `deltas` - Delta and sweep-variation application
//! - `scenarios` - Scenario batches: ordering, failure isolation, halting
//! - `sensitivity` - Sweep batches: fan-out, sparse results, sweep modes
//! - `http_client` - reqwest adapter against an in-process axum engine

mod deltas;
