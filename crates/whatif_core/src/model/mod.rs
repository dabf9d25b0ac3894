//! Data model types
//!
//! - `parameters` - Plan parameter sets and field values
//! - `results` - Run outcomes, scenario rows and heatmap points

mod parameters;
mod results;

pub use parameters::*;
pub use results::*;
