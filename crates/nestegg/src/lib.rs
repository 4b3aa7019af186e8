//! Command-line front end for the nestegg simulation library
//!
//! Loads a YAML scenario, runs it once or as a Monte Carlo sweep, and renders
//! the outcome as a table, JSON or YAML.

pub mod logging;
pub mod report;
pub mod scenario;

pub use logging::init_logging;
pub use report::OutputFormat;
pub use scenario::{Overrides, load_scenario};
