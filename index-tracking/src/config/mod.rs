//! Configuration and dependency wiring for the index tracker binary.

mod dependencies;

pub use dependencies::{Dependencies, LogFormat, TrackingConfig};
