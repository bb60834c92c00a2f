//! # Index Tracking
//!
//! Incremental dependency tracking for search indexes. Given the index
//! definitions of a metamodel-driven application, computes which index
//! documents must be refreshed when an entity instance changes or is deleted.
//!
//! ## Architecture
//!
//! 1. **Loader**: Reads the metamodel and index definitions
//! 2. **Registrar**: Walks every mapped property path backwards and records
//!    the dependencies in a registry
//! 3. **Facade**: Publishes immutable registry snapshots and answers lookups
//! 4. **Processor**: Filters entity-change events and turns the relevant ones
//!    into reindex plans
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`errors`]: Error types for registration
//! - [`expansion`]: Instance-name expansion of reference paths
//! - [`facade`]: Snapshot publication and lookups
//! - [`loader`]: JSON definitions documents
//! - [`processor`]: Entity-change filtering
//! - [`registrar`]: Registration of index definitions
//! - [`registry`]: The dependency registry
//! - [`report`]: Serializable registry and plan views
//! - [`resolver`]: Back-reference resolution

pub mod config;
pub mod errors;
pub mod expansion;
pub mod facade;
pub mod loader;
pub mod processor;
pub mod registrar;
pub mod registry;
pub mod report;
pub mod resolver;

#[cfg(test)]
mod test_fixtures;

pub use config::Dependencies;
pub use errors::RegistrationError;
pub use facade::{DefinitionSet, DefinitionSource, IndexDependencyService, RegistrySnapshot};
pub use registrar::IndexDefinitionRegistrar;
pub use registry::{DependencyRegistry, PathsByRoot};

use thiserror::Error;

/// Errors that can occur during tracker initialization or execution.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Registration error.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl TrackingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
