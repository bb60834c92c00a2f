//! Dependency initialization and wiring for the index tracker.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::facade::IndexDependencyService;
use crate::loader::JsonFileSource;
use crate::processor::ChangeProcessor;
use crate::TrackingError;

/// Environment variable naming the definitions document.
const DEFINITIONS_PATH_VAR: &str = "INDEX_DEFINITIONS_PATH";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output.
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    /// Parse the log format from the `LOG_FORMAT` environment variable.
    ///
    /// Valid values: "json" or "pretty" (case-insensitive).
    /// Defaults to "pretty" if not set or invalid.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => {
                warn!("Invalid LOG_FORMAT, defaulting to 'pretty'");
                Self::Pretty
            }
        }
    }
}

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub definitions_path: PathBuf,
    pub log_format: LogFormat,
}

impl TrackingConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `INDEX_DEFINITIONS_PATH`: JSON definitions document (required)
    /// - `LOG_FORMAT`: "json" or "pretty" (default: pretty)
    pub fn from_env() -> Result<Self, TrackingError> {
        let definitions_path = env::var(DEFINITIONS_PATH_VAR)
            .map(PathBuf::from)
            .map_err(|_| TrackingError::config(format!("{} is not set", DEFINITIONS_PATH_VAR)))?;

        Ok(Self {
            definitions_path,
            log_format: LogFormat::from_env(),
        })
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The query facade holding the published registry snapshot.
    pub service: Arc<IndexDependencyService>,
    /// Change processor reading from `service`.
    pub processor: ChangeProcessor,
}

impl Dependencies {
    /// Load the definitions document and publish the first registry snapshot.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(TrackingError)` - If the definitions cannot be loaded or registered
    pub fn new(config: &TrackingConfig) -> Result<Self, TrackingError> {
        info!(
            definitions_path = %config.definitions_path.display(),
            "Initializing dependencies"
        );

        let source = JsonFileSource::new(&config.definitions_path);
        let service = Arc::new(IndexDependencyService::new(Arc::new(source))?);

        info!(
            generation = service.snapshot().generation,
            "Dependency registry published"
        );

        let processor = ChangeProcessor::new(Arc::clone(&service));

        Ok(Self { service, processor })
    }
}
