//! Index Tracking Main Entry Point
//!
//! Loads the definitions document named by `INDEX_DEFINITIONS_PATH`, builds
//! the dependency registry and prints it as JSON.
//!
//! ```text
//! index-tracking                          # dependency report
//! index-tracking update Customer lastName # plan for an update event
//! index-tracking delete Customer          # plan for a delete event
//! ```

use dotenv::dotenv;
use index_tracking::config::{LogFormat, TrackingConfig};
use index_tracking::processor::EntityChangeEvent;
use index_tracking::report::{DependencyReport, PlanReport};
use index_tracking::{Dependencies, TrackingError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize tracing/logging.
///
/// Logs go to stderr so stdout carries only the JSON output.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("index_tracking=info,index_tracking_shared=info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .pretty(),
                )
                .init();
        }
    }

    info!(
        service_name = "index-tracking",
        service_version = env!("CARGO_PKG_VERSION"),
        log_format = ?format,
        "Tracing initialized"
    );
}

/// Render the output selected by the command-line arguments.
fn render(deps: &Dependencies, args: &[String]) -> Result<String, TrackingError> {
    let snapshot = deps.service.snapshot();
    let metamodel = snapshot.metamodel.as_ref();

    let Some((command, rest)) = args.split_first() else {
        return Ok(serde_json::to_string_pretty(
            &DependencyReport::from_snapshot(&snapshot),
        )?);
    };

    let (class_name, properties) = rest
        .split_first()
        .ok_or_else(|| TrackingError::config(format!("{} requires a class name", command)))?;
    let class = metamodel
        .class_by_name(class_name)
        .map(|c| c.id)
        .ok_or_else(|| TrackingError::config(format!("Unknown class {}", class_name)))?;

    let event = match command.as_str() {
        "update" => EntityChangeEvent::update(class, Uuid::new_v4(), properties.iter().cloned()),
        "delete" => EntityChangeEvent::delete(class, Uuid::new_v4()),
        other => return Err(TrackingError::config(format!("Unknown command {}", other))),
    };

    match deps.processor.process(&event) {
        Some(plan) => Ok(serde_json::to_string_pretty(&PlanReport::new(metamodel, &plan))?),
        None => {
            info!(class = %class_name, "Change does not affect any index");
            Ok("null".to_string())
        }
    }
}

fn main() -> Result<(), TrackingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing(LogFormat::from_env());

    info!("Starting index tracking");

    let config = match TrackingConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to read configuration");
            return Err(e);
        }
    };

    let deps = match Dependencies::new(&config) {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    match render(&deps, &args) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Index tracking failed");
            Err(e)
        }
    }
}
