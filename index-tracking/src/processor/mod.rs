//! Processor module for the index tracker.
//!
//! Turns entity-change events into reindex plans.

mod change_processor;
mod messages;

pub use change_processor::ChangeProcessor;
pub use messages::{EntityChangeEvent, EntityChangeKind, ReindexAction, ReindexPlan};
