//! # sockgen-sync
//!
//! The reconciliation pipeline: discover hosts, render the template, publish
//! the output atomically, and fire the trigger command.
//!
//! Call [`Pipeline::run_cycle`] for exactly one synchronous cycle; the
//! daemon schedules calls through its debouncer.

pub mod error;
pub mod pipeline;
pub mod trigger;

pub use error::PipelineError;
pub use pipeline::{CycleOutcome, Pipeline, PipelineConfig};
pub use trigger::{run_trigger, TriggerOutcome};
