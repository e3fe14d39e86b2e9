//! docsync library - Keep analysis documents in sync with a Python codebase
//!
//! This library exposes the pipeline behind the `docsync` binary for testing
//! and embedding purposes. The analysis itself lives in `docsync-core`; this
//! crate adds configuration, the step orchestrator, the root-cause probe,
//! anchor suggestions and report rendering.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod suggest;

pub use config::{Config, Overrides};
pub use pipeline::{Pipeline, RunOptions, RunSummary, Step, StepStatus};
