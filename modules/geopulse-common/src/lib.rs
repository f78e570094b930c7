//! Shared types for the GEO Pulse audit pipeline.
//!
//! Everything here is plain data: the error taxonomy, the entities threaded
//! through the pipeline stages, and the run configuration. No I/O.

pub mod config;
pub mod error;
pub mod types;
pub mod util;

pub use config::{AuditConfig, Config};
pub use error::{PipelineError, ProviderError, ProviderErrorKind, StageError};
pub use types::{Evidence, Question, Sentiment, SimulatedAnswer, TargetProvider};
