pub mod combinatorics;
pub mod config;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod probability;
pub mod report;
pub mod selection;
pub mod suggestion;
pub mod temporal;

pub use config::EngineConfig;
pub use engine::{AnalyticsEngine, Snapshot};
pub use error::{EngineError, Result};
pub use report::{AnalysisRequest, DrawSource, ReportAssembler, RequestKind};
