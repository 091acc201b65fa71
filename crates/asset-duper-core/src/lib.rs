pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod keys;
pub mod listing;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod report;

pub use config::AppConfig;
pub use engine::{AnalysisResult, ComparisonResult, ReconcileEngine};
pub use error::Error;
pub use inventory::Termination;
pub use keys::{parse_key, BatchStrategy, ParsedKey};
pub use progress::{ProgressReporter, SilentReporter};
