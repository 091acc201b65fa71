use crate::keys::{BatchRule, BatchStrategy, ScanMode};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Key prefix the listing was restricted to (empty for bucket-wide).
    pub prefix: String,
    pub scan_mode: ScanMode,
    /// Overrides the batch rules implied by `scan_mode`.
    pub batch_rules: Option<Vec<BatchRule>>,
    pub ignore_patterns: Vec<String>,
    pub output_dir: String,
    pub report_prefix: String,
    pub progress_interval: usize,
    /// Leading token that marks the first line of a reference list as a header.
    pub reference_header_token: String,
    /// Column holding the object key when reading a CSV export.
    pub path_column: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            scan_mode: ScanMode::default(),
            batch_rules: None,
            ignore_patterns: Vec::new(),
            output_dir: "data/output".to_string(),
            report_prefix: "asset_analysis".to_string(),
            progress_interval: 1000,
            reference_header_token: "original".to_string(),
            path_column: "Full Object Key".to_string(),
        }
    }
}

impl AppConfig {
    pub fn batch_strategy(&self) -> BatchStrategy {
        match &self.batch_rules {
            Some(rules) => BatchStrategy::new(rules.clone()),
            None => BatchStrategy::for_mode(self.scan_mode),
        }
    }
}

/// Load `Config.toml` (optional) overlaid with `ASSET_DUPER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("ASSET_DUPER").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
