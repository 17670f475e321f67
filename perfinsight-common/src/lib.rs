pub mod types;
pub mod error;
pub mod config;

pub use types::*;
pub use error::{ErrorKind, InsightError, Result};
pub use config::{
    AnalysisConfig, AnomalyConfig, ComparisonConfig, ConfigSource, Granularity,
    InsightRules, NormalizerConfig, Profile, ThresholdConfig, TrendConfig,
    load_config,
};
