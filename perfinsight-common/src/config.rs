//! Configuration for the analysis pipeline
//!
//! Every section has documented defaults and can be loaded from a TOML
//! file, overridden from `PERFINSIGHT_*` environment variables, or built
//! from a named threshold profile.

use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Option names accepted by [`ThresholdConfig::from_options`].
pub const THRESHOLD_OPTIONS: [&str; 4] = [
    "warning_response_time_ms",
    "critical_response_time_ms",
    "warning_error_rate_pct",
    "critical_error_rate_pct",
];

/// Warning/critical thresholds consumed by the insight synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub warning_response_time_ms: f64,
    pub critical_response_time_ms: f64,
    pub warning_error_rate_pct: f64,
    pub critical_error_rate_pct: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_response_time_ms: 1000.0,
            critical_response_time_ms: 3000.0,
            warning_error_rate_pct: 5.0,
            critical_error_rate_pct: 10.0,
        }
    }
}

impl ThresholdConfig {
    /// Stricter limits used for production runs.
    pub fn production() -> Self {
        Self {
            warning_response_time_ms: 800.0,
            critical_response_time_ms: 2000.0,
            warning_error_rate_pct: 3.0,
            critical_error_rate_pct: 7.0,
        }
    }

    /// Build from a flat option mapping. Missing options keep their
    /// defaults; unknown options are ignored with a warning.
    pub fn from_options(options: &BTreeMap<String, f64>) -> Result<Self> {
        let mut config = Self::default();
        for (name, value) in options {
            match name.as_str() {
                "warning_response_time_ms" => config.warning_response_time_ms = *value,
                "critical_response_time_ms" => config.critical_response_time_ms = *value,
                "warning_error_rate_pct" => config.warning_error_rate_pct = *value,
                "critical_error_rate_pct" => config.critical_error_rate_pct = *value,
                other => warn!("Ignoring unknown threshold option '{}'", other),
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn to_options(&self) -> BTreeMap<String, f64> {
        let mut options = BTreeMap::new();
        options.insert(THRESHOLD_OPTIONS[0].to_string(), self.warning_response_time_ms);
        options.insert(THRESHOLD_OPTIONS[1].to_string(), self.critical_response_time_ms);
        options.insert(THRESHOLD_OPTIONS[2].to_string(), self.warning_error_rate_pct);
        options.insert(THRESHOLD_OPTIONS[3].to_string(), self.critical_error_rate_pct);
        options
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.to_options() {
            if !value.is_finite() || value < 0.0 {
                return Err(InsightError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.warning_response_time_ms > self.critical_response_time_ms {
            return Err(InsightError::Config(format!(
                "warning_response_time_ms ({}) exceeds critical_response_time_ms ({})",
                self.warning_response_time_ms, self.critical_response_time_ms
            )));
        }
        if self.warning_error_rate_pct > self.critical_error_rate_pct {
            return Err(InsightError::Config(format!(
                "warning_error_rate_pct ({}) exceeds critical_error_rate_pct ({})",
                self.warning_error_rate_pct, self.critical_error_rate_pct
            )));
        }
        Ok(())
    }
}

/// Named threshold profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Default,
    Development,
    Production,
    Testing,
}

impl Profile {
    pub fn thresholds(self) -> ThresholdConfig {
        match self {
            Profile::Production => ThresholdConfig::production(),
            Profile::Default | Profile::Development | Profile::Testing => ThresholdConfig::default(),
        }
    }

    pub fn insight_rules(self) -> InsightRules {
        match self {
            Profile::Production => InsightRules::production(),
            Profile::Default | Profile::Development | Profile::Testing => InsightRules::default(),
        }
    }
}

impl FromStr for Profile {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Profile::Default),
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "testing" | "test" => Ok(Profile::Testing),
            other => Err(InsightError::Config(format!("unknown profile '{}'", other))),
        }
    }
}

/// Row-level tolerance and synthetic timestamp settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Largest tolerated fraction of unparseable rows (0.0..=1.0)
    pub max_drop_ratio: f64,
    /// Start of the synthetic time axis used when no timestamp column exists
    pub synthetic_start: DateTime<Utc>,
    /// Spacing between synthetic timestamps
    pub synthetic_interval_ms: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_drop_ratio: 0.5,
            synthetic_start: DateTime::<Utc>::UNIX_EPOCH,
            synthetic_interval_ms: 1000,
        }
    }
}

/// Time bucket size for trend aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
}

impl FromStr for Granularity {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(Granularity::Hour),
            "day" | "daily" => Ok(Granularity::Day),
            other => Err(InsightError::Config(format!("unknown granularity '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub granularities: Vec<Granularity>,
    /// Relative change between first and last third of buckets that counts
    /// as a trend (0.10 = 10%)
    pub relative_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            granularities: vec![Granularity::Hour, Granularity::Day],
            relative_threshold: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Number of standard deviations from the mean outside of which a
    /// response time is anomalous
    pub k: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { k: 2.0 }
    }
}

/// Rule parameters of the insight synthesizer beyond the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightRules {
    /// Anomaly percentage above which anomalies become a risk area
    pub anomaly_risk_pct: f64,
    /// p95 / mean ratio above which response times are called volatile
    pub variability_ratio: f64,
    /// Requests per second below which throughput is rated a warning
    pub warning_throughput_rps: f64,
    /// Requests per second below which throughput is rated critical
    pub critical_throughput_rps: f64,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self {
            anomaly_risk_pct: 5.0,
            variability_ratio: 3.0,
            warning_throughput_rps: 100.0,
            critical_throughput_rps: 50.0,
        }
    }
}

impl InsightRules {
    /// Higher throughput expectations used for production runs.
    pub fn production() -> Self {
        Self {
            warning_throughput_rps: 150.0,
            critical_throughput_rps: 75.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// p95 percent change that counts as a regression (or, negated, an improvement)
    pub p95_regression_pct: f64,
    /// Error-rate change in percentage points that counts as a regression
    pub error_rate_regression_pp: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            p95_regression_pct: 10.0,
            error_rate_regression_pp: 2.0,
        }
    }
}

/// Complete analysis configuration including all components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: ThresholdConfig,
    pub normalizer: NormalizerConfig,
    pub trend: TrendConfig,
    pub anomaly: AnomalyConfig,
    pub insights: InsightRules,
    pub comparison: ComparisonConfig,
}

impl AnalysisConfig {
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            thresholds: profile.thresholds(),
            insights: profile.insight_rules(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Override settings from `PERFINSIGHT_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| -> Option<f64> {
            let raw = lookup(name)?;
            match raw.trim().parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring {}={:?}: not a number", name, raw);
                    None
                }
            }
        };

        if let Some(v) = read("PERFINSIGHT_WARNING_RESPONSE_TIME_MS") {
            self.thresholds.warning_response_time_ms = v;
        }
        if let Some(v) = read("PERFINSIGHT_CRITICAL_RESPONSE_TIME_MS") {
            self.thresholds.critical_response_time_ms = v;
        }
        if let Some(v) = read("PERFINSIGHT_WARNING_ERROR_RATE_PCT") {
            self.thresholds.warning_error_rate_pct = v;
        }
        if let Some(v) = read("PERFINSIGHT_CRITICAL_ERROR_RATE_PCT") {
            self.thresholds.critical_error_rate_pct = v;
        }
        if let Some(v) = read("PERFINSIGHT_ANOMALY_K") {
            self.anomaly.k = v;
        }
        if let Some(v) = read("PERFINSIGHT_TREND_THRESHOLD") {
            self.trend.relative_threshold = v;
        }
        if let Some(v) = read("PERFINSIGHT_MAX_DROP_RATIO") {
            self.normalizer.max_drop_ratio = v;
        }
        if let Some(v) = read("PERFINSIGHT_WARNING_THROUGHPUT_RPS") {
            self.insights.warning_throughput_rps = v;
        }
        if let Some(v) = read("PERFINSIGHT_CRITICAL_THROUGHPUT_RPS") {
            self.insights.critical_throughput_rps = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        let ratio = self.normalizer.max_drop_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(InsightError::Config(format!(
                "normalizer.max_drop_ratio must be within [0, 1], got {}",
                ratio
            )));
        }
        if self.normalizer.synthetic_interval_ms == 0 {
            return Err(InsightError::Config(
                "normalizer.synthetic_interval_ms must be positive".to_string(),
            ));
        }
        if !self.trend.relative_threshold.is_finite() || self.trend.relative_threshold < 0.0 {
            return Err(InsightError::Config(format!(
                "trend.relative_threshold must be non-negative, got {}",
                self.trend.relative_threshold
            )));
        }
        if !self.anomaly.k.is_finite() || self.anomaly.k <= 0.0 {
            return Err(InsightError::Config(format!(
                "anomaly.k must be positive, got {}",
                self.anomaly.k
            )));
        }
        for (name, value) in [
            ("insights.anomaly_risk_pct", self.insights.anomaly_risk_pct),
            ("insights.variability_ratio", self.insights.variability_ratio),
            ("insights.warning_throughput_rps", self.insights.warning_throughput_rps),
            ("insights.critical_throughput_rps", self.insights.critical_throughput_rps),
            ("comparison.p95_regression_pct", self.comparison.p95_regression_pct),
            ("comparison.error_rate_regression_pp", self.comparison.error_rate_regression_pp),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(InsightError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        // Lower throughput is worse, so the critical floor sits below the warning one.
        if self.insights.critical_throughput_rps > self.insights.warning_throughput_rps {
            return Err(InsightError::Config(format!(
                "insights.critical_throughput_rps ({}) must not exceed insights.warning_throughput_rps ({})",
                self.insights.critical_throughput_rps, self.insights.warning_throughput_rps
            )));
        }
        Ok(())
    }
}

/// Configuration source for loading analysis settings
pub enum ConfigSource {
    File(PathBuf),
    Default,
    Environment,
}

/// Load analysis configuration from various sources
pub fn load_config(source: ConfigSource) -> Result<AnalysisConfig> {
    match source {
        ConfigSource::File(path) => AnalysisConfig::from_file(&path),
        ConfigSource::Default => Ok(AnalysisConfig::default()),
        ConfigSource::Environment => {
            let mut config = AnalysisConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_thresholds() {
        let config = ThresholdConfig::default();
        assert_eq!(config.warning_response_time_ms, 1000.0);
        assert_eq!(config.critical_response_time_ms, 3000.0);
        assert_eq!(config.warning_error_rate_pct, 5.0);
        assert_eq!(config.critical_error_rate_pct, 10.0);
    }

    #[test]
    fn test_thresholds_from_partial_options() {
        let mut options = BTreeMap::new();
        options.insert("critical_error_rate_pct".to_string(), 20.0);
        options.insert("not_an_option".to_string(), 1.0);

        let config = ThresholdConfig::from_options(&options).unwrap();
        assert_eq!(config.critical_error_rate_pct, 20.0);
        assert_eq!(config.warning_response_time_ms, 1000.0);
    }

    #[test]
    fn test_thresholds_reject_inverted_levels() {
        let mut options = BTreeMap::new();
        options.insert("warning_response_time_ms".to_string(), 5000.0);
        assert!(matches!(
            ThresholdConfig::from_options(&options),
            Err(InsightError::Config(_))
        ));
    }

    #[test]
    fn test_profiles() {
        assert_eq!("prod".parse::<Profile>().unwrap(), Profile::Production);
        assert_eq!(
            AnalysisConfig::for_profile(Profile::Production).thresholds.critical_response_time_ms,
            2000.0
        );
        assert!("staging".parse::<Profile>().is_err());

        let production = AnalysisConfig::for_profile(Profile::Production);
        assert_eq!(production.insights.warning_throughput_rps, 150.0);
        assert_eq!(production.insights.critical_throughput_rps, 75.0);
        assert_eq!(AnalysisConfig::for_profile(Profile::Testing).insights, InsightRules::default());
    }

    #[test]
    fn test_config_file_operations() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("perfinsight.toml");

        let mut config = AnalysisConfig::default();
        config.anomaly.k = 3.0;
        config.trend.granularities = vec![Granularity::Day];
        config.to_file(&config_path).unwrap();

        let loaded = AnalysisConfig::from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str("[anomaly]\nk = 2.5\n").unwrap();
        assert_eq!(config.anomaly.k, 2.5);
        assert_eq!(config.comparison, ComparisonConfig::default());
        assert_eq!(config.normalizer.max_drop_ratio, 0.5);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PERFINSIGHT_ANOMALY_K", "3"),
            ("PERFINSIGHT_CRITICAL_ERROR_RATE_PCT", "not-a-number"),
            ("PERFINSIGHT_WARNING_THROUGHPUT_RPS", "20"),
            ("PERFINSIGHT_CRITICAL_THROUGHPUT_RPS", "10"),
        ]
        .into_iter()
        .collect();

        let mut config = AnalysisConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.anomaly.k, 3.0);
        assert_eq!(config.thresholds.critical_error_rate_pct, 10.0);
        assert_eq!(config.insights.warning_throughput_rps, 20.0);
        assert_eq!(config.insights.critical_throughput_rps, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.normalizer.max_drop_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.anomaly.k = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.insights.critical_throughput_rps = 200.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("critical_throughput_rps"));
    }
}
