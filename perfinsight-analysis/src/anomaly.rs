//! Response time anomaly detection using the z-score method

use crate::utils::{all_equal, mean, percentage, sample_std_dev};
use chrono::{DateTime, Utc};
use perfinsight_common::{AnomalyConfig, RecordSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single flagged observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub index: usize,
    pub response_time: f64,
    pub z_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySet {
    pub anomaly_count: usize,
    pub anomaly_percentage: f64,
    /// Ascending positions into the analyzed record set
    pub anomaly_indices: Vec<usize>,
    pub method: String,
    pub k: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    pub anomalies: Vec<Anomaly>,
}

impl AnomalySet {
    fn empty(k: f64) -> Self {
        Self {
            anomaly_count: 0,
            anomaly_percentage: 0.0,
            anomaly_indices: Vec::new(),
            method: "zscore".to_string(),
            k,
            lower_bound: None,
            upper_bound: None,
            anomalies: Vec::new(),
        }
    }
}

/// Flags response times strictly outside `mean ± k·σ`
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, records: &RecordSet) -> AnomalySet {
        let k = self.config.k;
        let values = records.response_times();
        let std_dev = sample_std_dev(&values);

        if all_equal(&values) || std_dev <= 0.0 {
            debug!("Response times have no spread; no anomalies flagged");
            return AnomalySet::empty(k);
        }

        let mean = mean(&values);
        let lower = mean - k * std_dev;
        let upper = mean + k * std_dev;

        let anomalies: Vec<Anomaly> = records
            .iter()
            .enumerate()
            .filter(|(_, o)| o.response_time < lower || o.response_time > upper)
            .map(|(index, o)| Anomaly {
                index,
                response_time: o.response_time,
                z_score: (o.response_time - mean) / std_dev,
                timestamp: o.timestamp,
            })
            .collect();

        debug!(
            "Flagged {} anomalies outside [{:.2}, {:.2}]",
            anomalies.len(),
            lower,
            upper
        );

        AnomalySet {
            anomaly_count: anomalies.len(),
            anomaly_percentage: percentage(anomalies.len(), values.len()),
            anomaly_indices: anomalies.iter().map(|a| a.index).collect(),
            method: "zscore".to_string(),
            k,
            lower_bound: Some(lower),
            upper_bound: Some(upper),
            anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use perfinsight_common::Observation;

    fn records(values: &[f64]) -> RecordSet {
        RecordSet::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Observation::new(Utc.timestamp_opt(i as i64, 0).unwrap(), *v, 200))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_flags_outliers() {
        let mut values = vec![100.0; 18];
        values.extend([5000.0, 6000.0]);
        let set = AnomalyDetector::default().detect(&records(&values));

        assert_eq!(set.anomaly_indices, vec![18, 19]);
        assert_eq!(set.anomaly_count, 2);
        assert_eq!(set.anomaly_percentage, 10.0);
        assert!(set.upper_bound.unwrap() < 5000.0);
        assert!(set.anomalies[1].z_score > 2.0);
    }

    #[test]
    fn test_constant_values_have_no_anomalies() {
        let set = AnomalyDetector::default().detect(&records(&[250.0; 12]));
        assert_eq!(set.anomaly_count, 0);
        assert!(set.lower_bound.is_none());
        assert!(set.upper_bound.is_none());
    }

    #[test]
    fn test_identical_values_with_inexact_mean_have_no_anomalies() {
        let values = [1222.7939016084372; 10];
        for k in [2.0, 0.1] {
            let set = AnomalyDetector::new(AnomalyConfig { k }).detect(&records(&values));
            assert_eq!(set.anomaly_count, 0, "k = {k}");
            assert_eq!(set.anomaly_percentage, 0.0);
            assert!(set.lower_bound.is_none());
            assert!(set.upper_bound.is_none());
        }
    }

    #[test]
    fn test_single_value_has_no_anomalies() {
        let set = AnomalyDetector::default().detect(&records(&[1.0]));
        assert_eq!(set.anomaly_count, 0);
        assert_eq!(set.anomaly_percentage, 0.0);
    }

    #[test]
    fn test_low_outliers_are_flagged() {
        let mut values = vec![1000.0; 30];
        values[7] = 0.0;
        let set = AnomalyDetector::new(AnomalyConfig { k: 3.0 }).detect(&records(&values));
        assert_eq!(set.anomaly_indices, vec![7]);
        assert!(set.anomalies[0].z_score < -3.0);
    }
}
