//! Statistical and formatting helpers shared by the analysis components

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// True when every value equals the first (vacuously for an empty slice).
pub fn all_equal(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Sample standard deviation (n - 1 denominator); 0.0 below two values or
/// when all values are equal, whatever the rounding of the mean.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 || all_equal(values) {
        return 0.0;
    }

    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Sort a copy of `values` ascending. NaN never reaches here because
/// observations are validated as finite.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile of an ascending slice using linear interpolation between
/// closest ranks: rank = p / 100 * (n - 1).
pub fn percentile_linear(sorted_values: &[f64], percentile: f64) -> f64 {
    match sorted_values.len() {
        0 => return 0.0,
        1 => return sorted_values[0],
        _ => {}
    }

    let p = percentile.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted_values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted_values[lower] + fraction * (sorted_values[upper] - sorted_values[lower])
}

/// Percentage `part / whole * 100`; 0.0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Format milliseconds for human-readable output
pub fn format_millis(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.0}μs", ms * 1_000.0)
    } else if ms < 1_000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}

/// Format a signed percentage, e.g. `+12.5%`
pub fn format_change(pct: f64) -> String {
    format!("{:+.1}%", pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_of_identical_values_is_exactly_zero() {
        let values = [1222.7939016084372; 10];
        assert_eq!(sample_std_dev(&values), 0.0);
        assert!(all_equal(&values));
        assert!(!all_equal(&[1.0, 1.0, 2.0]));
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0.5), "500μs");
        assert_eq!(format_millis(1.5), "1.50ms");
        assert_eq!(format_millis(2500.0), "2.50s");
    }

    #[test]
    fn test_sample_std_dev() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let std_dev = sample_std_dev(&values);
        assert!((std_dev - 1.5811).abs() < 1e-3);
        assert_eq!(sample_std_dev(&[7.0]), 0.0);
    }

    #[test]
    fn test_percentile_linear() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile_linear(&values, 50.0), 5.5);
        assert!((percentile_linear(&values, 90.0) - 9.1).abs() < 1e-9);
        assert_eq!(percentile_linear(&values, 0.0), 1.0);
        assert_eq!(percentile_linear(&values, 100.0), 10.0);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile_linear(&[42.0], 99.0), 42.0);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }
}
