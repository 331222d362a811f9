//! KPSS level-stationarity test and the differencing-order search built on it.

use crate::models::arima::diff::difference;
use crate::utils::stats::is_constant;

/// KPSS critical values for level stationarity (Kwiatkowski et al., 1992).
const KPSS_CV_10PCT: f64 = 0.347;
const KPSS_CV_5PCT: f64 = 0.463;
const KPSS_CV_1PCT: f64 = 0.739;

/// Result of a KPSS test.
#[derive(Debug, Clone, PartialEq)]
pub struct KpssResult {
    /// Test statistic.
    pub statistic: f64,
    /// Bartlett bandwidth used for the long-run variance.
    pub lags: usize,
    /// Whether stationarity is not rejected at 5%.
    pub is_stationary: bool,
}

impl KpssResult {
    /// Interpolated p-value, clamped to the tabulated range [0.01, 0.10].
    pub fn p_value(&self) -> f64 {
        let stat = self.statistic;
        if stat.is_nan() {
            return f64::NAN;
        }
        if stat <= KPSS_CV_10PCT {
            0.10
        } else if stat <= KPSS_CV_5PCT {
            0.10 - 0.05 * (stat - KPSS_CV_10PCT) / (KPSS_CV_5PCT - KPSS_CV_10PCT)
        } else if stat <= KPSS_CV_1PCT {
            0.05 - 0.04 * (stat - KPSS_CV_5PCT) / (KPSS_CV_1PCT - KPSS_CV_5PCT)
        } else {
            0.01
        }
    }
}

/// KPSS test for level stationarity.
///
/// The null hypothesis is stationarity, so a large statistic argues for
/// differencing. Constant or very short series are reported as stationary.
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> KpssResult {
    let n = series.len();
    if n < 4 || is_constant(series) {
        return KpssResult {
            statistic: 0.0,
            lags: 0,
            is_stationary: true,
        };
    }

    // Schwert-style short bandwidth: 4 * (n/100)^0.25
    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n / 2);

    let mean = series.iter().sum::<f64>() / n as f64;
    let demeaned: Vec<f64> = series.iter().map(|x| x - mean).collect();

    let mut partial = 0.0;
    let mut eta = 0.0;
    for r in &demeaned {
        partial += r;
        eta += partial * partial;
    }
    eta /= (n * n) as f64;

    let mut long_run = demeaned.iter().map(|r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let bartlett = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov: f64 = demeaned[j..]
            .iter()
            .zip(&demeaned)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * bartlett * autocov;
    }

    if long_run <= 0.0 {
        return KpssResult {
            statistic: 0.0,
            lags,
            is_stationary: true,
        };
    }

    let statistic = eta / long_run;
    KpssResult {
        statistic,
        lags,
        is_stationary: statistic < KPSS_CV_5PCT,
    }
}

/// Number of first differences needed for KPSS stationarity, capped at `max_d`.
pub fn ndiffs(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d && !kpss_test(&current, None).is_stationary {
        let next = difference(&current, 1);
        if next.len() < 4 {
            break;
        }
        current = next;
        d += 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize) -> Vec<f64> {
        // Deterministic pseudo-noise from a linear congruential sequence.
        let mut state = 12345_u64;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn white_noise_is_stationary() {
        let result = kpss_test(&noise(200), None);
        assert!(result.is_stationary, "statistic {}", result.statistic);
        assert!(result.p_value() >= 0.05);
    }

    #[test]
    fn trend_is_not_stationary() {
        let series: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let result = kpss_test(&series, None);
        assert!(!result.is_stationary);
        assert!(result.p_value() < 0.05);
    }

    #[test]
    fn constant_series_is_stationary() {
        assert!(kpss_test(&[3.0; 20], None).is_stationary);
    }

    #[test]
    fn ndiffs_respects_cap() {
        let random_walk: Vec<f64> = noise(150)
            .iter()
            .scan(0.0, |acc, e| {
                *acc += e + 0.3;
                Some(*acc)
            })
            .collect();
        let d = ndiffs(&random_walk, 2);
        assert!(d >= 1 && d <= 2);
        assert_eq!(ndiffs(&random_walk, 0), 0);
    }
}
