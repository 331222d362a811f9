//! Differencing utilities for ARIMA models.

/// Apply `d` rounds of first differencing.
///
/// Each round shortens the series by one; a series that runs out of points
/// comes back empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` rounds of lag-`period` differencing.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Coefficients of `(1 - B)^d (1 - B^s)^D`, indexed by lag.
pub fn differencing_polynomial(d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = super::polynomial::multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..cap_d {
            poly = super::polynomial::multiply(&poly, &seasonal);
        }
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_difference() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 0), series);
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn over_differencing_empties_the_series() {
        assert!(difference(&[1.0, 2.0], 2).is_empty());
        assert!(seasonal_difference(&[1.0, 2.0, 3.0], 1, 3).is_empty());
    }

    #[test]
    fn seasonal_difference_removes_fixed_profile() {
        let series = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        assert_eq!(seasonal_difference(&series, 1, 4), vec![10.0; 4]);
    }

    #[test]
    fn polynomial_matches_direct_differencing() {
        let series: Vec<f64> = (0..20).map(|i| (i * i) as f64 + (i % 4) as f64).collect();
        let poly = differencing_polynomial(1, 1, 4);
        let direct = seasonal_difference(&difference(&series, 1), 1, 4);
        let lag = poly.len() - 1;
        for (k, expected) in direct.iter().enumerate() {
            let t = k + lag;
            let value: f64 = poly.iter().enumerate().map(|(i, c)| c * series[t - i]).sum();
            assert!((value - expected).abs() < 1e-9);
        }
    }
}
