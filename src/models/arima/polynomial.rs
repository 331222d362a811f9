//! Lag-polynomial algebra for ARIMA.
//!
//! A polynomial is a coefficient vector indexed by lag, `c[0] + c[1] B + ...`.

/// Product of two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Spread a polynomial in `B^s` onto the lags of `B`.
pub fn expand_seasonal(poly: &[f64], period: usize) -> Vec<f64> {
    if poly.len() <= 1 || period <= 1 {
        return poly.to_vec();
    }
    let mut out = vec![0.0; (poly.len() - 1) * period + 1];
    for (i, &c) in poly.iter().enumerate() {
        out[i * period] = c;
    }
    out
}

/// `1 - phi_1 B - ... - phi_p B^p`.
pub fn ar_polynomial(phi: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(phi.iter().map(|c| -c)).collect()
}

/// `1 + theta_1 B + ... + theta_q B^q`.
pub fn ma_polynomial(theta: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(theta.iter().copied()).collect()
}

/// Map partial autocorrelations in (-1, 1) to the coefficients of a
/// stationary AR polynomial (Durbin-Levinson recursion).
pub fn pacf_to_coefficients(partial: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(partial.len());
    for (k, &r) in partial.iter().enumerate() {
        let mut next: Vec<f64> = (0..k).map(|j| phi[j] - r * phi[k - 1 - j]).collect();
        next.push(r);
        phi = next;
    }
    phi
}

/// Whether `1 - phi_1 B - ... - phi_p B^p` has every root outside the unit
/// circle, with `margin` of slack on each reflection coefficient.
///
/// Runs the Durbin-Levinson recursion backwards (Schur-Cohn step-down).
pub fn is_stationary(phi: &[f64], margin: f64) -> bool {
    let mut a: Vec<f64> = phi.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 - margin {
            return false;
        }
        let k = a.len() - 1;
        let denom = 1.0 - r * r;
        a = (0..k).map(|j| (a[j] + r * a[k - 1 - j]) / denom).collect();
    }
    true
}

/// Whether `1 + theta_1 B + ... + theta_q B^q` is invertible.
pub fn is_invertible(theta: &[f64], margin: f64) -> bool {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    is_stationary(&negated, margin)
}
