//! Seasonal ARIMA model estimated by conditional sum of squares.

use super::diff::{difference, differencing_polynomial, seasonal_difference};
use super::polynomial::{
    ar_polynomial, expand_seasonal, is_invertible, is_stationary, ma_polynomial, multiply,
    pacf_to_coefficients,
};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{aicc, gaussian_log_likelihood, is_constant, mean, VARIANCE_FLOOR};
use std::fmt;

/// Bound on the unconstrained optimizer coordinates; `tanh(3) ~ 0.995`.
const RAW_BOUND: f64 = 3.0;
/// Slack required on every reflection coefficient of a fitted polynomial.
const STABILITY_MARGIN: f64 = 1e-6;

/// ARIMA(p,d,q)(P,D,Q)\[s\] specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub cap_p: usize,
    pub cap_d: usize,
    pub cap_q: usize,
    /// Seasonal period; the seasonal part is inactive when `s <= 1`.
    pub s: usize,
    /// `None` selects the default: an intercept iff `d + D <= 1`.
    pub include_intercept: Option<bool>,
}

impl ARIMASpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            ..Default::default()
        }
    }

    pub fn with_seasonal(mut self, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        self.cap_p = cap_p;
        self.cap_d = cap_d;
        self.cap_q = cap_q;
        self.s = s;
        self
    }

    pub fn with_intercept(mut self, include: bool) -> Self {
        self.include_intercept = Some(include);
        self
    }

    /// Whether any seasonal order is set.
    pub fn has_seasonal_orders(&self) -> bool {
        self.cap_p + self.cap_d + self.cap_q > 0
    }

    /// Seasonal period in effect (0 when the seasonal part is inactive).
    fn period(&self) -> usize {
        if self.s > 1 && self.has_seasonal_orders() {
            self.s
        } else {
            0
        }
    }

    pub fn has_intercept(&self) -> bool {
        let seasonal_d = if self.period() > 0 { self.cap_d } else { 0 };
        self.include_intercept.unwrap_or(self.d + seasonal_d <= 1)
    }

    /// Number of AR and MA coefficients.
    pub fn num_coefficients(&self) -> usize {
        let seasonal = if self.period() > 0 {
            self.cap_p + self.cap_q
        } else {
            0
        };
        self.p + self.q + seasonal
    }

    /// Estimated coefficients plus the intercept.
    pub fn num_params(&self) -> usize {
        self.num_coefficients() + usize::from(self.has_intercept())
    }

    /// Observations consumed by differencing.
    pub fn differencing_lag(&self) -> usize {
        self.d + self.cap_d * self.period()
    }

    /// Largest AR lag after seasonal expansion.
    pub fn ar_lag(&self) -> usize {
        self.p + self.cap_p * self.period()
    }

    /// Minimum series length: enough observations left after differencing
    /// and AR start-up to estimate every parameter.
    pub fn min_length(&self) -> usize {
        self.differencing_lag() + self.ar_lag() + self.num_params() + 1
    }
}

impl fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.period() > 0 {
            write!(
                f,
                "({},{},{})[{}]",
                self.cap_p, self.cap_d, self.cap_q, self.s
            )?;
        }
        Ok(())
    }
}

/// AR and MA coefficients, non-seasonal and seasonal.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    phi: Vec<f64>,
    theta: Vec<f64>,
    seasonal_phi: Vec<f64>,
    seasonal_theta: Vec<f64>,
}

impl Coefficients {
    /// Decode optimizer coordinates: `tanh` maps each to a partial
    /// autocorrelation, which the Durbin-Levinson recursion turns into a
    /// stationary (or, negated, invertible) polynomial.
    fn decode(raw: &[f64], spec: &ARIMASpec) -> Self {
        let seasonal = spec.period() > 0;
        let (sp, sq) = if seasonal {
            (spec.cap_p, spec.cap_q)
        } else {
            (0, 0)
        };
        let partial: Vec<f64> = raw.iter().map(|u| u.tanh()).collect();
        let mut offset = 0;
        let mut next = |len: usize| {
            let slice = &partial[offset..offset + len];
            offset += len;
            pacf_to_coefficients(slice)
        };
        let phi = next(spec.p);
        let theta: Vec<f64> = next(spec.q).iter().map(|c| -c).collect();
        let seasonal_phi = next(sp);
        let seasonal_theta: Vec<f64> = next(sq).iter().map(|c| -c).collect();
        Self {
            phi,
            theta,
            seasonal_phi,
            seasonal_theta,
        }
    }

    /// Expanded `phi(B) Phi(B^s)` and `theta(B) Theta(B^s)`.
    fn expanded(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        let ar = multiply(
            &ar_polynomial(&self.phi),
            &expand_seasonal(&ar_polynomial(&self.seasonal_phi), period),
        );
        let ma = multiply(
            &ma_polynomial(&self.theta),
            &expand_seasonal(&ma_polynomial(&self.seasonal_theta), period),
        );
        (ar, ma)
    }

    fn is_stable(&self) -> bool {
        is_stationary(&self.phi, STABILITY_MARGIN)
            && is_stationary(&self.seasonal_phi, STABILITY_MARGIN)
            && is_invertible(&self.theta, STABILITY_MARGIN)
            && is_invertible(&self.seasonal_theta, STABILITY_MARGIN)
    }
}

/// Conditional residuals of the centred differenced series.
///
/// Errors before `start` are taken as zero and excluded from the sum of squares.
fn css_residuals(z: &[f64], ar: &[f64], ma: &[f64], start: usize) -> (Vec<f64>, f64) {
    let mut errors = vec![0.0; z.len()];
    let mut sse = 0.0;
    for t in start..z.len() {
        let mut pred = 0.0;
        for (i, c) in ar.iter().enumerate().skip(1) {
            pred -= c * z[t - i];
        }
        for (j, c) in ma.iter().enumerate().skip(1).take(t) {
            pred += c * errors[t - j];
        }
        let e = z[t] - pred;
        errors[t] = e;
        sse += e * e;
    }
    (errors, sse)
}

/// State retained after fitting.
#[derive(Debug, Clone)]
struct Fit {
    coefficients: Coefficients,
    intercept: f64,
    /// Training history on the original scale.
    history: Vec<f64>,
    /// Innovations aligned with `history`; zero where unavailable.
    innovations: Vec<f64>,
    /// `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D`.
    y_polynomial: Vec<f64>,
    ma_polynomial: Vec<f64>,
    constant: f64,
    sigma2: f64,
    log_likelihood: f64,
    /// Length of the differenced series.
    n_effective: usize,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

/// ARIMA forecasting model.
///
/// # Example
/// ```
/// use fcst_engine::core::TimeSeries;
/// use fcst_engine::models::arima::{ARIMASpec, ARIMA};
/// use fcst_engine::models::Forecaster;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps: Vec<_> = (0..40).map(|i| base + Duration::days(i)).collect();
/// let values: Vec<f64> = (0..40).map(|i| 5.0 + 2.0 * i as f64 + (i % 3) as f64).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let mut model = ARIMA::new(ARIMASpec::new(0, 1, 1));
/// model.fit(&series).unwrap();
/// assert_eq!(model.name(), "ARIMA(0,1,1)");
/// assert_eq!(model.predict(4).unwrap().horizon(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    name: String,
    optimizer: NelderMeadConfig,
    fit: Option<Fit>,
}

impl ARIMA {
    pub fn new(spec: ARIMASpec) -> Self {
        Self {
            spec,
            name: spec.to_string(),
            optimizer: NelderMeadConfig::default()
                .with_max_iter(2000)
                .with_initial_step(0.1),
            fit: None,
        }
    }

    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    pub fn spec(&self) -> &ARIMASpec {
        &self.spec
    }

    pub fn ar_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.coefficients.phi.as_slice())
    }

    pub fn ma_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.coefficients.theta.as_slice())
    }

    pub fn seasonal_ar_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.coefficients.seasonal_phi.as_slice())
    }

    pub fn seasonal_ma_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.coefficients.seasonal_theta.as_slice())
    }

    /// Mean of the differenced series (zero without an intercept).
    pub fn intercept(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.intercept)
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.sigma2)
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.log_likelihood)
    }

    /// Parameters counted by the information criterion: coefficients,
    /// intercept and the innovation variance.
    pub fn num_params(&self) -> usize {
        self.spec.num_params() + 1
    }

    pub fn aicc(&self) -> Option<f64> {
        let fit = self.fit.as_ref()?;
        aicc(fit.log_likelihood, self.num_params(), fit.n_effective)
    }

    fn validate(&self, y: &[f64]) -> Result<()> {
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if self.spec.has_seasonal_orders() && self.spec.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal orders require seasonal_period > 1, got {}",
                self.spec.s
            )));
        }
        let needed = self.spec.min_length();
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }
        Ok(())
    }

    /// Minimize the conditional sum of squares over the raw coordinates.
    fn estimate(&self, z: &[f64]) -> Result<Coefficients> {
        let spec = self.spec;
        let dim = spec.num_coefficients();
        if dim == 0 {
            return Ok(Coefficients::default());
        }
        let period = spec.period();
        let start = spec.ar_lag();
        let objective = |raw: &[f64]| -> f64 {
            let coefficients = Coefficients::decode(raw, &spec);
            let (ar, ma) = coefficients.expanded(period);
            let (_, sse) = css_residuals(z, &ar, &ma, start);
            if sse.is_finite() {
                sse
            } else {
                f64::INFINITY
            }
        };

        let bounds = vec![(-RAW_BOUND, RAW_BOUND); dim];
        let first = nelder_mead(&objective, &vec![0.0; dim], Some(&bounds), self.optimizer.clone());
        let second = nelder_mead(
            &objective,
            &first.optimal_point,
            Some(&bounds),
            self.optimizer.clone(),
        );
        let best = if second.optimal_value <= first.optimal_value {
            second
        } else {
            first
        };
        if !best.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{}: conditional sum of squares did not converge",
                self.name
            )));
        }
        Ok(Coefficients::decode(&best.optimal_point, &spec))
    }

    fn fitted(&self) -> Result<&Fit> {
        self.fit.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        self.validate(y)?;

        let spec = self.spec;
        let period = spec.period();
        let w = seasonal_difference(&difference(y, spec.d), spec.cap_d, period);
        if spec.num_coefficients() > 0 && is_constant(&w) {
            return Err(ForecastError::DegenerateSeries(format!(
                "{}: differenced series is constant",
                self.name
            )));
        }
        let intercept = if spec.has_intercept() { mean(&w) } else { 0.0 };
        let z: Vec<f64> = w.iter().map(|v| v - intercept).collect();

        let coefficients = self.estimate(&z)?;
        if !coefficients.is_stable() {
            return Err(ForecastError::NonInvertible(format!(
                "{}: fitted polynomial has a root on or inside the unit circle",
                self.name
            )));
        }

        let start = spec.ar_lag();
        let (ar, ma) = coefficients.expanded(period);
        let (errors, sse) = css_residuals(&z, &ar, &ma, start);
        let n_used = z.len() - start;
        let sigma2 = (sse / n_used as f64).max(VARIANCE_FLOOR);
        let log_likelihood = gaussian_log_likelihood(sigma2 * z.len() as f64, z.len());

        let offset = spec.differencing_lag();
        let mut innovations = vec![0.0; y.len()];
        let mut residuals = vec![f64::NAN; y.len()];
        let mut fitted = vec![f64::NAN; y.len()];
        for t in (offset + start)..y.len() {
            let e = errors[t - offset];
            innovations[t] = e;
            residuals[t] = e;
            fitted[t] = y[t] - e;
        }

        let constant = intercept * ar.iter().sum::<f64>();
        let y_polynomial = multiply(&ar, &differencing_polynomial(spec.d, spec.cap_d, period));

        self.fit = Some(Fit {
            coefficients,
            intercept,
            history: y.to_vec(),
            innovations,
            y_polynomial,
            ma_polynomial: ma,
            constant,
            sigma2,
            log_likelihood,
            n_effective: z.len(),
            fitted,
            residuals,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let fit = self.fitted()?;
        let mut values = fit.history.clone();
        let mut errors = fit.innovations.clone();
        let n = values.len();

        for _ in 0..horizon {
            let t = values.len();
            let mut pred = fit.constant;
            for (i, c) in fit.y_polynomial.iter().enumerate().skip(1).take(t) {
                pred -= c * values[t - i];
            }
            for (j, c) in fit.ma_polynomial.iter().enumerate().skip(1).take(t) {
                pred += c * errors[t - j];
            }
            values.push(pred);
            errors.push(0.0);
        }
        Ok(Forecast::from_values(values.split_off(n)))
    }

    /// `sigma * sqrt(sum_{j<h} psi_j^2)` with psi-weights of the full
    /// (differenced) model.
    fn standard_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        let fit = self.fitted()?;
        let mut psi = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        let mut out = Vec::with_capacity(horizon);
        for j in 0..horizon {
            let weight = if j == 0 {
                1.0
            } else {
                let mut w = fit.ma_polynomial.get(j).copied().unwrap_or(0.0);
                for (i, c) in fit.y_polynomial.iter().enumerate().skip(1).take(j) {
                    w -= c * psi[j - i];
                }
                w
            };
            psi.push(weight);
            cumulative += weight * weight;
            out.push((fit.sigma2 * cumulative).sqrt());
        }
        Ok(out)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.residuals.as_slice())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
