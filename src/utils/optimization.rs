//! Bounded Nelder-Mead simplex search used by every parameter fit.
//!
//! The optimizer owns its simplex; there is no global state, every
//! evaluation is deterministic and the iteration count is capped by
//! [`NelderMeadConfig::max_iter`].

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance before the cap.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the objective spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step, relative to each coordinate's magnitude.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }
}

/// A simplex vertex with its cached objective value.
#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

struct Simplex<'a, F> {
    objective: F,
    bounds: Option<&'a [(f64, f64)]>,
    vertices: Vec<Vertex>,
}

impl<'a, F> Simplex<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, mut point: Vec<f64>) -> Vertex {
        if let Some(bounds) = self.bounds {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(lo, hi);
            }
        }
        let value = (self.objective)(&point);
        // NaN never wins a comparison.
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex { point, value }
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.value.total_cmp(&b.value));
    }

    /// Centroid of every vertex except the worst (last after sorting).
    fn centroid(&self) -> Vec<f64> {
        let keep = &self.vertices[..self.vertices.len() - 1];
        let dim = keep[0].point.len();
        let mut c = vec![0.0; dim];
        for v in keep {
            for (ci, xi) in c.iter_mut().zip(&v.point) {
                *ci += xi;
            }
        }
        let count = keep.len() as f64;
        c.iter_mut().for_each(|ci| *ci /= count);
        c
    }

    fn diameter(&self, centroid: &[f64]) -> f64 {
        self.vertices
            .iter()
            .map(|v| {
                v.point
                    .iter()
                    .zip(centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }
}

/// `centroid + coef * (centroid - away)`.
fn reflect(centroid: &[f64], away: &[f64], coef: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(away)
        .map(|(c, t)| c + coef * (c - t))
        .collect()
}

/// Minimize `objective` starting from `initial`, optionally clamped to
/// per-coordinate `bounds`.
///
/// Non-finite objective values are treated as +inf, so an objective can
/// reject a region of parameter space by returning `f64::INFINITY`.
///
/// # Example
/// ```
/// use fcst_engine::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        let value = objective(initial);
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: value,
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex = Simplex {
        objective,
        bounds,
        vertices: Vec::with_capacity(dim + 1),
    };

    let start = simplex.evaluate(initial.to_vec());
    simplex.vertices.push(start);
    for i in 0..dim {
        let mut point = initial.to_vec();
        let step = if point[i].abs() > 1e-10 {
            config.initial_step * point[i].abs()
        } else {
            config.initial_step
        };
        point[i] += step;
        // Clamping may pull the vertex back onto the start; step the other way.
        if let Some(b) = bounds {
            if point[i] > b[i].1 {
                point[i] = initial[i] - step;
            }
        }
        let vertex = simplex.evaluate(point);
        simplex.vertices.push(vertex);
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort();

        let best = simplex.vertices[0].value;
        let second_worst = simplex.vertices[dim - 1].value;
        let worst = simplex.vertices[dim].value;

        let centroid = simplex.centroid();
        let spread = worst - best;
        if (spread.is_finite() && spread.abs() < config.tolerance)
            || simplex.diameter(&centroid) < config.tolerance
        {
            converged = true;
            break;
        }

        let worst_point = simplex.vertices[dim].point.clone();
        let reflected =
            simplex.evaluate(reflect(&centroid, &worst_point, config.alpha));

        if reflected.value < best {
            let expanded_point: Vec<f64> = centroid
                .iter()
                .zip(&reflected.point)
                .map(|(c, r)| c + config.gamma * (r - c))
                .collect();
            let expanded = simplex.evaluate(expanded_point);
            simplex.vertices[dim] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex.vertices[dim] = reflected;
            continue;
        }

        let (towards, threshold) = if reflected.value < worst {
            (reflected.point.clone(), reflected.value)
        } else {
            (worst_point.clone(), worst)
        };
        let contracted_point: Vec<f64> = centroid
            .iter()
            .zip(&towards)
            .map(|(c, t)| c + config.rho * (t - c))
            .collect();
        let contracted = simplex.evaluate(contracted_point);
        if contracted.value < threshold {
            simplex.vertices[dim] = contracted;
            continue;
        }

        let anchor = simplex.vertices[0].point.clone();
        for i in 1..=dim {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&simplex.vertices[i].point)
                .map(|(a, x)| a + config.sigma * (x - a))
                .collect();
            simplex.vertices[i] = simplex.evaluate(shrunk);
        }
    }

    simplex.sort();
    let best = simplex.vertices.swap_remove(0);
    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimizes_quadratic() {
        let result = nelder_mead(
            |x| (x[0] - 1.5).powi(2) + 2.0 * (x[1] + 0.5).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 1.5, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], -0.5, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let bounds = [(0.0, 1.0)];
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.5],
            Some(&bounds),
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_point[0] <= 1.0);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn infinite_regions_are_avoided() {
        let result = nelder_mead(
            |x| {
                if x[0] < 0.2 {
                    f64::INFINITY
                } else {
                    (x[0] - 0.3).powi(2)
                }
            },
            &[0.6],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 0.3, epsilon = 1e-3);
    }

    #[test]
    fn nan_objective_never_wins() {
        let result = nelder_mead(
            |x| if x[0] > 1.0 { f64::NAN } else { (x[0] - 0.9).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert!(result.optimal_point[0] <= 1.0);
    }

    #[test]
    fn iteration_cap_is_honoured() {
        let config = NelderMeadConfig::default().with_max_iter(3);
        let result = nelder_mead(
            |x| x.iter().map(|v| (v - 10.0).powi(2)).sum(),
            &[0.0, 0.0, 0.0],
            None,
            config,
        );
        assert!(result.iterations <= 3);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let f = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] * x[0] - 0.1).powi(2);
        let a = nelder_mead(f, &[0.5, 0.5], None, NelderMeadConfig::default());
        let b = nelder_mead(f, &[0.5, 0.5], None, NelderMeadConfig::default());
        assert_eq!(a.optimal_point, b.optimal_point);
        assert_eq!(a.optimal_value.to_bits(), b.optimal_value.to_bits());
    }
}
