//! Theta family.
//!
//! - [`Theta`]: standard Theta method with a fixed theta coefficient
//! - [`OptimizedTheta`]: theta selected by AICc over `[1, 3]`
//!
//! Seasonal series are deseasonalized with classical decomposition
//! (multiplicative when the data are positive) before the theta lines are
//! fitted.

mod model;
mod optimized;

pub use model::{DecompositionType, Theta, DEFAULT_THETA};
pub use optimized::{OptimizedTheta, THETA_BOUNDS};
