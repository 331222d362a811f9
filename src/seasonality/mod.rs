//! Seasonal decomposition.
//!
//! - STL: Seasonal-Trend decomposition using LOESS
//! - MSTL: STL over several seasonal periods

mod mstl;
mod stl;

pub use mstl::{MSTLResult, MSTL};
pub use stl::{STLResult, STL};
