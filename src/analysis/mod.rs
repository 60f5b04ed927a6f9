//! Analysis modules.
//!
//! Pure computations over canonical records: grouping, age pyramids,
//! demographic indicators, and year-over-year comparison.

pub mod aggregator;
pub mod comparison;
pub mod metrics;
pub mod pyramid;

pub use aggregator::*;
pub use comparison::*;
pub use metrics::*;
pub use pyramid::*;
