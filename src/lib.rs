//! Censusdash - population census statistics.
//!
//! Loads a yearly census snapshot (one row per year, district, subdistrict,
//! sex and single age), normalizes it into canonical [`Record`]s, and
//! computes demographic indicators, age pyramids and year-over-year
//! comparisons for a [`Selection`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod models;
pub mod query;
pub mod report;

pub use dataset::Dataset;
pub use error::{CensusError, Result};
pub use models::{AgeGroup, Dimension, Metric, Record, Sex, Unavailable, Year};
pub use query::{run, Selection, View};
