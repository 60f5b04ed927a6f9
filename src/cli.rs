//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Sex, Year};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// censusdash - population census statistics
///
/// Cleans a yearly census snapshot (tahun, kecamatan, kelurahan, kelamin,
/// umur, jumlah), computes demographic indicators for a selected year and
/// region, or compares years, and writes a Markdown/JSON report.
///
/// Examples:
///   censusdash --data "DATA PROJECT.csv"
///   censusdash --data data/ --year 2023 --district "Samarinda Ulu" --min-age 15 --max-age 64
///   censusdash --data data/ --mode compare --years 2022,2023,2024 --format json
///   censusdash --data data/ --list
///   censusdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Census snapshot: a CSV file or a directory of CSV files
    ///
    /// If not specified, the paths listed in the config are tried in order.
    #[arg(short, long, value_name = "PATH", env = "CENSUSDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Analysis mode
    #[arg(long, value_name = "MODE")]
    pub mode: Option<Mode>,

    /// Year to analyze (single mode; defaults to the latest year)
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<Year>,

    /// District (kecamatan) filter
    #[arg(long, value_name = "NAME")]
    pub district: Option<String>,

    /// Subdistrict (kelurahan) filter
    #[arg(long, value_name = "NAME")]
    pub subdistrict: Option<String>,

    /// Sex filter (L or P)
    #[arg(long, value_name = "SEX")]
    pub sex: Option<Sex>,

    /// Youngest age included
    #[arg(long, value_name = "AGE")]
    pub min_age: Option<u8>,

    /// Oldest age included (75 means "75 and above")
    #[arg(long, value_name = "AGE")]
    pub max_age: Option<u8>,

    /// Years to compare (comma-separated, compare mode)
    ///
    /// Example: --years 2022,2023,2024
    #[arg(long, value_name = "YEARS", value_delimiter = ',')]
    pub years: Option<Vec<Year>>,

    /// Number of subdistricts in the ranking
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Export the selected records as CSV
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .censusdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List available years, districts and subdistricts, then exit
    #[arg(long)]
    pub list: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .censusdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Analysis mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One year, filtered by region and age
    #[default]
    Single,
    /// Year-over-year comparison
    Compare,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(top_n) = self.top_n {
            if top_n == 0 {
                return Err("Top N must be at least 1".to_string());
            }
        }

        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                return Err(format!("Minimum age {} exceeds maximum age {}", min, max));
            }
        }

        if self.mode == Some(Mode::Compare) && self.year.is_some() {
            return Err("--year applies to single mode; use --years to compare".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data path does not exist: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            data: None,
            mode: None,
            year: None,
            district: None,
            subdistrict: None,
            sex: None,
            min_age: None,
            max_age: None,
            years: None,
            top_n: None,
            output: None,
            format: None,
            export: None,
            config: None,
            list: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "censusdash",
            "--year",
            "2023",
            "--sex",
            "p",
            "--mode",
            "single",
            "--min-age",
            "15",
        ])
        .unwrap();

        assert_eq!(args.year, Some(Year(2023)));
        assert_eq!(args.sex, Some(Sex::Female));
        assert_eq!(args.mode, Some(Mode::Single));
        assert_eq!(args.min_age, Some(15));
    }

    #[test]
    fn test_parse_years_list() {
        let args =
            Args::try_parse_from(["censusdash", "--mode", "compare", "--years", "2024,2022"])
                .unwrap();
        assert_eq!(args.years, Some(vec![Year(2024), Year(2022)]));
        assert!(Args::try_parse_from(["censusdash", "--years", "20x4"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_age_range() {
        let mut args = make_args();
        args.min_age = Some(40);
        args.max_age = Some(10);
        assert!(args.validate().is_err());

        args.max_age = Some(75);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_data_path() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/no/such/census.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
