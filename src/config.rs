//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.censusdash.toml` files, and turning it into a [`Selection`].

use crate::analysis::AgeRange;
use crate::cli::{Args, Mode, OutputFormat};
use crate::models::{Sex, Year, AGE_CEILING};
use crate::query::{CompareQuery, Selection, YearQuery};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".censusdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Default selection.
    #[serde(default)]
    pub query: QueryConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "census_report.md".to_string()
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Candidate snapshot paths, tried in order.
    #[serde(default = "default_paths")]
    pub paths: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
        }
    }
}

fn default_paths() -> Vec<String> {
    vec!["DATA PROJECT.csv", "data/DATA PROJECT.csv"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Default selection, overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Analysis mode.
    #[serde(default)]
    pub mode: Mode,

    /// Year for single-year mode; latest when unset.
    #[serde(default)]
    pub year: Option<i32>,

    /// District filter; all districts when unset.
    #[serde(default)]
    pub district: Option<String>,

    /// Subdistrict filter; all subdistricts when unset.
    #[serde(default)]
    pub subdistrict: Option<String>,

    /// Sex filter (`L`/`P`); both when unset.
    #[serde(default)]
    pub sex: Option<String>,

    /// Youngest age included.
    #[serde(default)]
    pub min_age: u8,

    /// Oldest age included; 75 means "75 and above".
    #[serde(default = "default_max_age")]
    pub max_age: u8,

    /// Years for comparison mode; all years when empty.
    #[serde(default)]
    pub years: Vec<i32>,

    /// Number of subdistricts in the ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            year: None,
            district: None,
            subdistrict: None,
            sex: None,
            min_age: 0,
            max_age: default_max_age(),
            years: Vec::new(),
            top_n: default_top_n(),
        }
    }
}

fn default_max_age() -> u8 {
    AGE_CEILING
}

fn default_top_n() -> usize {
    15
}

/// Report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write the selected records as CSV to this path.
    #[serde(default)]
    pub export: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.paths = vec![data.display().to_string()];
        }

        if let Some(mode) = args.mode {
            self.query.mode = mode;
        }
        if let Some(year) = args.year {
            self.query.year = Some(year.0);
        }
        if let Some(ref district) = args.district {
            self.query.district = Some(district.clone());
        }
        if let Some(ref subdistrict) = args.subdistrict {
            self.query.subdistrict = Some(subdistrict.clone());
        }
        if let Some(sex) = args.sex {
            self.query.sex = Some(sex.code().to_string());
        }
        if let Some(min_age) = args.min_age {
            self.query.min_age = min_age;
        }
        if let Some(max_age) = args.max_age {
            self.query.max_age = max_age;
        }
        if let Some(ref years) = args.years {
            self.query.years = years.iter().map(|y| y.0).collect();
        }
        if let Some(top_n) = args.top_n {
            self.query.top_n = top_n;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref export) = args.export {
            self.report.export = Some(export.display().to_string());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Candidate data source paths.
    pub fn data_paths(&self) -> Vec<PathBuf> {
        self.data.paths.iter().map(PathBuf::from).collect()
    }

    /// Build the selection described by the `[query]` section.
    pub fn selection(&self) -> Result<Selection> {
        let query = &self.query;

        match query.mode {
            Mode::Single => {
                if query.top_n == 0 {
                    bail!("top_n must be at least 1");
                }
                let sex = match query.sex.as_deref() {
                    Some(label) => Some(
                        Sex::parse_label(label)
                            .with_context(|| format!("Invalid sex filter: '{}'", label))?,
                    ),
                    None => None,
                };
                let age_range = AgeRange::new(query.min_age, query.max_age.min(AGE_CEILING))?;

                Ok(Selection::SingleYear(YearQuery {
                    year: query.year.map(Year),
                    district: non_empty(&query.district),
                    subdistrict: non_empty(&query.subdistrict),
                    sex,
                    age_range,
                    top_n: query.top_n,
                }))
            }
            Mode::Compare => {
                if let Some(year) = query.year {
                    bail!(
                        "year {} applies to single mode; use `years` to compare",
                        year
                    );
                }
                Ok(Selection::Compare(CompareQuery {
                    years: query.years.iter().copied().map(Year).collect(),
                }))
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "census_report.md");
        assert_eq!(config.query.max_age, 75);
        assert_eq!(config.query.top_n, 15);
        assert_eq!(config.data_paths()[1], PathBuf::from("data/DATA PROJECT.csv"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "samarinda.json"
format = "json"

[data]
paths = ["snapshots/"]

[query]
mode = "compare"
years = [2024, 2022]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "samarinda.json");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.data.paths, vec!["snapshots/"]);
        assert_eq!(config.query.mode, Mode::Compare);
        assert_eq!(config.query.top_n, 15);

        match config.selection().unwrap() {
            Selection::Compare(q) => assert_eq!(q.years, vec![Year(2024), Year(2022)]),
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn test_single_year_selection() {
        let mut config = Config::default();
        config.query.year = Some(2023);
        config.query.district = Some("  ".to_string());
        config.query.sex = Some("p".to_string());
        config.query.min_age = 15;
        config.query.max_age = 90;

        match config.selection().unwrap() {
            Selection::SingleYear(q) => {
                assert_eq!(q.year, Some(Year(2023)));
                assert_eq!(q.district, None);
                assert_eq!(q.sex, Some(Sex::Female));
                assert_eq!(q.age_range, AgeRange::new(15, 75).unwrap());
            }
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_selection() {
        let mut config = Config::default();
        config.query.sex = Some("x".to_string());
        assert!(config.selection().is_err());

        let mut config = Config::default();
        config.query.min_age = 50;
        config.query.max_age = 20;
        assert!(config.selection().is_err());
    }

    #[test]
    fn test_year_rejected_in_compare_mode_from_config() {
        let toml_content = r#"
[query]
mode = "compare"
"#;
        let mut config: Config = toml::from_str(toml_content).unwrap();
        let mut args = make_args();
        args.year = Some(Year(2023));
        config.merge_with_args(&args);

        assert!(args.validate().is_ok());
        let err = config.selection().unwrap_err();
        assert!(err.to_string().contains("single mode"));
    }

    #[test]
    fn test_merge_with_args() {
        let mut args = make_args();
        args.year = Some(Year(2022));
        args.district = Some("Samarinda Ulu".to_string());
        args.top_n = Some(10);
        args.format = Some(OutputFormat::Json);

        let mut config = Config::default();
        config.query.district = Some("Other".to_string());
        config.merge_with_args(&args);

        assert_eq!(config.query.year, Some(2022));
        assert_eq!(config.query.district.as_deref(), Some("Samarinda Ulu"));
        assert_eq!(config.query.top_n, 10);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.query.max_age, 75);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[query]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.query.top_n, 15);
    }
}
