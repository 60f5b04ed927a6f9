//! Selections and the views computed from them.
//!
//! A [`Selection`] is the explicit form of what the user picked: analysis
//! mode, year(s), region, and age range. Running it against a [`Dataset`]
//! produces every table and indicator the report renders.

use crate::analysis::{
    aggregate, compare_years, filter, metrics, pyramid, sex_breakdown, top_n, top_subdistricts,
    yearly_trend, AgeRange, ComparisonRow, Filter, MetricsResult, PyramidRow, SexBreakdown,
    TrendPoint,
};
use crate::dataset::Dataset;
use crate::error::{CensusError, Result};
use crate::models::{AggregateRow, Dimension, Record, Sex, Year};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Number of most recent years shown in the population sparkline.
pub const SPARKLINE_YEARS: usize = 3;

/// Single-year analysis parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct YearQuery {
    /// Year to analyze; the latest year when `None`.
    pub year: Option<Year>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub sex: Option<Sex>,
    pub age_range: AgeRange,
    /// Number of subdistricts in the ranking.
    pub top_n: usize,
}

impl Default for YearQuery {
    fn default() -> Self {
        Self {
            year: None,
            district: None,
            subdistrict: None,
            sex: None,
            age_range: AgeRange::default(),
            top_n: 15,
        }
    }
}

/// Multi-year comparison parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareQuery {
    /// Years to compare; every year in the dataset when empty.
    pub years: Vec<Year>,
}

/// What to compute.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    SingleYear(YearQuery),
    Compare(CompareQuery),
}

/// Everything shown for one year and region.
#[derive(Debug, Clone, Serialize)]
pub struct YearView {
    pub year: Year,
    pub filter: Filter,
    pub metrics: MetricsResult,
    /// Latest yearly totals of the whole dataset, oldest first.
    pub sparkline: Vec<(Year, u64)>,
    pub trend: Vec<TrendPoint>,
    pub pyramid: Vec<PyramidRow>,
    pub districts: Vec<SexBreakdown>,
    pub top_subdistricts: Vec<SexBreakdown>,
    /// District and subdistrict totals, largest first.
    pub subdistrict_table: Vec<AggregateRow>,
    #[serde(skip)]
    pub records: Vec<Record>,
}

impl YearView {
    /// Whether the filters matched nothing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything shown when comparing years.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub years: Vec<Year>,
    pub rows: Vec<ComparisonRow>,
    pub trend: Vec<TrendPoint>,
    #[serde(skip)]
    pub records: Vec<Record>,
}

/// Result of running a selection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum View {
    SingleYear(YearView),
    Compare(ComparisonView),
}

impl View {
    /// Records behind the view, for export.
    pub fn records(&self) -> &[Record] {
        match self {
            View::SingleYear(view) => &view.records,
            View::Compare(view) => &view.records,
        }
    }
}

/// Run a selection against a dataset.
pub fn run(dataset: &Dataset, selection: &Selection) -> Result<View> {
    match selection {
        Selection::SingleYear(query) => run_year(dataset, query).map(View::SingleYear),
        Selection::Compare(query) => Ok(View::Compare(run_compare(dataset, query))),
    }
}

/// Build the filter a year query applies.
pub fn year_filter(year: Year, query: &YearQuery) -> Filter {
    let mut f = Filter::all().with_year(year);
    if let Some(ref district) = query.district {
        f = f.with_district(district);
    }
    if let Some(ref subdistrict) = query.subdistrict {
        f = f.with_subdistrict(subdistrict);
    }
    if let Some(sex) = query.sex {
        f = f.with_sex(sex);
    }
    if !query.age_range.is_full() {
        f = f.with_age_range(query.age_range);
    }
    f
}

/// Compute the single-year view.
pub fn run_year(dataset: &Dataset, query: &YearQuery) -> Result<YearView> {
    let year = match query.year {
        Some(year) if dataset.contains_year(year) => year,
        Some(year) => {
            return Err(CensusError::InvalidSelection(format!(
                "year {} is not in the dataset (available: {})",
                year,
                dataset
                    .years()
                    .iter()
                    .map(Year::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
        None => dataset.latest_year().ok_or(CensusError::NoData)?,
    };

    let selection_filter = year_filter(year, query);
    if let Some(ref district) = selection_filter.district {
        if !dataset.districts(Some(year)).contains(district) {
            warn!("District '{}' has no records in {}", district, year);
        }
    }
    if let Some(ref subdistrict) = selection_filter.subdistrict {
        let known = dataset.subdistricts(Some(year), selection_filter.district.as_deref());
        if !known.contains(subdistrict) {
            warn!("Subdistrict '{}' has no records in {}", subdistrict, year);
        }
    }

    let records = filter(dataset.records(), &selection_filter);
    info!("Selection for {} matched {} records", year, records.len());
    debug!("Filter: {:?}", selection_filter);

    let trend = yearly_trend(dataset.records());
    let sparkline = trend
        .iter()
        .skip(trend.len().saturating_sub(SPARKLINE_YEARS))
        .map(|p| (p.year, p.total))
        .collect();

    let subdistricts = aggregate(
        &records,
        &[Dimension::District, Dimension::Subdistrict],
        &Filter::all(),
    );

    Ok(YearView {
        year,
        metrics: metrics(&records, dataset.records(), year),
        sparkline,
        trend,
        pyramid: pyramid(&records),
        districts: sex_breakdown(&records, Dimension::District),
        top_subdistricts: top_subdistricts(&records, query.top_n),
        subdistrict_table: top_n(&subdistricts, subdistricts.len()),
        filter: selection_filter,
        records,
    })
}

/// Compute the multi-year comparison view.
pub fn run_compare(dataset: &Dataset, query: &CompareQuery) -> ComparisonView {
    let years = if query.years.is_empty() {
        let mut all = dataset.years();
        all.reverse();
        all
    } else {
        query.years.clone()
    };

    let records: Vec<Record> = dataset
        .records()
        .iter()
        .filter(|r| years.contains(&r.year))
        .cloned()
        .collect();

    ComparisonView {
        rows: compare_years(dataset.records(), &years),
        trend: yearly_trend(&records),
        years,
        records,
    }
}
