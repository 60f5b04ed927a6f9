//! Markdown and JSON report generation.
//!
//! This module renders a computed [`View`] as a Markdown document or JSON.
//! Unavailable indicators are rendered as `N/A`, and a selection that
//! matched nothing gets an explicit empty-state message.

use crate::analysis::{ComparisonRow, MetricsResult, PyramidRow, SexBreakdown, TrendPoint};
use crate::dataset::Dataset;
use crate::models::{Metric, AGE_CEILING};
use crate::query::{ComparisonView, View, YearView};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Where the snapshot was read from.
    pub source: String,
    /// Checksum of the snapshot content.
    pub source_checksum: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Raw rows read from the snapshot.
    pub raw_rows: usize,
    /// Canonical records after normalization.
    pub records: usize,
}

impl ReportMetadata {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            source: dataset.origin.display().to_string(),
            source_checksum: dataset.source_id.clone(),
            generated_at: Utc::now(),
            raw_rows: dataset.raw_rows,
            records: dataset.len(),
        }
    }
}

/// A complete census report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub view: View,
}

/// Format a count with thousands separators.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_signed(n: i64) -> String {
    let sign = if n < 0 { "-" } else { "+" };
    format!("{}{}", sign, format_number(n.unsigned_abs()))
}

/// Render an indicator, or `N/A` when it is unavailable.
pub fn format_metric<T>(metric: &Metric<T>, render: impl Fn(&T) -> String) -> String {
    match metric {
        Metric::Available(value) => render(value),
        Metric::Unavailable(_) => "N/A".to_string(),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Population Census Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    match &report.view {
        View::SingleYear(view) => output.push_str(&generate_year_sections(view)),
        View::Compare(view) => output.push_str(&generate_comparison_sections(view)),
    }

    output.push_str(&generate_footer());
    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Checksum:** `{}`\n", metadata.source_checksum));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records:** {} ({} raw rows)\n\n",
        format_number(metadata.records as u64),
        format_number(metadata.raw_rows as u64)
    ));

    section
}

fn generate_year_sections(view: &YearView) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Year {}\n\n", view.year));
    out.push_str(&format!(
        "- **District:** {}\n",
        view.filter.district.as_deref().unwrap_or("All districts")
    ));
    out.push_str(&format!(
        "- **Subdistrict:** {}\n",
        view.filter.subdistrict.as_deref().unwrap_or("All subdistricts")
    ));
    if let Some(sex) = view.filter.sex {
        out.push_str(&format!("- **Sex:** {}\n", sex));
    }
    out.push_str(&format!(
        "- **Ages:** {}\n\n",
        view.filter.age_range.unwrap_or_default()
    ));

    if view.is_empty() {
        out.push_str("## Summary\n\n");
        out.push_str("No records match the current selection.\n\n");
        return out;
    }

    out.push_str(&generate_summary_section(&view.metrics));
    out.push_str(&generate_trend_section(&view.trend));
    out.push_str(&generate_pyramid_section(&view.pyramid));
    out.push_str(&generate_breakdown_section(
        "Population by District",
        "District",
        &view.districts,
    ));
    out.push_str(&generate_breakdown_section(
        &format!("Top {} Subdistricts", view.top_subdistricts.len()),
        "Subdistrict",
        &view.top_subdistricts,
    ));

    out.push_str("## Subdistrict Table\n\n");
    out.push_str("| District | Subdistrict | Population |\n");
    out.push_str("|:---|:---|---:|\n");
    for row in &view.subdistrict_table {
        let names: Vec<String> = row.key.iter().map(|v| v.to_string()).collect();
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            names.first().map(String::as_str).unwrap_or(""),
            names.get(1).map(String::as_str).unwrap_or(""),
            format_number(row.count)
        ));
    }
    out.push('\n');

    out
}

/// Generate the indicator summary.
fn generate_summary_section(metrics: &MetricsResult) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Indicator | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Total population | {} |\n",
        format_number(metrics.total_population)
    ));
    section.push_str(&format!(
        "| Growth vs {} | {} ({}) |\n",
        metrics.selected_year.previous(),
        format_metric(&metrics.growth_pct, |p| format!("{:+.2}%", p)),
        format_metric(&metrics.growth, |g| format!("{} people", format_signed(*g)))
    ));
    section.push_str(&format!(
        "| Productive age (15-64) | {} ({}) |\n",
        format_number(metrics.productive_population),
        format_metric(&metrics.productive_share, |s| format!("{:.1}%", s * 100.0))
    ));
    section.push_str(&format!(
        "| Dependency ratio | {} |\n",
        format_metric(&metrics.dependency_ratio, |r| format!("{:.1} per 100", r))
    ));
    section.push_str(&format!(
        "| Largest district | {} |\n",
        format_metric(&metrics.largest_district, |d| format!(
            "{} ({})",
            d.district,
            format_number(d.population)
        ))
    ));
    section.push_str(&format!(
        "| Sex ratio | {} |\n\n",
        format_metric(&metrics.sex_ratio, |r| format!("{:.2} males per 100 females", r))
    ));

    if !metrics.top_districts.is_empty() {
        section.push_str("### Largest Districts\n\n");
        for (i, district) in metrics.top_districts.iter().enumerate() {
            section.push_str(&format!(
                "{}. {} ({})\n",
                i + 1,
                district.district,
                format_number(district.population)
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_trend_section(trend: &[TrendPoint]) -> String {
    let mut section = String::new();

    section.push_str("## Population Trend\n\n");
    section.push_str("| Year | Male | Female | Total |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for point in trend {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            point.year,
            format_number(point.male),
            format_number(point.female),
            format_number(point.total)
        ));
    }
    section.push('\n');

    section
}

fn generate_pyramid_section(pyramid: &[PyramidRow]) -> String {
    let mut section = String::new();

    section.push_str("## Population Pyramid\n\n");
    section.push_str("| Age Group | Male | Female |\n");
    section.push_str("|:---|---:|---:|\n");
    // Oldest group on top, as the pyramid is drawn.
    for row in pyramid.iter().rev() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.age_group,
            format_number(row.male),
            format_number(row.female)
        ));
    }
    section.push('\n');

    section
}

fn generate_breakdown_section(title: &str, label: &str, rows: &[SexBreakdown]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("| {} | Male | Female | Total |\n", label));
    section.push_str("|:---|---:|---:|---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.key,
            format_number(row.male),
            format_number(row.female),
            format_number(row.total)
        ));
    }
    section.push('\n');

    section
}

fn generate_comparison_sections(view: &ComparisonView) -> String {
    let mut out = String::new();

    out.push_str("## Year Comparison\n\n");

    if view.rows.is_empty() {
        out.push_str("None of the selected years have records.\n\n");
        return out;
    }

    out.push_str(&generate_comparison_table(&view.rows));
    out.push_str(&generate_trend_section(&view.trend));
    out
}

fn generate_comparison_table(rows: &[ComparisonRow]) -> String {
    let mut table = String::new();

    table.push_str("| Year | Total | Male | Female | Districts | Subdistricts | Growth (%) |\n");
    table.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            row.year,
            format_number(row.total),
            format_number(row.male),
            format_number(row.female),
            row.districts,
            row.subdistricts,
            format_metric(&row.change_pct, |p| format!("{:+.1}", p))
        ));
    }
    table.push('\n');

    table
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Ages {} and above are grouped into a single {}+ category.*\n",
        AGE_CEILING, AGE_CEILING
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, Sex, Year};
    use crate::query::{run_compare, run_year, CompareQuery, YearQuery};

    fn dataset() -> Dataset {
        let record = |year: i32, district: &str, sex: Sex, age: u8, count: u64| Record {
            year: Year(year),
            district: district.to_string(),
            subdistrict: "Air Putih".to_string(),
            sex,
            age,
            count,
        };
        Dataset::from_records(
            "abc123",
            vec![
                record(2022, "Ulu", Sex::Male, 30, 1000),
                record(2022, "Ulu", Sex::Female, 30, 1000),
                record(2023, "Ulu", Sex::Male, 30, 1200),
                record(2023, "Ulu", Sex::Female, 75, 1000),
            ],
        )
    }

    fn report(view: View) -> Report {
        Report {
            metadata: ReportMetadata::for_dataset(&dataset()),
            view,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_signed(-1500), "-1,500");
        assert_eq!(format_signed(20), "+20");
    }

    #[test]
    fn test_single_year_markdown() {
        let view = run_year(&dataset(), &YearQuery::default()).unwrap();
        let markdown = generate_markdown_report(&report(View::SingleYear(view)));

        assert!(markdown.contains("# Population Census Report"));
        assert!(markdown.contains("`abc123`"));
        assert!(markdown.contains("## Year 2023"));
        assert!(markdown.contains("| Total population | 2,200 |"));
        assert!(markdown.contains("+10.00% (+200 people)"));
        assert!(markdown.contains("## Population Pyramid"));
        assert!(markdown.contains("| 75+ | 0 | 1,000 |"));
        assert!(markdown.contains("Ages 75 and above"));
    }

    #[test]
    fn test_unavailable_growth_renders_na() {
        let query = YearQuery {
            year: Some(Year(2022)),
            ..YearQuery::default()
        };
        let view = run_year(&dataset(), &query).unwrap();
        let markdown = generate_markdown_report(&report(View::SingleYear(view)));

        assert!(markdown.contains("| Growth vs 2021 | N/A (N/A) |"));
    }

    #[test]
    fn test_empty_selection_message() {
        let query = YearQuery {
            district: Some("Nowhere".to_string()),
            ..YearQuery::default()
        };
        let view = run_year(&dataset(), &query).unwrap();
        let markdown = generate_markdown_report(&report(View::SingleYear(view)));

        assert!(markdown.contains("No records match the current selection."));
        assert!(!markdown.contains("## Population Pyramid"));
    }

    #[test]
    fn test_comparison_markdown() {
        let view = run_compare(&dataset(), &CompareQuery::default());
        let markdown = generate_markdown_report(&report(View::Compare(view)));

        assert!(markdown.contains("## Year Comparison"));
        assert!(markdown.contains("| 2022 | 2,000 | 1,000 | 1,000 | 1 | 1 | N/A |"));
        assert!(markdown.contains("| 2023 | 2,200 | 1,200 | 1,000 | 1 | 1 | +10.0 |"));
    }

    #[test]
    fn test_generate_json_report() {
        let view = run_year(&dataset(), &YearQuery::default()).unwrap();
        let json = generate_json_report(&report(View::SingleYear(view))).unwrap();

        assert!(json.contains("\"mode\": \"single_year\""));
        assert!(json.contains("\"source_checksum\": \"abc123\""));
        assert!(json.contains("\"growth\""));
        assert!(!json.contains("\"records\": ["));
    }
}
