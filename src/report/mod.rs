//! Report rendering and data export.

pub mod export;
pub mod generator;

pub use export::{export_records, write_aggregate, write_records};
pub use generator::{
    format_metric, format_number, generate_json_report, generate_markdown_report, Report,
    ReportMetadata,
};
