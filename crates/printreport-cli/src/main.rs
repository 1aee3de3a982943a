mod config;
mod xlsx;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use printreport_core::{
    ingest, DatasetHandle, DatasetStore, DateRange, GridCell, Panel, Report, ReportError,
};

use config::Settings;

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser)]
#[command(name = "printreport")]
#[command(author, version, about = "Print log page-count reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable debug logging on stderr")]
    debug: bool,

    #[arg(long, global = true, help = "Path to settings.toml")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Export a print log report to an xlsx workbook")]
    Export {
        #[arg(help = "Print log CSV file")]
        input: PathBuf,
        #[arg(long, value_parser = parse_form_date, help = "Start date (YYYY-MM-DD)")]
        start: NaiveDate,
        #[arg(long, value_parser = parse_form_date, help = "End date (YYYY-MM-DD)")]
        end: NaiveDate,
        #[arg(short, long, help = "Directory to write the workbook into")]
        output: Option<PathBuf>,
    },
    #[command(about = "Show a print log report in the terminal")]
    Summary {
        #[arg(help = "Print log CSV file")]
        input: PathBuf,
        #[arg(long, value_parser = parse_form_date, help = "Start date (YYYY-MM-DD)")]
        start: NaiveDate,
        #[arg(long, value_parser = parse_form_date, help = "End date (YYYY-MM-DD)")]
        end: NaiveDate,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            input,
            start,
            end,
            output,
        } => run_export_command(&input, start, end, output.as_deref(), &settings),
        Commands::Summary {
            input,
            start,
            end,
            json,
        } => run_summary_command(&input, start, end, json, &settings),
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if debug {
        Some(EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().ok()
    };

    if let Some(filter) = filter {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn parse_form_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), FORM_DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD format", value))
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    DateRange::new(start, end).map_err(|e| match e {
        ReportError::InvalidRange { .. } => anyhow::anyhow!("Start date must be before end date"),
        other => other.into(),
    })
}

fn upload(store: &DatasetStore, input: &Path) -> Result<DatasetHandle> {
    let dataset = ingest::load_dataset_from_path(input)
        .with_context(|| format!("Failed to load data from {}", input.display()))?;

    eprintln!("  File Name :  {}", dataset.name);
    if dataset.stats.rows_dropped > 0 {
        eprintln!(
            "  {}",
            format!(
                "Skipped {} of {} rows with unreadable dates",
                dataset.stats.rows_dropped, dataset.stats.rows_read
            )
            .yellow()
        );
    }
    eprintln!("  {}", "Upload Successful!".green());

    Ok(store.insert(dataset))
}

fn export_report(
    store: &DatasetStore,
    handle: &DatasetHandle,
    range: &DateRange,
) -> Result<Report> {
    store
        .export(handle, range)
        .context("Failed to export data")
}

fn run_export_command(
    input: &Path,
    start: NaiveDate,
    end: NaiveDate,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let range = validate_range(start, end)?;

    let store = DatasetStore::new();
    let handle = upload(&store, input)?;
    let report = export_report(&store, &handle, &range)?;

    let dataset = store.get(&handle).ok_or(ReportError::NoDataset)?;
    let file_name = xlsx::report_file_name(&dataset.name, &range);
    let dir = settings.output_dir(output);
    let path = xlsx::write_report(&report.grid(), settings, &dir, &file_name)?;

    eprintln!(
        "  {} {} ({} pages)",
        "Report written:".green(),
        path.display(),
        report.total_pages
    );
    Ok(())
}

fn run_summary_command(
    input: &Path,
    start: NaiveDate,
    end: NaiveDate,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    let range = validate_range(start, end)?;

    let store = DatasetStore::new();
    let handle = upload(&store, input)?;
    let report = export_report(&store, &handle, &range)?;
    let dataset = store.get(&handle).ok_or(ReportError::NoDataset)?;

    if json {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SummaryJson<'a> {
            input_name: &'a str,
            start: String,
            end: String,
            rows_read: usize,
            rows_dropped: usize,
            report: &'a Report,
        }

        let output = SummaryJson {
            input_name: &dataset.name,
            start: range.start().format(FORM_DATE_FORMAT).to_string(),
            end: range.end().format(FORM_DATE_FORMAT).to_string(),
            rows_read: dataset.stats.rows_read,
            rows_dropped: dataset.stats.rows_dropped,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render_table(&report, &settings.anonymous_label));
        println!("\nTotal Pages: {}", report.total_pages);
    }

    Ok(())
}

fn render_table(report: &Report, anonymous_label: &str) -> comfy_table::Table {
    use comfy_table::{CellAlignment, ContentArrangement, Table};

    let mut header = Vec::with_capacity(8);
    for panel in Panel::ALL {
        let [label, pages] = xlsx::panel_headers(panel);
        header.push(format!("{} {}", xlsx::panel_title(panel), label));
        header.push(pages.to_string());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);

    for row in report.grid().rows {
        table.add_row(row.iter().map(|cell| match cell {
            Some(GridCell::Text(text)) => text.clone(),
            Some(GridCell::Anonymous) => anonymous_label.to_string(),
            Some(GridCell::Pages(pages)) => pages.to_string(),
            None => String::new(),
        }));
    }

    for column in table.column_iter_mut() {
        column.set_cell_alignment(CellAlignment::Center);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use printreport_core::{PeriodPages, UserPages};

    #[test]
    fn test_parse_form_date() {
        assert_eq!(
            parse_form_date("2024-01-08").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert!(parse_form_date("08/01/2024").is_err());
        assert!(parse_form_date("2024-02-30").is_err());
    }

    #[test]
    fn test_validate_range_message() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = validate_range(start, end).unwrap_err();
        assert_eq!(err.to_string(), "Start date must be before end date");
    }

    #[test]
    fn test_render_table_blanks_and_anonymous_label() {
        let day = |label: &str, pages: u64| PeriodPages {
            period: label.to_string(),
            pages,
        };
        let report = Report {
            daily: vec![day("01/01/2024", 2), day("02/01/2024", 1)],
            users: vec![UserPages {
                user_name: None,
                pages: 3,
            }],
            total_pages: 3,
            ..Report::default()
        };

        let rendered = render_table(&report, "Guest").to_string();
        assert!(rendered.contains("Period"));
        assert!(rendered.contains("Username"));
        assert!(rendered.contains("02/01/2024"));
        assert!(rendered.contains("Guest"));
    }
}
