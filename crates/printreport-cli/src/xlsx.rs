//! Spreadsheet rendering of a report grid
//!
//! Layout:
//!   row 1  Daily | Weekly | Monthly | Users (each merged over two columns), Total Pages (I1:I2)
//!   row 2  Period Pages | Period Pages | Period Pages | Username Pages
//!   row 3+ the grid, with the grand total in I3

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use printreport_core::{DateRange, GridCell, Panel, ReportGrid};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};

use crate::config::Settings;

const FILE_DATE_FORMAT: &str = "%d-%m-%Y";

const TITLE_FILL: &str = "#807D7D";
const SUBTITLE_FILL: &str = "#D3D3D3";

const WIDE_COLUMN_WIDTH: f64 = 170.0 / 7.4;
const NARROW_COLUMN_WIDTH: f64 = 125.0 / 7.4;
const WIDE_COLUMNS: [u16; 2] = [2, 4];

const TOTAL_COLUMN: u16 = 8;
const COLUMN_COUNT: u16 = TOTAL_COLUMN + 1;
const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Row 1: bold on the dark fill.
    Title,
    /// Row 2: bold on the light fill.
    Subtitle,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

/// One cell (or merged range) of the sheet, zero-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCell {
    pub row: u32,
    pub col: u16,
    /// Bottom-right corner of a merged range; `None` for a single cell.
    pub merge_to: Option<(u32, u16)>,
    pub value: CellValue,
    pub style: CellStyle,
}

impl PlannedCell {
    fn single(row: u32, col: u16, value: CellValue, style: CellStyle) -> Self {
        Self {
            row,
            col,
            merge_to: None,
            value,
            style,
        }
    }

    fn merged(row: u32, col: u16, to: (u32, u16), title: &str) -> Self {
        Self {
            row,
            col,
            merge_to: Some(to),
            value: CellValue::Text(title.to_string()),
            style: CellStyle::Title,
        }
    }
}

pub fn panel_title(panel: Panel) -> &'static str {
    match panel {
        Panel::Daily => "Daily",
        Panel::Weekly => "Weekly",
        Panel::Monthly => "Monthly",
        Panel::Users => "Users",
    }
}

pub fn panel_headers(panel: Panel) -> [&'static str; 2] {
    match panel {
        Panel::Users => ["Username", "Pages"],
        _ => ["Period", "Pages"],
    }
}

pub fn column_width(col: u16) -> f64 {
    if WIDE_COLUMNS.contains(&col) {
        WIDE_COLUMN_WIDTH
    } else {
        NARROW_COLUMN_WIDTH
    }
}

/// `<input>_<DD-MM-YYYY>_<DD-MM-YYYY>.xlsx`
pub fn report_file_name(input_name: &str, range: &DateRange) -> String {
    format!(
        "{}_{}_{}.xlsx",
        input_name,
        format_file_date(range.start()),
        format_file_date(range.end())
    )
}

fn format_file_date(date: NaiveDate) -> String {
    date.format(FILE_DATE_FORMAT).to_string()
}

/// Every cell the sheet will contain, headers first.
pub fn plan_cells(grid: &ReportGrid, anonymous_label: &str) -> Vec<PlannedCell> {
    let mut cells = Vec::new();

    for panel in Panel::ALL {
        let col = panel.first_column() as u16;
        cells.push(PlannedCell::merged(0, col, (0, col + 1), panel_title(panel)));

        for (offset, header) in panel_headers(panel).into_iter().enumerate() {
            cells.push(PlannedCell::single(
                1,
                col + offset as u16,
                CellValue::Text(header.to_string()),
                CellStyle::Subtitle,
            ));
        }
    }
    cells.push(PlannedCell::merged(
        0,
        TOTAL_COLUMN,
        (1, TOTAL_COLUMN),
        "Total Pages",
    ));

    // The total sits in the first data row even when every panel is empty.
    let height = grid.height().max(1);
    for offset in 0..height {
        let row = FIRST_DATA_ROW + offset as u32;
        let grid_row = grid.rows.get(offset);

        for col in 0..TOTAL_COLUMN {
            let value = match grid_row.and_then(|cells| cells[col as usize].as_ref()) {
                Some(GridCell::Text(text)) => CellValue::Text(text.clone()),
                Some(GridCell::Anonymous) => CellValue::Text(anonymous_label.to_string()),
                Some(GridCell::Pages(pages)) => CellValue::Number(*pages as f64),
                None => CellValue::Blank,
            };
            cells.push(PlannedCell::single(row, col, value, CellStyle::Body));
        }

        let total = if offset == 0 {
            CellValue::Number(grid.total_pages as f64)
        } else {
            CellValue::Blank
        };
        cells.push(PlannedCell::single(row, TOTAL_COLUMN, total, CellStyle::Body));
    }

    cells
}

pub fn build_workbook(grid: &ReportGrid, settings: &Settings) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(&settings.sheet_name)
        .with_context(|| format!("Invalid sheet name '{}'", settings.sheet_name))?;

    let title = centered().set_bold().set_background_color(TITLE_FILL);
    let subtitle = centered().set_bold().set_background_color(SUBTITLE_FILL);
    let body = centered();

    for cell in plan_cells(grid, &settings.anonymous_label) {
        let format = match cell.style {
            CellStyle::Title => &title,
            CellStyle::Subtitle => &subtitle,
            CellStyle::Body => &body,
        };

        match (cell.merge_to, &cell.value) {
            (Some((last_row, last_col)), CellValue::Text(text)) => {
                sheet.merge_range(cell.row, cell.col, last_row, last_col, text, format)?;
            }
            (_, CellValue::Text(text)) => {
                sheet.write_string_with_format(cell.row, cell.col, text, format)?;
            }
            (_, CellValue::Number(number)) => {
                sheet.write_number_with_format(cell.row, cell.col, *number, format)?;
            }
            (_, CellValue::Blank) => {
                sheet.write_blank(cell.row, cell.col, format)?;
            }
        }
    }

    for col in 0..COLUMN_COUNT {
        sheet.set_column_width(col, column_width(col))?;
    }

    Ok(workbook)
}

/// Render and save the workbook into `dir`, returning the written path.
pub fn write_report(
    grid: &ReportGrid,
    settings: &Settings,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let path = dir.join(file_name);
    let mut workbook = build_workbook(grid, settings)?;
    workbook
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = grid.height(), "wrote report workbook");
    Ok(path)
}

fn centered() -> Format {
    Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use printreport_core::{PeriodPages, Report, UserPages};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(label: &str, pages: u64) -> PeriodPages {
        PeriodPages {
            period: label.to_string(),
            pages,
        }
    }

    fn user(name: Option<&str>, pages: u64) -> UserPages {
        UserPages {
            user_name: name.map(str::to_string),
            pages,
        }
    }

    fn sample_grid() -> ReportGrid {
        Report {
            daily: vec![period("01/01/2024", 8)],
            weekly: vec![period("01/01/2024 - 07/01/2024", 8)],
            monthly: vec![period("01/01/2024 - 31/01/2024", 8)],
            users: vec![user(Some("alice"), 5), user(None, 3)],
            total_pages: 8,
        }
        .grid()
    }

    /// A1-style reference for a zero-indexed cell; columns stay below Z here.
    fn cell_ref(row: u32, col: u16) -> String {
        let letter = char::from(b'A' + col as u8);
        format!("{}{}", letter, row + 1)
    }

    fn find<'a>(cells: &'a [PlannedCell], reference: &str) -> &'a PlannedCell {
        cells
            .iter()
            .find(|c| cell_ref(c.row, c.col) == reference)
            .unwrap_or_else(|| panic!("no cell at {}", reference))
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn test_report_file_name() {
        let range = DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 8)).unwrap();
        assert_eq!(
            report_file_name("printlog", &range),
            "printlog_01-01-2024_08-01-2024.xlsx"
        );
    }

    #[test]
    fn test_panel_titles_and_headers() {
        let titles: Vec<&str> = Panel::ALL.iter().map(|p| panel_title(*p)).collect();
        assert_eq!(titles, vec!["Daily", "Weekly", "Monthly", "Users"]);
        assert_eq!(panel_headers(Panel::Weekly), ["Period", "Pages"]);
        assert_eq!(panel_headers(Panel::Users), ["Username", "Pages"]);
    }

    #[test]
    fn test_plan_title_merges() {
        let cells = plan_cells(&sample_grid(), "Unknown");

        let merges: Vec<(String, String, &CellValue)> = cells
            .iter()
            .filter_map(|c| {
                let (last_row, last_col) = c.merge_to?;
                Some((cell_ref(c.row, c.col), cell_ref(last_row, last_col), &c.value))
            })
            .collect();

        let expected = [
            ("A1", "B1", "Daily"),
            ("C1", "D1", "Weekly"),
            ("E1", "F1", "Monthly"),
            ("G1", "H1", "Users"),
            ("I1", "I2", "Total Pages"),
        ];
        assert_eq!(merges.len(), expected.len());
        for ((first, last, value), (want_first, want_last, want_title)) in
            merges.iter().zip(expected)
        {
            assert_eq!(first, want_first);
            assert_eq!(last, want_last);
            assert_eq!(*value, &text(want_title));
        }
        assert!(cells
            .iter()
            .filter(|c| c.merge_to.is_some())
            .all(|c| c.style == CellStyle::Title));
    }

    #[test]
    fn test_plan_subtitle_row() {
        let cells = plan_cells(&sample_grid(), "Unknown");

        let row_two: Vec<(String, &CellValue)> = cells
            .iter()
            .filter(|c| c.row == 1)
            .map(|c| (cell_ref(c.row, c.col), &c.value))
            .collect();
        let expected = [
            ("A2", "Period"),
            ("B2", "Pages"),
            ("C2", "Period"),
            ("D2", "Pages"),
            ("E2", "Period"),
            ("F2", "Pages"),
            ("G2", "Username"),
            ("H2", "Pages"),
        ];
        assert_eq!(row_two.len(), expected.len());
        for ((reference, value), (want_ref, want_text)) in row_two.iter().zip(expected) {
            assert_eq!(reference, want_ref);
            assert_eq!(*value, &text(want_text));
        }
        assert!(cells
            .iter()
            .filter(|c| c.row == 1)
            .all(|c| c.style == CellStyle::Subtitle));
    }

    #[test]
    fn test_plan_grid_and_total_cells() {
        let cells = plan_cells(&sample_grid(), "Guest");

        assert_eq!(find(&cells, "I3").value, CellValue::Number(8.0));
        assert_eq!(find(&cells, "I4").value, CellValue::Blank);
        assert_eq!(find(&cells, "A3").value, text("01/01/2024"));
        assert_eq!(find(&cells, "B3").value, CellValue::Number(8.0));
        assert_eq!(find(&cells, "G3").value, text("alice"));
        assert_eq!(find(&cells, "G4").value, text("Guest"));
        assert_eq!(find(&cells, "H4").value, CellValue::Number(3.0));
        assert_eq!(find(&cells, "A4").value, CellValue::Blank);
        assert!(cells
            .iter()
            .filter(|c| c.row >= FIRST_DATA_ROW)
            .all(|c| c.style == CellStyle::Body));
    }

    #[test]
    fn test_plan_empty_grid_still_has_total_row() {
        let cells = plan_cells(&Report::default().grid(), "Unknown");

        assert_eq!(find(&cells, "I3").value, CellValue::Number(0.0));
        assert_eq!(find(&cells, "A3").value, CellValue::Blank);
        assert!(cells.iter().all(|c| c.row <= FIRST_DATA_ROW));
    }

    #[test]
    fn test_column_widths() {
        assert_eq!(column_width(2), 170.0 / 7.4);
        assert_eq!(column_width(4), 170.0 / 7.4);
        for col in [0, 1, 3, 5, 6, 7, 8] {
            assert_eq!(column_width(col), 125.0 / 7.4);
        }
    }

    #[test]
    fn test_build_workbook_produces_xlsx_bytes() {
        let mut workbook = build_workbook(&sample_grid(), &Settings::default()).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_build_workbook_rejects_bad_sheet_name() {
        let settings = Settings {
            sheet_name: "bad/name".to_string(),
            ..Settings::default()
        };
        assert!(build_workbook(&sample_grid(), &settings).is_err());
    }

    #[test]
    fn test_write_report_creates_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("reports");

        let path = write_report(&sample_grid(), &Settings::default(), &dir, "r.xlsx").unwrap();
        assert!(path.exists());
        assert_eq!(path, dir.join("r.xlsx"));
    }
}
