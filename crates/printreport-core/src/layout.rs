//! Positional layout of a report for tabular renderers
//!
//! The four panels are laid side by side, two columns each. Row `i` shows the
//! `i`-th entry of every panel; entries on the same row are unrelated. Panels
//! shorter than the longest one leave their cells blank.

use crate::{PeriodPages, Report, UserPages};

pub const GRID_COLUMNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Daily,
    Weekly,
    Monthly,
    Users,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Daily, Panel::Weekly, Panel::Monthly, Panel::Users];

    /// Index of the panel's label column; its pages column follows.
    pub fn first_column(self) -> usize {
        match self {
            Panel::Daily => 0,
            Panel::Weekly => 2,
            Panel::Monthly => 4,
            Panel::Users => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    Text(String),
    Pages(u64),
    /// Label of the anonymous user bucket; the renderer picks the wording.
    Anonymous,
}

pub type GridRow = [Option<GridCell>; GRID_COLUMNS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGrid {
    pub rows: Vec<GridRow>,
    pub total_pages: u64,
}

impl ReportGrid {
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

pub fn assemble_grid(report: &Report) -> ReportGrid {
    let height = [
        report.daily.len(),
        report.weekly.len(),
        report.monthly.len(),
        report.users.len(),
    ]
    .into_iter()
    .max()
    .unwrap_or(0);

    let mut rows: Vec<GridRow> = (0..height).map(|_| Default::default()).collect();

    fill_period_panel(&mut rows, Panel::Daily, &report.daily);
    fill_period_panel(&mut rows, Panel::Weekly, &report.weekly);
    fill_period_panel(&mut rows, Panel::Monthly, &report.monthly);
    fill_user_panel(&mut rows, &report.users);

    ReportGrid {
        rows,
        total_pages: report.total_pages,
    }
}

fn fill_period_panel(rows: &mut [GridRow], panel: Panel, entries: &[PeriodPages]) {
    let col = panel.first_column();
    for (row, entry) in rows.iter_mut().zip(entries) {
        row[col] = Some(GridCell::Text(entry.period.clone()));
        row[col + 1] = Some(GridCell::Pages(entry.pages));
    }
}

fn fill_user_panel(rows: &mut [GridRow], entries: &[UserPages]) {
    let col = Panel::Users.first_column();
    for (row, entry) in rows.iter_mut().zip(entries) {
        row[col] = Some(match &entry.user_name {
            Some(name) => GridCell::Text(name.clone()),
            None => GridCell::Anonymous,
        });
        row[col + 1] = Some(GridCell::Pages(entry.pages));
    }
}
