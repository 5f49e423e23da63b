//! Dataset store: a cleaned hotel-bookings CSV loaded into an immutable,
//! column-typed [`Snapshot`].
//!
//! Columns are typed once at load: a column whose every cell parses as a
//! number becomes [`Column::Numeric`], anything else stays [`Column::Text`].
//! When arrival dates can be determined, the derived columns
//! `arrival_year`, `arrival_month` and `arrival_day` are added.
//!
//! # Example
//!
//! ```rust,ignore
//! use hotel_rag::Snapshot;
//!
//! let snapshot = Snapshot::load("cleaned_hotel_bookings.csv")?;
//! println!("{} bookings", snapshot.row_count());
//! let total = snapshot.sum("revenue");
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::LoadError;

/// Well-known column names.
pub mod columns {
    pub const ARRIVAL_DATE: &str = "arrival_date";
    pub const ARRIVAL_YEAR: &str = "arrival_year";
    pub const ARRIVAL_MONTH: &str = "arrival_month";
    pub const ARRIVAL_DAY: &str = "arrival_day";

    /// Split arrival columns of the raw hotel-bookings export.
    pub const ARRIVAL_DATE_YEAR: &str = "arrival_date_year";
    pub const ARRIVAL_DATE_MONTH: &str = "arrival_date_month";
    pub const ARRIVAL_DATE_DAY_OF_MONTH: &str = "arrival_date_day_of_month";

    pub const REVENUE: &str = "revenue";
    pub const ADULTS: &str = "adults";
    pub const CHILDREN: &str = "children";
    pub const BABIES: &str = "babies";
    pub const COUNTRY: &str = "country";
    pub const HOTEL: &str = "hotel";
    pub const ADR: &str = "adr";
    pub const IS_CANCELED: &str = "is_canceled";
    pub const RESERVATION_STATUS_DATE: &str = "reservation_status_date";
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A typed column of cell values, one per row. Only finite numbers count as
/// numeric, so `NaN` or `inf` cells keep a column textual.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Every cell parsed as a number.
    Numeric(Vec<f64>),
    /// At least one cell was not numeric.
    Text(Vec<String>),
}

impl Column {
    fn from_cells(cells: Vec<String>) -> Self {
        let parsed: Option<Vec<f64>> = cells
            .iter()
            .map(|cell| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        match parsed {
            Some(values) => Column::Numeric(values),
            None => Column::Text(cells),
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    /// Whether the column holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the cell at `row` for display.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(values) => values.get(row).map(|v| format_number(*v)),
            Column::Text(values) => values.get(row).cloned(),
        }
    }
}

/// An immutable, column-oriented view of the booking dataset.
///
/// Built once by [`Snapshot::load`] and never mutated afterwards; share it
/// behind an `Arc` for concurrent readers.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    column_names: Vec<String>,
    columns: HashMap<String, Column>,
    arrival_dates: Option<Vec<NaiveDate>>,
    row_count: usize,
}

impl Snapshot {
    /// Load a cleaned CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be opened, and the errors
    /// of [`Snapshot::from_reader`] otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let snapshot = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = snapshot.row_count,
            columns = snapshot.column_names.len(),
            "loaded dataset"
        );
        Ok(snapshot)
    }

    /// Parse CSV content with a header row.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Csv`] for malformed CSV (including ragged rows)
    /// - [`LoadError::Empty`] if there is no header
    /// - [`LoadError::InvalidDate`] if an arrival date cannot be parsed
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> =
            csv_reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::Empty);
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;
        for record in csv_reader.records() {
            let record = record?;
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
            row_count += 1;
        }

        let mut column_names = Vec::with_capacity(headers.len() + 3);
        let mut columns = HashMap::with_capacity(headers.len() + 3);
        for (name, values) in headers.into_iter().zip(cells) {
            if columns.contains_key(&name) {
                warn!(column = %name, "duplicate column ignored");
                continue;
            }
            columns.insert(name.clone(), Column::from_cells(values));
            column_names.push(name);
        }

        let mut snapshot = Snapshot { column_names, columns, arrival_dates: None, row_count };
        snapshot.derive_arrival_columns()?;
        debug!(rows = row_count, columns = ?snapshot.column_names, "parsed dataset");
        Ok(snapshot)
    }

    fn derive_arrival_columns(&mut self) -> Result<(), LoadError> {
        let dates = if let Some(column) = self.columns.get(columns::ARRIVAL_DATE) {
            Some(parse_date_column(column)?)
        } else {
            self.assemble_split_dates()?
        };

        let Some(dates) = dates else {
            return Ok(());
        };

        let years = dates.iter().map(|d| f64::from(d.year())).collect();
        let months = dates.iter().map(|d| f64::from(d.month())).collect();
        let days = dates.iter().map(|d| f64::from(d.day())).collect();
        self.insert_column(columns::ARRIVAL_YEAR, Column::Numeric(years));
        self.insert_column(columns::ARRIVAL_MONTH, Column::Numeric(months));
        self.insert_column(columns::ARRIVAL_DAY, Column::Numeric(days));
        self.arrival_dates = Some(dates);
        Ok(())
    }

    /// Build dates from `arrival_date_year` / `arrival_date_month` /
    /// `arrival_date_day_of_month` when all three exist.
    fn assemble_split_dates(&self) -> Result<Option<Vec<NaiveDate>>, LoadError> {
        let (Some(years), Some(months), Some(days)) = (
            self.columns.get(columns::ARRIVAL_DATE_YEAR),
            self.columns.get(columns::ARRIVAL_DATE_MONTH),
            self.columns.get(columns::ARRIVAL_DATE_DAY_OF_MONTH),
        ) else {
            return Ok(None);
        };

        let mut dates = Vec::with_capacity(self.row_count);
        for row in 0..self.row_count {
            let year = years.display(row).unwrap_or_default();
            let month = months.display(row).unwrap_or_default();
            let day = days.display(row).unwrap_or_default();
            let date = year
                .parse::<i32>()
                .ok()
                .zip(parse_month(&month))
                .zip(day.parse::<u32>().ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d));
            match date {
                Some(date) => dates.push(date),
                None => {
                    return Err(LoadError::InvalidDate {
                        row,
                        value: format!("{year}-{month}-{day}"),
                    });
                }
            }
        }
        Ok(Some(dates))
    }

    fn insert_column(&mut self, name: &str, column: Column) {
        if self.columns.insert(name.to_string(), column).is_none() {
            self.column_names.push(name.to_string());
        }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Whether a column (source or derived) exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in header order, derived columns last.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Access a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Numeric values of a column, or `None` if absent or textual.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    /// Text values of a column, or `None` if absent or numeric.
    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            Column::Text(values) => Some(values),
            Column::Numeric(_) => None,
        }
    }

    /// Sum of a numeric column.
    pub fn sum(&self, name: &str) -> Option<f64> {
        self.numeric(name).map(|values| values.iter().sum())
    }

    /// Mean of a numeric column; `None` when absent, textual, or empty.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.numeric(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Sum of a numeric column over selected rows.
    pub fn sum_rows(&self, name: &str, rows: &[usize]) -> Option<f64> {
        let values = self.numeric(name)?;
        Some(rows.iter().filter_map(|&row| values.get(row)).sum())
    }

    /// Number of rows whose numeric value is non-zero.
    pub fn count_nonzero(&self, name: &str) -> Option<usize> {
        self.numeric(name).map(|values| values.iter().filter(|v| **v != 0.0).count())
    }

    /// Parsed arrival dates, one per row, if they could be determined.
    pub fn arrival_dates(&self) -> Option<&[NaiveDate]> {
        self.arrival_dates.as_deref()
    }

    /// Earliest and latest arrival date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.arrival_dates()?;
        let min = dates.iter().min()?;
        let max = dates.iter().max()?;
        Some((*min, *max))
    }

    /// Indices of rows arriving in the given year and month, or `None` when
    /// the derived arrival columns are unset.
    pub fn filter_by_year_month(&self, year: i32, month: u32) -> Option<Vec<usize>> {
        let years = self.numeric(columns::ARRIVAL_YEAR)?;
        let months = self.numeric(columns::ARRIVAL_MONTH)?;
        Some(
            years
                .iter()
                .zip(months)
                .enumerate()
                .filter(|(_, (y, m))| **y == f64::from(year) && **m == f64::from(month))
                .map(|(row, _)| row)
                .collect(),
        )
    }

    /// Distinct values of a column with their row counts, most frequent
    /// first and ties ordered by value.
    pub fn value_counts(&self, name: &str) -> Option<Vec<(String, usize)>> {
        let column = self.column(name)?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in 0..column.len() {
            if let Some(value) = column.display(row) {
                *counts.entry(value).or_default() += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Some(counts)
    }

    /// A borrowed view of one row.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.row_count).then_some(Row { snapshot: self, index })
    }

    /// Iterate over all rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        (0..self.row_count).map(move |index| Row { snapshot: self, index })
    }
}

/// A borrowed view of one reservation record.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    snapshot: &'a Snapshot,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of this row in the snapshot.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell rendered for display, `None` if the column is absent.
    pub fn display(&self, column: &str) -> Option<String> {
        self.snapshot.column(column)?.display(self.index)
    }

    /// Numeric cell value.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.snapshot.numeric(column)?.get(self.index).copied()
    }

    /// Text cell value.
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.snapshot.text(column)?.get(self.index).map(String::as_str)
    }

    /// Parsed arrival date.
    pub fn arrival_date(&self) -> Option<NaiveDate> {
        self.snapshot.arrival_dates()?.get(self.index).copied()
    }
}

/// Parse a month given by name ("July", "jul") or number ("7").
pub fn parse_month(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(number) = value.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    value.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_date_column(column: &Column) -> Result<Vec<NaiveDate>, LoadError> {
    (0..column.len())
        .map(|row| {
            let value = column.display(row).unwrap_or_default();
            parse_date(&value).ok_or(LoadError::InvalidDate { row, value })
        })
        .collect()
}

/// Render a number the way a person would read it: whole values without a
/// fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
