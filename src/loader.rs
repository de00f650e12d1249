use crate::error::{ReportError, Result};
use crate::types::{Column, Record};
use crate::util::{format_int, parse_date_safe, parse_f64_safe, parse_i64_safe, parse_text};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Binary workbook extensions we refuse up front instead of feeding them to
/// the CSV reader.
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
    pub recognised_columns: Vec<&'static str>,
    pub missing_columns: Vec<&'static str>,
    /// Non-empty numeric or date cells that could not be coerced and were
    /// treated as unknown.
    pub coercion_failures: usize,
}

impl LoadReport {
    /// Console lines shown after a load. `loaded` is the number of records
    /// kept once blank rows are dropped.
    pub fn summary_lines(&self, loaded: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "Processing dataset... ({} rows read, {} records loaded, {} blank rows skipped)",
            format_int(self.total_rows),
            format_int(loaded),
            format_int(self.blank_rows)
        )];
        if self.coercion_failures > 0 {
            lines.push(format!(
                "Note: {} cells could not be read and were treated as unknown.",
                format_int(self.coercion_failures)
            ));
        }
        if !self.recognised_columns.is_empty() {
            lines.push(format!("Info: columns found: {}", self.recognised_columns.join(", ")));
        }
        if !self.missing_columns.is_empty() {
            lines.push(format!("Info: columns not found: {}", self.missing_columns.join(", ")));
        }
        lines
    }
}

/// Load a harvest sheet exported as CSV.
///
/// The file handle lives only inside this call; it is closed on every
/// return path.
pub fn load_and_clean(path: &Path) -> Result<(Vec<Record>, LoadReport)> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ReportError::UnsupportedFormat(ext));
        }
    }
    let file = std::fs::File::open(path)?;
    info!("Loading harvest records from {}", path.display());
    load_from_reader(file, &path.display().to_string())
}

/// Parse rows from any reader. `source` only labels error messages.
pub fn load_from_reader<R: Read>(input: R, source: &str) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(input);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReportError::MissingHeaders(source.to_string()));
    }

    // First matching header wins if a column is duplicated.
    let mut columns: HashMap<Column, usize> = HashMap::new();
    for (idx, h) in headers.iter().enumerate() {
        if let Some(col) = Column::from_header(h) {
            columns.entry(col).or_insert(idx);
        }
    }
    let mut report = LoadReport::default();
    for col in Column::ALL {
        if columns.contains_key(&col) {
            report.recognised_columns.push(col.name());
        } else {
            report.missing_columns.push(col.name());
        }
    }
    debug!("Recognised columns: {:?}", report.recognised_columns);

    let mut records: Vec<Record> = Vec::new();
    for result in rdr.records() {
        let row = result?;
        report.total_rows += 1;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            report.blank_rows += 1;
            continue;
        }
        let mut cells = RowCells {
            row: &row,
            columns: &columns,
            failures: 0,
        };
        let mut weekdays = [None; 7];
        for (i, slot) in weekdays.iter_mut().enumerate() {
            *slot = cells.number(Column::Weekday(i));
        }
        let record = Record {
            row_no: records.len(),
            variety: cells.text(Column::Variety),
            production_number: cells.text(Column::ProductionNumber),
            plant_date: cells.date(Column::PlantDate),
            year: cells
                .integer(Column::Year)
                .and_then(|y| i32::try_from(y).ok()),
            week: cells
                .integer(Column::Week)
                .and_then(|w| u32::try_from(w).ok()),
            weekdays,
            mother_plants: cells.number(Column::MotherPlants),
            total: cells.number(Column::Total).unwrap_or(0.0),
            estimated_coefficient: cells.number(Column::EstimatedCoefficient),
            ..Record::default()
        };
        report.coercion_failures += cells.failures;
        records.push(record);
    }

    info!(
        "Loaded {} records ({} blank rows skipped, {} cells coerced to unknown)",
        records.len(),
        report.blank_rows,
        report.coercion_failures
    );
    Ok((records, report))
}

/// Typed access to the cells of one CSV row, counting cells that were
/// present but unparseable.
struct RowCells<'a> {
    row: &'a StringRecord,
    columns: &'a HashMap<Column, usize>,
    failures: usize,
}

impl<'a> RowCells<'a> {
    fn raw(&self, col: Column) -> Option<&'a str> {
        let idx = *self.columns.get(&col)?;
        self.row.get(idx).filter(|s| !s.trim().is_empty())
    }

    fn coerce<T>(&mut self, col: Column, parse: impl Fn(Option<&str>) -> Option<T>) -> Option<T> {
        let raw = self.raw(col);
        let value = parse(raw);
        if raw.is_some() && value.is_none() {
            self.failures += 1;
        }
        value
    }

    fn number(&mut self, col: Column) -> Option<f64> {
        self.coerce(col, parse_f64_safe)
    }

    fn integer(&mut self, col: Column) -> Option<i64> {
        self.coerce(col, parse_i64_safe)
    }

    fn date(&mut self, col: Column) -> Option<chrono::NaiveDate> {
        self.coerce(col, parse_date_safe)
    }

    fn text(&self, col: Column) -> Option<String> {
        parse_text(self.raw(col))
    }
}
