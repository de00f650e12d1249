use crate::error::Result;
use crate::types::CsvRow;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Write `rows` with a header line. An empty table still gets its header,
/// which `serialize` alone would not write.
pub fn write_csv<T: Serialize + CsvRow>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        wtr.write_record(T::HEADERS)?;
    }
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// `variety_<name>.csv` inside `dir`, with anything that is not safe in a
/// file name replaced by `_`.
pub fn variety_file(dir: &Path, variety: &str) -> PathBuf {
    let name: String = variety
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("variety_{}.csv", name))
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows\n", rows.len() - max_rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ForecastEntry, RecordRow, Record, SensitivityRow, VarietyWeekRow, WeeklyTotal,
        WeeklyVarietyAggregate,
    };

    fn first_line(path: &Path) -> String {
        let text = std::fs::read_to_string(path).expect("read");
        text.lines().next().unwrap_or_default().to_string()
    }

    /// Header written for an empty table equals the one `serialize` writes
    /// for a populated one.
    fn assert_headers_agree<T: Serialize + CsvRow>(row: T) {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("empty.csv");
        let full = dir.path().join("full.csv");
        write_csv::<T>(&empty, &[]).expect("write empty");
        write_csv(&full, &[row]).expect("write full");
        assert_eq!(first_line(&empty), T::HEADERS.join(","));
        assert_eq!(first_line(&empty), first_line(&full));
    }

    #[test]
    fn empty_forecast_still_has_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("forecast.csv");
        write_csv::<ForecastEntry>(&path, &[]).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "Variety,ForecastPct\n");
    }

    #[test]
    fn declared_headers_match_serialized_headers() {
        assert_headers_agree(ForecastEntry { variety: "Rosa".into(), forecast_pct: 1.0 });
        assert_headers_agree(SensitivityRow { daily_output: 50, days_needed: 1, harvesters_needed: 0.1 });
        assert_headers_agree(WeeklyTotal { week_start: None, total: 1.0 });
        assert_headers_agree(WeeklyVarietyAggregate {
            week_start: None,
            variety: None,
            actual_total: 1.0,
            estimated_total: 0.0,
            mean_actual_coefficient: None,
            record_count: 1,
            accuracy_rate_pct: None,
        });
        assert_headers_agree(VarietyWeekRow {
            week_start: None,
            actual_total: 1.0,
            estimated_total: 0.0,
            mean_actual_coefficient: None,
            rolling_mean_coefficient: None,
        });
        assert_headers_agree(RecordRow::from(&Record::default()));
    }

    #[test]
    fn forecast_csv_has_expected_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("forecast.csv");
        let rows = vec![ForecastEntry { variety: "Rosa".into(), forecast_pct: 35.0 }];
        write_csv(&path, &rows).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "Variety,ForecastPct\nRosa,35.0\n");
    }

    #[test]
    fn sensitivity_csv_has_expected_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sensitivity.csv");
        let rows = vec![SensitivityRow { daily_output: 50, days_needed: 978, harvesters_needed: 3.9 }];
        write_csv(&path, &rows).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "DailyOutput,DaysNeeded,HarvestersNeeded\n50,978,3.9\n");
    }

    #[test]
    fn variety_file_names_are_sanitised() {
        let p = variety_file(Path::new("out"), "Red Naomi/2");
        assert_eq!(p, Path::new("out").join("variety_Red_Naomi_2.csv"));
    }

    #[test]
    fn writing_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("x.json");
        assert!(write_json(&path, &vec![1, 2]).is_err());
    }
}
