use crate::util::{display_opt_date, display_opt_f64, display_opt_str, display_f64};
use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// Weekday columns in the order they are scanned when a row has no plant date.
pub const DAY_COLUMNS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Columns the loader understands. Anything else in the sheet is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    PlantDate,
    Year,
    Week,
    Variety,
    ProductionNumber,
    MotherPlants,
    Total,
    EstimatedCoefficient,
    /// Monday is 0, Sunday is 6.
    Weekday(usize),
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::PlantDate,
        Column::Year,
        Column::Week,
        Column::Variety,
        Column::ProductionNumber,
        Column::MotherPlants,
        Column::Total,
        Column::EstimatedCoefficient,
        Column::Weekday(0),
        Column::Weekday(1),
        Column::Weekday(2),
        Column::Weekday(3),
        Column::Weekday(4),
        Column::Weekday(5),
        Column::Weekday(6),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::PlantDate => "PlantDate",
            Column::Year => "Year",
            Column::Week => "Week",
            Column::Variety => "Variety",
            Column::ProductionNumber => "ProductionNumber",
            Column::MotherPlants => "MotherPlants",
            Column::Total => "Total",
            Column::EstimatedCoefficient => "EstimatedCoefficient",
            Column::Weekday(i) => DAY_COLUMNS[*i],
        }
    }

    /// Match a sheet header against the known columns, ignoring case and
    /// whitespace (`" mother plants "` is `MotherPlants`).
    pub fn from_header(header: &str) -> Option<Column> {
        let key = header_key(header);
        Column::ALL
            .iter()
            .copied()
            .find(|c| header_key(c.name()) == key)
    }
}

fn header_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Column names of an exported table, written even when it has no rows.
/// They must match the struct's `serde` renames, in field order.
pub trait CsvRow {
    const HEADERS: &'static [&'static str];
}

/// One harvest-log row plus everything the pipeline derives for it.
///
/// Unknown values are `None` all the way through; only `total` has a
/// default (0) when the cell is missing or unparseable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Position in the uploaded sheet, 0-based. Used as the tie breaker
    /// when sequencing.
    pub row_no: usize,
    pub variety: Option<String>,
    pub production_number: Option<String>,
    pub plant_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub week: Option<u32>,
    pub weekdays: [Option<f64>; 7],
    pub mother_plants: Option<f64>,
    pub total: f64,
    pub estimated_coefficient: Option<f64>,

    // Filled by `normalize`.
    pub day: Option<u32>,
    pub year_week_day: String,
    pub week_start: Option<NaiveDate>,

    // Filled by `sequence`.
    pub nth_day: usize,
    pub nth_week: usize,

    // Filled by `metrics`.
    pub actual_coefficient: Option<f64>,
    pub estimated_production: Option<f64>,
    pub percent_difference: Option<f64>,
}

/// Flat export shape of a [`Record`] for `cleaned_records.csv`.
#[derive(Debug, Serialize)]
pub struct RecordRow {
    #[serde(rename = "Variety")]
    pub variety: Option<String>,
    #[serde(rename = "ProductionNumber")]
    pub production_number: Option<String>,
    #[serde(rename = "PlantDate")]
    pub plant_date: Option<NaiveDate>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Week")]
    pub week: Option<u32>,
    #[serde(rename = "Day")]
    pub day: Option<u32>,
    #[serde(rename = "YearWeekDay")]
    pub year_week_day: String,
    #[serde(rename = "WeekStart")]
    pub week_start: Option<NaiveDate>,
    #[serde(rename = "NthDay")]
    pub nth_day: usize,
    #[serde(rename = "NthWeek")]
    pub nth_week: usize,
    #[serde(rename = "MotherPlants")]
    pub mother_plants: Option<f64>,
    #[serde(rename = "Total")]
    pub total: f64,
    #[serde(rename = "EstimatedCoefficient")]
    pub estimated_coefficient: Option<f64>,
    #[serde(rename = "ActualCoefficient")]
    pub actual_coefficient: Option<f64>,
    #[serde(rename = "EstimatedProduction")]
    pub estimated_production: Option<f64>,
    #[serde(rename = "PercentDifference")]
    pub percent_difference: Option<f64>,
}

impl CsvRow for RecordRow {
    const HEADERS: &'static [&'static str] = &[
        "Variety",
        "ProductionNumber",
        "PlantDate",
        "Year",
        "Week",
        "Day",
        "YearWeekDay",
        "WeekStart",
        "NthDay",
        "NthWeek",
        "MotherPlants",
        "Total",
        "EstimatedCoefficient",
        "ActualCoefficient",
        "EstimatedProduction",
        "PercentDifference",
    ];
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        RecordRow {
            variety: r.variety.clone(),
            production_number: r.production_number.clone(),
            plant_date: r.plant_date,
            year: r.year,
            week: r.week,
            day: r.day,
            year_week_day: r.year_week_day.clone(),
            week_start: r.week_start,
            nth_day: r.nth_day,
            nth_week: r.nth_week,
            mother_plants: r.mother_plants,
            total: r.total,
            estimated_coefficient: r.estimated_coefficient,
            actual_coefficient: r.actual_coefficient,
            estimated_production: r.estimated_production,
            percent_difference: r.percent_difference,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct WeeklyVarietyAggregate {
    #[serde(rename = "WeekStart")]
    #[tabled(rename = "WeekStart", display_with = "display_opt_date")]
    pub week_start: Option<NaiveDate>,
    #[serde(rename = "Variety")]
    #[tabled(rename = "Variety", display_with = "display_opt_str")]
    pub variety: Option<String>,
    #[serde(rename = "ActualTotal")]
    #[tabled(rename = "ActualTotal", display_with = "display_f64")]
    pub actual_total: f64,
    #[serde(rename = "EstimatedTotal")]
    #[tabled(rename = "EstimatedTotal", display_with = "display_f64")]
    pub estimated_total: f64,
    #[serde(rename = "MeanActualCoefficient")]
    #[tabled(rename = "MeanActualCoeff", display_with = "display_opt_f64")]
    pub mean_actual_coefficient: Option<f64>,
    #[serde(rename = "RecordCount")]
    #[tabled(rename = "Records")]
    pub record_count: usize,
    #[serde(rename = "AccuracyRatePct")]
    #[tabled(rename = "AccuracyRate%", display_with = "display_opt_f64")]
    pub accuracy_rate_pct: Option<f64>,
}

impl CsvRow for WeeklyVarietyAggregate {
    const HEADERS: &'static [&'static str] = &[
        "WeekStart",
        "Variety",
        "ActualTotal",
        "EstimatedTotal",
        "MeanActualCoefficient",
        "RecordCount",
        "AccuracyRatePct",
    ];
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct WeeklyTotal {
    #[serde(rename = "WeekStart")]
    #[tabled(rename = "WeekStart", display_with = "display_opt_date")]
    pub week_start: Option<NaiveDate>,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total", display_with = "display_f64")]
    pub total: f64,
}

impl CsvRow for WeeklyTotal {
    const HEADERS: &'static [&'static str] = &["WeekStart", "Total"];
}

/// One week of a single variety's detail view, with the rolling mean
/// coefficient the forecast is taken from.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct VarietyWeekRow {
    #[serde(rename = "WeekStart")]
    #[tabled(rename = "WeekStart", display_with = "display_opt_date")]
    pub week_start: Option<NaiveDate>,
    #[serde(rename = "ActualTotal")]
    #[tabled(rename = "ActualTotal", display_with = "display_f64")]
    pub actual_total: f64,
    #[serde(rename = "EstimatedTotal")]
    #[tabled(rename = "EstimatedTotal", display_with = "display_f64")]
    pub estimated_total: f64,
    #[serde(rename = "MeanActualCoefficient")]
    #[tabled(rename = "MeanActualCoeff", display_with = "display_opt_f64")]
    pub mean_actual_coefficient: Option<f64>,
    #[serde(rename = "RollingMeanCoefficient")]
    #[tabled(rename = "RollingMeanCoeff", display_with = "display_opt_f64")]
    pub rolling_mean_coefficient: Option<f64>,
}

impl CsvRow for VarietyWeekRow {
    const HEADERS: &'static [&'static str] = &[
        "WeekStart",
        "ActualTotal",
        "EstimatedTotal",
        "MeanActualCoefficient",
        "RollingMeanCoefficient",
    ];
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ForecastEntry {
    #[serde(rename = "Variety")]
    #[tabled(rename = "Variety")]
    pub variety: String,
    #[serde(rename = "ForecastPct")]
    #[tabled(rename = "Forecast (%)")]
    pub forecast_pct: f64,
}

impl CsvRow for ForecastEntry {
    const HEADERS: &'static [&'static str] = &["Variety", "ForecastPct"];
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct StaffingEstimate {
    pub mean_week: f64,
    pub annual_estimate: f64,
    pub days_needed: f64,
    pub harvesters_needed: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SensitivityRow {
    #[serde(rename = "DailyOutput")]
    #[tabled(rename = "DailyOutput")]
    pub daily_output: u32,
    #[serde(rename = "DaysNeeded")]
    #[tabled(rename = "DaysNeeded")]
    pub days_needed: i64,
    #[serde(rename = "HarvestersNeeded")]
    #[tabled(rename = "HarvestersNeeded")]
    pub harvesters_needed: f64,
}

impl CsvRow for SensitivityRow {
    const HEADERS: &'static [&'static str] = &["DailyOutput", "DaysNeeded", "HarvestersNeeded"];
}

/// How the estimated coefficients of the whole sheet were read.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoefficientUnit {
    /// Values above 1 are percentages of the mother-plant count.
    Percentage,
    /// Values multiply the mother-plant count directly.
    Multiplier,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub total_varieties: usize,
    pub total_weeks: usize,
    pub unknown_week_records: usize,
    pub estimated_coefficient_mean: Option<f64>,
    pub coefficient_unit: CoefficientUnit,
    pub staffing: Option<StaffingEstimate>,
}
