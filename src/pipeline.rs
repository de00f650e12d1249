// One full pass from loaded records to every derived table.
use crate::config::Settings;
use crate::forecast::forecast;
use crate::metrics::derive_metrics;
use crate::normalize::normalize;
use crate::reports::{top_varieties, weekly_totals, weekly_variety};
use crate::sequence::sequence;
use crate::staffing::{estimate_staffing, sensitivity};
use crate::types::{
    ForecastEntry, Record, SensitivityRow, StaffingEstimate, WeeklyTotal, WeeklyVarietyAggregate,
};

/// Everything derived from one upload. Built fresh by [`analyse`]; nothing
/// here is shared with another load.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<Record>,
    pub est_mean: Option<f64>,
    pub weekly_variety: Vec<WeeklyVarietyAggregate>,
    pub weekly_totals: Vec<WeeklyTotal>,
    pub top_varieties: Vec<String>,
    pub forecast: Vec<ForecastEntry>,
    pub staffing: Option<StaffingEstimate>,
    pub sensitivity: Vec<SensitivityRow>,
}

pub fn analyse(records: Vec<Record>, settings: &Settings) -> Analysis {
    let mut records = records;
    normalize(&mut records);
    let mut records = sequence(records);
    let est_mean = derive_metrics(&mut records);

    let weekly_variety = weekly_variety(&records);
    let weekly_totals = weekly_totals(&records);
    let top_varieties = top_varieties(&weekly_variety, settings.top_varieties);
    let forecast = forecast(&weekly_variety, settings.forecast_window);
    let staffing = estimate_staffing(&records, settings);
    let sensitivity = staffing
        .map(|s| sensitivity(s.annual_estimate, settings))
        .unwrap_or_default();

    Analysis {
        records,
        est_mean,
        weekly_variety,
        weekly_totals,
        top_varieties,
        forecast,
        staffing,
        sensitivity,
    }
}
