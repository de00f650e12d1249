// Next-cycle coefficient forecast from the trailing weekly mean coefficient.
use crate::types::{ForecastEntry, WeeklyVarietyAggregate};
use crate::util::{cmp_none_last, mean, round_to};
use log::{debug, info};
use std::cmp::Ordering;

/// Trailing mean over at most `window` values ending at each position.
///
/// Unknown values are skipped; a position whose whole window is unknown
/// stays unknown. The window shrinks at the start of the series.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let known: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            mean(&known)
        })
        .collect()
}

/// One forecast per known variety: the last rolling mean of its weekly
/// mean coefficient, rounded to one decimal. Highest forecast first.
pub fn forecast(weekly: &[WeeklyVarietyAggregate], window: usize) -> Vec<ForecastEntry> {
    let mut varieties: Vec<&str> = weekly.iter().filter_map(|r| r.variety.as_deref()).collect();
    varieties.sort_unstable();
    varieties.dedup();

    let mut entries = Vec::new();
    for variety in varieties {
        let mut rows: Vec<&WeeklyVarietyAggregate> = weekly
            .iter()
            .filter(|r| r.variety.as_deref() == Some(variety))
            .collect();
        rows.sort_by(|a, b| cmp_none_last(&a.week_start, &b.week_start));
        let coefficients: Vec<Option<f64>> =
            rows.iter().map(|r| r.mean_actual_coefficient).collect();
        match rolling_mean(&coefficients, window).last().copied().flatten() {
            Some(v) => entries.push(ForecastEntry {
                variety: variety.to_string(),
                forecast_pct: round_to(v, 1),
            }),
            None => debug!("No coefficient history for {}; left out of the forecast", variety),
        }
    }
    entries.sort_by(|a, b| {
        b.forecast_pct
            .partial_cmp(&a.forecast_pct)
            .unwrap_or(Ordering::Equal)
    });
    info!("Forecast next-cycle coefficients for {} varieties", entries.len());
    entries
}
