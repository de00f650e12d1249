// Harvester staffing estimate for the coming year.
use crate::config::{Settings, WEEKS_PER_YEAR};
use crate::types::{Record, SensitivityRow, StaffingEstimate};
use crate::util::{mean, round_to};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::BTreeMap;

/// Mean over known weeks of the week's summed estimated production.
/// Unknown estimates count as 0 within a week; the unknown week is left out.
pub fn mean_weekly_estimate(data: &[Record]) -> Option<f64> {
    let mut weeks: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in data {
        if let Some(ws) = r.week_start {
            *weeks.entry(ws).or_insert(0.0) += r.estimated_production.unwrap_or(0.0);
        }
    }
    let sums: Vec<f64> = weeks.into_values().collect();
    mean(&sums)
}

impl StaffingEstimate {
    pub fn from_mean_week(mean_week: f64, settings: &Settings) -> StaffingEstimate {
        let annual_estimate = mean_week * WEEKS_PER_YEAR * (1.0 - settings.sick_factor);
        let days_needed = annual_estimate / settings.harvester_output_per_day;
        StaffingEstimate {
            mean_week,
            annual_estimate,
            days_needed,
            harvesters_needed: days_needed / settings.working_days_per_harvester,
        }
    }
}

pub fn estimate_staffing(data: &[Record], settings: &Settings) -> Option<StaffingEstimate> {
    let Some(mean_week) = mean_weekly_estimate(data) else {
        warn!("No dated records; staffing estimate is unavailable");
        return None;
    };
    let estimate = StaffingEstimate::from_mean_week(mean_week, settings);
    info!(
        "Staffing: {:.0} units/year, {:.0} harvester-days, {:.1} harvesters",
        estimate.annual_estimate, estimate.days_needed, estimate.harvesters_needed
    );
    Some(estimate)
}

/// Harvester days and headcount for each candidate daily output, all
/// against the same annual volume.
pub fn sensitivity(annual_estimate: f64, settings: &Settings) -> Vec<SensitivityRow> {
    settings
        .sensitivity_outputs
        .iter()
        .filter(|p| **p > 0)
        .map(|&p| {
            let days = annual_estimate / p as f64;
            SensitivityRow {
                daily_output: p,
                days_needed: round_to(days, 0) as i64,
                harvesters_needed: round_to(days / settings.working_days_per_harvester, 1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn staffing_from_a_thousand_units_a_week() {
        let s = StaffingEstimate::from_mean_week(1000.0, &Settings::default());
        assert!(close(s.annual_estimate, 48880.0));
        assert!(close(s.days_needed, 488.8));
        assert!(close(s.harvesters_needed, 1.9552));
    }

    #[test]
    fn sensitivity_rows() {
        let rows = sensitivity(48880.0, &Settings::default());
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows[0],
            SensitivityRow { daily_output: 50, days_needed: 978, harvesters_needed: 3.9 }
        );
        assert_eq!(rows[2].days_needed, 489);
        assert_eq!(rows[2].harvesters_needed, 2.0);
        assert_eq!(rows[4].daily_output, 200);
    }

    #[test]
    fn mean_week_ignores_unknown_week_and_zero_fills_estimates() {
        let monday = |w| NaiveDate::from_isoywd_opt(2024, w, chrono::Weekday::Mon);
        let data = vec![
            Record { week_start: monday(1), estimated_production: Some(100.0), ..Record::default() },
            Record { week_start: monday(1), estimated_production: None, ..Record::default() },
            Record { week_start: monday(2), estimated_production: Some(300.0), ..Record::default() },
            Record { week_start: None, estimated_production: Some(5000.0), ..Record::default() },
        ];
        assert_eq!(mean_weekly_estimate(&data), Some(200.0));
    }

    #[test]
    fn no_dated_records_means_no_estimate() {
        let data = vec![Record { estimated_production: Some(10.0), ..Record::default() }];
        assert_eq!(estimate_staffing(&data, &Settings::default()), None);
    }
}
