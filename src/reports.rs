use crate::config::Settings;
use crate::forecast::rolling_mean;
use crate::metrics::coefficient_unit;
use crate::types::{
    Record, StaffingEstimate, SummaryStats, VarietyWeekRow, WeeklyTotal, WeeklyVarietyAggregate,
};
use crate::util::{cmp_none_last, mean};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Roll records up to one row per (WeekStart, Variety).
///
/// Records with an unknown week or variety are kept in their own bucket.
/// Output is ordered by variety, then week, unknowns last.
pub fn weekly_variety(data: &[Record]) -> Vec<WeeklyVarietyAggregate> {
    #[derive(Default)]
    struct Acc {
        actual: f64,
        estimated: f64,
        coefficients: Vec<f64>,
        count: usize,
    }

    let mut map: HashMap<(Option<NaiveDate>, Option<String>), Acc> = HashMap::new();
    for r in data {
        let e = map
            .entry((r.week_start, r.variety.clone()))
            .or_default();
        e.actual += r.total;
        e.estimated += r.estimated_production.unwrap_or(0.0);
        if let Some(c) = r.actual_coefficient {
            e.coefficients.push(c);
        }
        e.count += 1;
    }

    let mut rows: Vec<WeeklyVarietyAggregate> = map
        .into_iter()
        .map(|((week_start, variety), acc)| WeeklyVarietyAggregate {
            week_start,
            variety,
            actual_total: acc.actual,
            estimated_total: acc.estimated,
            mean_actual_coefficient: mean(&acc.coefficients),
            record_count: acc.count,
            accuracy_rate_pct: accuracy_rate(acc.actual, acc.estimated),
        })
        .collect();
    rows.sort_by(|a, b| {
        cmp_none_last(&a.variety, &b.variety).then_with(|| cmp_none_last(&a.week_start, &b.week_start))
    });
    rows
}

/// Actual over estimated volume, as a percentage. Unknown without an
/// estimate to compare against.
pub fn accuracy_rate(actual_total: f64, estimated_total: f64) -> Option<f64> {
    if estimated_total != 0.0 && estimated_total.is_finite() {
        Some(actual_total / estimated_total * 100.0)
    } else {
        None
    }
}

/// Sum of `Total` per week regardless of variety, in week order with the
/// unknown week last.
pub fn weekly_totals(data: &[Record]) -> Vec<WeeklyTotal> {
    let mut map: HashMap<Option<NaiveDate>, f64> = HashMap::new();
    for r in data {
        *map.entry(r.week_start).or_insert(0.0) += r.total;
    }
    let mut rows: Vec<WeeklyTotal> = map
        .into_iter()
        .map(|(week_start, total)| WeeklyTotal { week_start, total })
        .collect();
    rows.sort_by(|a, b| cmp_none_last(&a.week_start, &b.week_start));
    rows
}

/// The `n` known varieties with the largest estimated volume. Ties keep
/// alphabetical order.
pub fn top_varieties(weekly: &[WeeklyVarietyAggregate], n: usize) -> Vec<String> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in weekly {
        if let Some(v) = row.variety.as_deref() {
            *totals.entry(v).or_insert(0.0) += row.estimated_total;
        }
    }
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| a.0.cmp(b.0));
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.into_iter().take(n).map(|(v, _)| v.to_string()).collect()
}

/// Weekly rows of the given varieties, in the order the names are listed.
pub fn weekly_for_varieties(
    weekly: &[WeeklyVarietyAggregate],
    varieties: &[String],
) -> Vec<WeeklyVarietyAggregate> {
    varieties
        .iter()
        .flat_map(|v| {
            weekly
                .iter()
                .filter(move |row| row.variety.as_deref() == Some(v.as_str()))
                .cloned()
        })
        .collect()
}

/// Single-variety view: weekly volumes next to the mean coefficient and its
/// rolling mean. Empty when the variety is not in the sheet.
pub fn variety_detail(
    weekly: &[WeeklyVarietyAggregate],
    variety: &str,
    settings: &Settings,
) -> Vec<VarietyWeekRow> {
    let mut rows: Vec<&WeeklyVarietyAggregate> = weekly
        .iter()
        .filter(|r| r.variety.as_deref() == Some(variety))
        .collect();
    rows.sort_by(|a, b| cmp_none_last(&a.week_start, &b.week_start));
    let coefficients: Vec<Option<f64>> = rows.iter().map(|r| r.mean_actual_coefficient).collect();
    let rolling = rolling_mean(&coefficients, settings.forecast_window);
    rows.into_iter()
        .zip(rolling)
        .map(|(r, rolling_mean_coefficient)| VarietyWeekRow {
            week_start: r.week_start,
            actual_total: r.actual_total,
            estimated_total: r.estimated_total,
            mean_actual_coefficient: r.mean_actual_coefficient,
            rolling_mean_coefficient,
        })
        .collect()
}

pub fn generate_summary(
    data: &[Record],
    weekly_totals: &[WeeklyTotal],
    est_mean: Option<f64>,
    staffing: Option<StaffingEstimate>,
) -> SummaryStats {
    let varieties: HashSet<&str> = data.iter().filter_map(|r| r.variety.as_deref()).collect();
    SummaryStats {
        total_records: data.len(),
        total_varieties: varieties.len(),
        total_weeks: weekly_totals.iter().filter(|w| w.week_start.is_some()).count(),
        unknown_week_records: data.iter().filter(|r| r.week_start.is_none()).count(),
        estimated_coefficient_mean: est_mean,
        coefficient_unit: coefficient_unit(est_mean),
        staffing,
    }
}
