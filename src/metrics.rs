// Per-row yield metrics: actual coefficient, estimated production and the
// percent difference between the two.
use crate::types::{CoefficientUnit, Record};
use crate::util::mean;
use log::{debug, info};

/// Above this sheet-wide mean, estimated coefficients greater than 1 are
/// read as percentages.
const PERCENT_MEAN_THRESHOLD: f64 = 1.5;

/// `Total / MotherPlants * 100`, only for a positive plant count.
pub fn actual_coefficient(total: f64, mother_plants: Option<f64>) -> Option<f64> {
    match mother_plants {
        Some(m) if m > 0.0 => Some(total / m * 100.0),
        _ => None,
    }
}

/// Mean of every known estimated coefficient in the sheet.
pub fn estimated_coefficient_mean(records: &[Record]) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.estimated_coefficient)
        .collect();
    mean(&values)
}

/// The unit the sheet as a whole appears to use, decided once from the
/// sheet-wide mean.
pub fn coefficient_unit(est_mean: Option<f64>) -> CoefficientUnit {
    match est_mean {
        Some(m) if m > PERCENT_MEAN_THRESHOLD => CoefficientUnit::Percentage,
        _ => CoefficientUnit::Multiplier,
    }
}

/// Expected production for one row.
///
/// Under [`CoefficientUnit::Percentage`] only coefficients above 1 are
/// scaled by 1/100; a coefficient of 1 or less is still a multiplier.
pub fn estimated_production(
    estimated_coefficient: Option<f64>,
    mother_plants: Option<f64>,
    est_mean: Option<f64>,
) -> Option<f64> {
    let coef = estimated_coefficient?;
    let plants = mother_plants?;
    if coef > 1.0 && coefficient_unit(est_mean) == CoefficientUnit::Percentage {
        Some(plants * (coef / 100.0))
    } else {
        Some(plants * coef)
    }
}

/// `(Total - Estimated) / Estimated * 100`; unknown for a zero or missing
/// estimate.
pub fn percent_difference(total: f64, estimated: Option<f64>) -> Option<f64> {
    match estimated {
        Some(e) if e != 0.0 => Some((total - e) / e * 100.0),
        _ => None,
    }
}

/// Fill the metric columns of every record. Returns the sheet-wide
/// coefficient mean the estimates were based on.
pub fn derive_metrics(records: &mut [Record]) -> Option<f64> {
    let est_mean = estimated_coefficient_mean(records);
    debug!(
        "EstimatedCoefficient mean {:?}: reading coefficients as {:?}",
        est_mean,
        coefficient_unit(est_mean)
    );
    for r in records.iter_mut() {
        r.actual_coefficient = actual_coefficient(r.total, r.mother_plants);
        r.estimated_production =
            estimated_production(r.estimated_coefficient, r.mother_plants, est_mean);
        r.percent_difference = percent_difference(r.total, r.estimated_production);
    }
    let with_estimate = records
        .iter()
        .filter(|r| r.estimated_production.is_some())
        .count();
    info!(
        "Derived metrics for {} records ({} with an estimate)",
        records.len(),
        with_estimate
    );
    est_mean
}
