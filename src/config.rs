// Fixed planning constants used by the forecast and staffing reports.

/// Share of working time lost to sickness and absence.
pub const SICK_FACTOR: f64 = 0.06;
/// Units a single harvester picks in one day.
pub const HARVESTER_OUTPUT_PER_DAY: f64 = 100.0;
pub const WORKING_DAYS_PER_HARVESTER_PER_YEAR: f64 = 250.0;
/// Trailing window, in weeks, of the rolling mean coefficient.
pub const FORECAST_ROLLING_WEEKS: usize = 4;
pub const TOP_VARIETIES_TO_PLOT: usize = 6;
/// Daily outputs tried in the staffing sensitivity table.
pub const SENSITIVITY_DAILY_OUTPUTS: [u32; 5] = [50, 75, 100, 150, 200];
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Bundle of the constants above, handed explicitly to every report step.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sick_factor: f64,
    pub harvester_output_per_day: f64,
    pub working_days_per_harvester: f64,
    pub forecast_window: usize,
    pub top_varieties: usize,
    pub sensitivity_outputs: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sick_factor: SICK_FACTOR,
            harvester_output_per_day: HARVESTER_OUTPUT_PER_DAY,
            working_days_per_harvester: WORKING_DAYS_PER_HARVESTER_PER_YEAR,
            forecast_window: FORECAST_ROLLING_WEEKS,
            top_varieties: TOP_VARIETIES_TO_PLOT,
            sensitivity_outputs: SENSITIVITY_DAILY_OUTPUTS.to_vec(),
        }
    }
}
