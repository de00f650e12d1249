// Period normalization: fills in Year, Week, Day, the composite
// `YearWeekDay` key and the Monday that starts each record's ISO week.
use crate::types::Record;
use chrono::{Datelike, NaiveDate, Weekday};
use log::{info, warn};

/// Day of the week, Monday = 1 .. Sunday = 7.
///
/// A plant date always wins. Without one, the first weekday column holding
/// a nonzero value gives the day; otherwise it is unknown.
pub fn infer_day(plant_date: Option<NaiveDate>, weekdays: &[Option<f64>; 7]) -> Option<u32> {
    if let Some(d) = plant_date {
        return Some(d.weekday().number_from_monday());
    }
    weekdays
        .iter()
        .position(|v| matches!(v, Some(x) if *x != 0.0))
        .map(|i| i as u32 + 1)
}

/// Monday of the ISO week `(year, week)`, or `None` when the pair does not
/// name a real ISO week (week 0, week 53 in a 52-week year, ...).
pub fn week_start_from_year_week(year: i32, week: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

/// Monday of the ISO week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// `2024_03_5`, with `NA` standing in for any unknown part.
pub fn year_week_day_key(year: Option<i32>, week: Option<u32>, day: Option<u32>) -> String {
    let year = year.map(|y| y.to_string()).unwrap_or_else(|| "NA".to_string());
    let week = week
        .map(|w| format!("{:02}", w))
        .unwrap_or_else(|| "NA".to_string());
    let day = day.map(|d| d.to_string()).unwrap_or_else(|| "NA".to_string());
    format!("{}_{}_{}", year, week, day)
}

/// Derive the period fields of a single record in place.
pub fn normalize_record(r: &mut Record) {
    if let Some(d) = r.plant_date {
        // Explicit Year/Week cells are kept as given.
        r.year = r.year.or(Some(d.year()));
        r.week = r.week.or(Some(d.iso_week().week()));
    }
    r.day = infer_day(r.plant_date, &r.weekdays);
    r.year_week_day = year_week_day_key(r.year, r.week, r.day);
    r.week_start = match (r.plant_date, r.year, r.week) {
        (Some(d), _, _) => Some(week_start_of(d)),
        (None, Some(y), Some(w)) => week_start_from_year_week(y, w),
        _ => None,
    };
}

pub fn normalize(records: &mut [Record]) {
    for r in records.iter_mut() {
        normalize_record(r);
    }
    let unknown_weeks = records.iter().filter(|r| r.week_start.is_none()).count();
    if unknown_weeks > 0 {
        warn!(
            "{} records have no usable PlantDate or Year/Week; they are grouped under an unknown week",
            unknown_weeks
        );
    }
    info!("Normalized periods for {} records", records.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plant_date_drives_day_week_and_year() {
        // 2024-03-06 is a Wednesday in ISO week 10.
        let mut r = Record {
            plant_date: Some(ymd(2024, 3, 6)),
            weekdays: [Some(9.0), None, None, None, None, None, None],
            ..Record::default()
        };
        normalize_record(&mut r);
        assert_eq!(r.day, Some(3));
        assert_eq!(r.year, Some(2024));
        assert_eq!(r.week, Some(10));
        assert_eq!(r.year_week_day, "2024_10_3");
        assert_eq!(r.week_start, Some(ymd(2024, 3, 4)));
    }

    #[test]
    fn explicit_year_and_week_are_trusted() {
        let mut r = Record {
            year: Some(2023),
            week: Some(2),
            weekdays: [None, Some(0.0), None, Some(4.0), Some(1.0), None, None],
            ..Record::default()
        };
        normalize_record(&mut r);
        assert_eq!(r.day, Some(4));
        assert_eq!(r.year_week_day, "2023_02_4");
        assert_eq!(r.week_start, Some(ymd(2023, 1, 9)));
    }

    #[test]
    fn nothing_to_infer_leaves_day_unknown() {
        let mut r = Record {
            year: Some(2023),
            weekdays: [Some(0.0); 7],
            ..Record::default()
        };
        normalize_record(&mut r);
        assert_eq!(r.day, None);
        assert_eq!(r.week_start, None);
        assert_eq!(r.year_week_day, "2023_NA_NA");
    }

    #[test]
    fn invalid_iso_week_gives_unknown_week_start() {
        assert_eq!(week_start_from_year_week(2023, 53), None);
        assert_eq!(week_start_from_year_week(2023, 0), None);
        assert_eq!(week_start_from_year_week(2020, 53), Some(ymd(2020, 12, 28)));

        let mut r = Record {
            year: Some(2023),
            week: Some(60),
            ..Record::default()
        };
        normalize_record(&mut r);
        assert_eq!(r.week_start, None);
    }

    #[test]
    fn week_start_crosses_year_boundary() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020.
        assert_eq!(week_start_of(ymd(2021, 1, 1)), ymd(2020, 12, 28));
    }

    proptest! {
        #[test]
        fn inferred_day_is_always_a_weekday_or_unknown(
            values in proptest::array::uniform7(proptest::option::of(-3.0f64..3.0)),
            offset in proptest::option::of(0i64..4000),
        ) {
            let date = offset.map(|o| ymd(2015, 1, 1) + chrono::Duration::days(o));
            if let Some(day) = infer_day(date, &values) {
                prop_assert!((1..=7).contains(&day));
            } else {
                prop_assert!(date.is_none());
            }
        }

        #[test]
        fn week_start_is_a_monday_at_most_six_days_back(offset in 0i64..4000) {
            let d = ymd(2015, 1, 1) + chrono::Duration::days(offset);
            let ws = week_start_of(d);
            prop_assert_eq!(ws.weekday(), Weekday::Mon);
            prop_assert!((d - ws).num_days() < 7);
            prop_assert_eq!(ws.iso_week(), d.iso_week());
        }
    }
}
