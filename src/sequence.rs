// Running day/week numbering within each production cycle.
use crate::types::Record;
use crate::util::cmp_none_last;
use log::info;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// (Variety, ProductionNumber). A missing production number simply makes
/// the variety the whole cycle.
pub type GroupKey = (Option<String>, Option<String>);

pub fn group_key(r: &Record) -> GroupKey {
    (r.variety.clone(), r.production_number.clone())
}

/// 1-based week of the cycle for a 1-based day of the cycle.
pub fn nth_week(nth_day: usize) -> usize {
    (nth_day.saturating_sub(1)) / 7 + 1
}

/// In-group ordering: by plant date when the sheet has any, otherwise by
/// (Year, Week, Day). Unknown parts sort last.
fn cmp_period(a: &Record, b: &Record, by_plant_date: bool) -> Ordering {
    if by_plant_date {
        cmp_none_last(&a.plant_date, &b.plant_date)
    } else {
        cmp_none_last(&a.year, &b.year)
            .then_with(|| cmp_none_last(&a.week, &b.week))
            .then_with(|| cmp_none_last(&a.day, &b.day))
    }
}

fn cmp_group(a: &GroupKey, b: &GroupKey) -> Ordering {
    cmp_none_last(&a.0, &b.0).then_with(|| cmp_none_last(&a.1, &b.1))
}

/// Partition, stable-sort each partition, then number it.
///
/// Rows with equal group and period keep their upload order (`row_no`).
/// The returned table is ordered by group, then by `nth_day`.
pub fn sequence(records: Vec<Record>) -> Vec<Record> {
    let by_plant_date = records.iter().any(|r| r.plant_date.is_some());

    let mut groups: BTreeMap<GroupKey, Vec<Record>> = BTreeMap::new();
    let mut input = records;
    input.sort_by_key(|r| r.row_no);
    for r in input {
        groups.entry(group_key(&r)).or_default().push(r);
    }

    let mut keyed: Vec<(GroupKey, Vec<Record>)> = groups.into_iter().collect();
    keyed.sort_by(|a, b| cmp_group(&a.0, &b.0));

    let group_count = keyed.len();
    let mut out = Vec::new();
    for (_, mut rows) in keyed {
        // `sort_by` is stable, so ties stay in upload order.
        rows.sort_by(|a, b| cmp_period(a, b, by_plant_date));
        for (i, mut r) in rows.into_iter().enumerate() {
            r.nth_day = i + 1;
            r.nth_week = nth_week(r.nth_day);
            out.push(r);
        }
    }
    info!(
        "Sequenced {} records across {} cycles (ordered by {})",
        out.len(),
        group_count,
        if by_plant_date { "PlantDate" } else { "Year/Week/Day" }
    );
    out
}
