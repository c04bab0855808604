//! Store, department and holiday breakdowns of the uploaded sales.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;

use crate::domain::{DeptData, HolidayImpact, SalesRecord, StoreData};
use crate::forecast::mock::round_half_up;
use crate::io::ingest::parse_date;

/// Named holiday periods, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HolidayKind {
    SuperBowl,
    LaborDay,
    Thanksgiving,
    Christmas,
    Other,
}

impl HolidayKind {
    pub fn display_name(self) -> &'static str {
        match self {
            HolidayKind::SuperBowl => "Super Bowl",
            HolidayKind::LaborDay => "Labor Day",
            HolidayKind::Thanksgiving => "Thanksgiving",
            HolidayKind::Christmas => "Christmas",
            HolidayKind::Other => "Holiday",
        }
    }

    /// Classify a holiday-flagged week by its month.
    pub fn from_date(date: &str) -> Self {
        match parse_date(date).map(|d| d.month()) {
            Some(2) => HolidayKind::SuperBowl,
            Some(9) => HolidayKind::LaborDay,
            Some(11) => HolidayKind::Thanksgiving,
            Some(12) => HolidayKind::Christmas,
            _ => HolidayKind::Other,
        }
    }
}

/// Total sales for the first `limit` distinct stores, in encounter order.
pub fn by_store(records: &[SalesRecord], limit: usize) -> Vec<StoreData> {
    grouped_totals(records, limit, |r| &r.store)
        .into_iter()
        .map(|(id, sales)| StoreData {
            name: format!("Store {id}"),
            sales,
        })
        .collect()
}

/// Total sales for the first `limit` distinct departments, in encounter order.
pub fn by_department(records: &[SalesRecord], limit: usize) -> Vec<DeptData> {
    grouped_totals(records, limit, |r| &r.dept)
        .into_iter()
        .map(|(id, value)| DeptData {
            name: format!("Dept {id}"),
            value,
        })
        .collect()
}

fn grouped_totals<'a, F>(records: &'a [SalesRecord], limit: usize, key: F) -> Vec<(&'a str, f64)>
where
    F: Fn(&'a SalesRecord) -> &'a String,
{
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for r in records {
        let id = key(r).as_str();
        if id.is_empty() {
            continue;
        }
        match totals.get_mut(id) {
            Some(total) => *total += r.weekly_sales,
            None => {
                order.push(id);
                totals.insert(id, r.weekly_sales);
            }
        }
    }

    order
        .into_iter()
        .take(limit)
        .map(|id| (id, round_half_up(totals.get(id).copied().unwrap_or(0.0))))
        .collect()
}

/// Holiday uplift over an average non-holiday week.
///
/// Sales are first summed per date. A date counts as a holiday week if any of
/// its rows is flagged. Holiday weeks are named by month and averaged per
/// name; `lift` is the percentage difference from the average non-holiday
/// week (0 when there are no non-holiday weeks).
pub fn holiday_impact(records: &[SalesRecord]) -> Vec<HolidayImpact> {
    let mut weeks: BTreeMap<&str, (f64, bool)> = BTreeMap::new();
    for r in records {
        if r.date.is_empty() {
            continue;
        }
        let entry = weeks.entry(r.date.as_str()).or_insert((0.0, false));
        entry.0 += r.weekly_sales;
        entry.1 |= r.is_holiday;
    }

    let regular: Vec<f64> = weeks
        .values()
        .filter(|(_, holiday)| !holiday)
        .map(|(total, _)| *total)
        .collect();
    let baseline = mean(&regular);

    let mut by_kind: BTreeMap<HolidayKind, Vec<f64>> = BTreeMap::new();
    for (date, (total, holiday)) in &weeks {
        if *holiday {
            by_kind.entry(HolidayKind::from_date(date)).or_default().push(*total);
        }
    }

    by_kind
        .into_iter()
        .map(|(kind, totals)| {
            let sales = mean(&totals).unwrap_or(0.0);
            let lift = match baseline {
                Some(base) if base != 0.0 => (sales / base - 1.0) * 100.0,
                _ => 0.0,
            };
            HolidayImpact {
                holiday: kind.display_name().to_string(),
                lift: (lift * 10.0).round() / 10.0,
                sales: round_half_up(sales),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(store: &str, dept: &str, date: &str, sales: f64, holiday: bool) -> SalesRecord {
        SalesRecord {
            store: store.to_string(),
            dept: dept.to_string(),
            date: date.to_string(),
            weekly_sales: sales,
            is_holiday: holiday,
        }
    }

    #[test]
    fn stores_keep_encounter_order_and_limit() {
        let records = vec![
            rec("7", "1", "2010-02-05", 10.0, false),
            rec("2", "1", "2010-02-05", 20.0, false),
            rec("7", "2", "2010-02-12", 5.4, false),
            rec("9", "1", "2010-02-12", 1.0, false),
        ];
        let stores = by_store(&records, 2);
        assert_eq!(
            stores,
            vec![
                StoreData { name: "Store 7".into(), sales: 15.0 },
                StoreData { name: "Store 2".into(), sales: 20.0 },
            ]
        );

        let depts = by_department(&records, 6);
        assert_eq!(depts.len(), 2);
        assert_eq!(depts[0], DeptData { name: "Dept 1".into(), value: 31.0 });
    }

    #[test]
    fn empty_ids_are_not_grouped() {
        let records = vec![rec("", "", "2010-02-05", 10.0, false)];
        assert!(by_store(&records, 5).is_empty());
        assert!(by_department(&records, 5).is_empty());
    }

    #[test]
    fn holiday_lift_is_relative_to_regular_weeks() {
        let records = vec![
            rec("1", "1", "2010-02-05", 100.0, false),
            rec("1", "1", "2010-02-12", 150.0, true),
            rec("1", "1", "2010-02-19", 100.0, false),
            rec("1", "1", "2010-11-26", 200.0, true),
            rec("1", "2", "2010-11-26", 20.0, false),
        ];
        let impact = holiday_impact(&records);
        assert_eq!(impact.len(), 2);
        assert_eq!(impact[0].holiday, "Super Bowl");
        assert_eq!(impact[0].lift, 50.0);
        assert_eq!(impact[0].sales, 150.0);
        assert_eq!(impact[1].holiday, "Thanksgiving");
        assert_eq!(impact[1].lift, 120.0);
        assert_eq!(impact[1].sales, 220.0);
    }

    #[test]
    fn holiday_lift_without_regular_weeks_is_zero() {
        let records = vec![rec("1", "1", "2010-12-31", 100.0, true)];
        let impact = holiday_impact(&records);
        assert_eq!(impact[0].holiday, "Christmas");
        assert_eq!(impact[0].lift, 0.0);
    }

    #[test]
    fn unknown_months_fall_back_to_generic_holiday() {
        assert_eq!(HolidayKind::from_date("2010-07-02"), HolidayKind::Other);
        assert_eq!(HolidayKind::from_date("garbage"), HolidayKind::Other);
        assert_eq!(HolidayKind::from_date("10/09/2010"), HolidayKind::LaborDay);
    }
}
