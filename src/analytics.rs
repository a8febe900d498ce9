// src/analytics.rs
//! Summary statistics and day-bucketed trends over stored records.
//!
//! All bucketing is by UTC calendar day.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::ingest::types::CanonicalRecord;

pub const DEFAULT_TREND_DAYS: i64 = 30;
const NA: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordStats {
    pub total: usize,
    pub unique_categories: usize,
    pub most_common_category: String,
    /// Rounded to one decimal.
    pub avg_per_day: f64,
    pub busiest_day: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDailyCount {
    pub date: NaiveDate,
    pub category: String,
    pub count: usize,
}

/// Most frequent key; ties go to the smallest key.
fn mode<K: Ord + Clone + std::hash::Hash>(items: impl Iterator<Item = K>) -> Option<K> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for k in items {
        *counts.entry(k).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
        .map(|(k, _)| k)
}

pub fn record_stats(records: &[CanonicalRecord]) -> RecordStats {
    if records.is_empty() {
        return RecordStats {
            total: 0,
            unique_categories: 0,
            most_common_category: NA.to_string(),
            avg_per_day: 0.0,
            busiest_day: NA.to_string(),
        };
    }

    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let (min, max) = records.iter().fold((records[0].date, records[0].date), |(lo, hi), r| {
        (lo.min(r.date), hi.max(r.date))
    });
    let span_days = (max - min).num_days() + 1;
    let avg = records.len() as f64 / span_days.max(1) as f64;

    RecordStats {
        total: records.len(),
        unique_categories: categories.len(),
        most_common_category: mode(records.iter().map(|r| r.category.clone()))
            .unwrap_or_else(|| NA.to_string()),
        avg_per_day: (avg * 10.0).round() / 10.0,
        busiest_day: mode(records.iter().map(|r| r.date.date_naive()))
            .map(|d| d.to_string())
            .unwrap_or_else(|| NA.to_string()),
    }
}

/// Case-insensitive substring match on title or description. Blank keeps all.
pub fn search_records(records: Vec<CanonicalRecord>, query: &str) -> Vec<CanonicalRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Day range covering both the trailing window and every record.
fn day_range(records: &[CanonicalRecord], now: DateTime<Utc>, days: i64) -> Vec<NaiveDate> {
    let today = now.date_naive();
    let mut start = today - Duration::days(days.max(0));
    let mut end = today;
    for r in records {
        let d = r.date.date_naive();
        start = start.min(d);
        end = end.max(d);
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Continuous per-day counts, zero-filled.
pub fn daily_frequency(records: &[CanonicalRecord], now: DateTime<Utc>, days: i64) -> Vec<DailyCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for r in records {
        *counts.entry(r.date.date_naive()).or_default() += 1;
    }
    day_range(records, now, days)
        .into_iter()
        .map(|date| DailyCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Per day x category counts, zero-filled, categories sorted by name.
/// No records means no rows.
pub fn category_trends(
    records: &[CanonicalRecord],
    now: DateTime<Utc>,
    days: i64,
) -> Vec<CategoryDailyCount> {
    if records.is_empty() {
        return Vec::new();
    }
    let mut counts: BTreeMap<(NaiveDate, &str), usize> = BTreeMap::new();
    for r in records {
        *counts
            .entry((r.date.date_naive(), r.category.as_str()))
            .or_default() += 1;
    }
    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();

    let mut out = Vec::new();
    for date in day_range(records, now, days) {
        for cat in &categories {
            out.push(CategoryDailyCount {
                date,
                category: cat.to_string(),
                count: counts.get(&(date, *cat)).copied().unwrap_or(0),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(category: &str, at: DateTime<Utc>) -> CanonicalRecord {
        CanonicalRecord {
            title: "t".into(),
            description: String::new(),
            date: at,
            link: None,
            category: category.into(),
            source: None,
            location: None,
            image_url: None,
            content_hash: String::new(),
        }
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    #[test]
    fn empty_stats() {
        let s = record_stats(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.most_common_category, "N/A");
        assert_eq!(s.busiest_day, "N/A");
    }

    #[test]
    fn stats_over_span() {
        let records = vec![
            rec("Briefing", at(1, 9)),
            rec("Training", at(1, 12)),
            rec("Training", at(3, 8)),
        ];
        let s = record_stats(&records);
        assert_eq!(s.total, 3);
        assert_eq!(s.unique_categories, 2);
        assert_eq!(s.most_common_category, "Training");
        // 3 records, one whole day apart (+1)
        assert_eq!(s.avg_per_day, 1.5);
        assert_eq!(s.busiest_day, "2024-06-01");
    }

    #[test]
    fn frequency_is_zero_filled() {
        let records = vec![rec("A", at(1, 1)), rec("A", at(1, 2)), rec("B", at(3, 1))];
        let freq = daily_frequency(&records, at(4, 0), 2);
        let counts: Vec<usize> = freq.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0]);
        assert_eq!(freq[0].date, at(1, 0).date_naive());
    }

    #[test]
    fn trends_cover_every_category_every_day() {
        let records = vec![rec("A", at(1, 1)), rec("B", at(2, 1))];
        let trends = category_trends(&records, at(2, 12), 1);
        assert_eq!(trends.len(), 4);
        assert_eq!(trends[0].category, "A");
        assert_eq!(trends[0].count, 1);
        assert_eq!(trends[1].count, 0);
        assert_eq!(trends[3].count, 1);
        assert!(category_trends(&[], at(2, 12), 30).is_empty());
    }

    #[test]
    fn search_matches_title_or_description() {
        let mut a = rec("A", at(1, 1));
        a.title = "GPS III launch".into();
        let mut b = rec("B", at(1, 1));
        b.description = "Quarterly SATCOM review".into();
        let hits = search_records(vec![a.clone(), b.clone()], "satcom");
        assert_eq!(hits, vec![b.clone()]);
        assert_eq!(search_records(vec![a, b], "  ").len(), 2);
    }
}
