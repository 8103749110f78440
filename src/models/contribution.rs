// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-day contribution ledger behind the contribution graph.
//!
//! One record per UTC date. `count` tracks additions (topics and materials),
//! `study_count` tracks completions and never drops below zero.

use crate::time_utils::{date_key, parse_date_key};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::bson_compat;
use super::material::CompletionChange;

/// How far back records are kept.
pub const RETENTION_MONTHS: u32 = 9;

/// Activity counters for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContributionRecord {
    /// UTC date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default, deserialize_with = "bson_compat::whole")]
    pub count: u32,
    #[serde(default, deserialize_with = "bson_compat::whole")]
    pub study_count: u32,
}

/// Ledger operations over a user's contribution records.
pub struct Ledger<'a> {
    records: &'a mut Vec<ContributionRecord>,
}

impl<'a> Ledger<'a> {
    pub fn new(records: &'a mut Vec<ContributionRecord>) -> Self {
        Self { records }
    }

    fn entry(&mut self, date: NaiveDate) -> &mut ContributionRecord {
        let key = date_key(date);
        let index = match self.records.iter().position(|r| r.date == key) {
            Some(index) => index,
            None => {
                self.records.push(ContributionRecord {
                    date: key,
                    count: 0,
                    study_count: 0,
                });
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    /// A topic or material was added on `date`.
    pub fn record_addition(&mut self, date: NaiveDate) {
        self.entry(date).count += 1;
    }

    /// A material's completion flag flipped on `date`.
    pub fn record_completion(&mut self, change: CompletionChange, date: NaiveDate) {
        let record = self.entry(date);
        match change {
            CompletionChange::Completed => record.study_count += 1,
            CompletionChange::Uncompleted => {
                record.study_count = record.study_count.saturating_sub(1)
            }
        }
    }

    /// Drop records older than the retention window ending at `today`.
    ///
    /// Returns how many records were removed. Records with unparseable dates
    /// are kept.
    pub fn prune(&mut self, today: NaiveDate) -> usize {
        let Some(cutoff) = today.checked_sub_months(Months::new(RETENTION_MONTHS)) else {
            return 0;
        };
        let before = self.records.len();
        self.records
            .retain(|r| parse_date_key(&r.date).is_none_or(|date| date >= cutoff));
        before - self.records.len()
    }
}

/// Consecutive active days ending today (or yesterday, if today is still empty).
pub fn current_streak(records: &[ContributionRecord], today: NaiveDate) -> u32 {
    let active = |date: NaiveDate| {
        let key = date_key(date);
        records
            .iter()
            .any(|r| r.date == key && r.count + r.study_count > 0)
    };

    let mut day = if active(today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if active(yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while active(day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(key: &str, count: u32, study_count: u32) -> ContributionRecord {
        ContributionRecord {
            date: key.to_string(),
            count,
            study_count,
        }
    }

    #[test]
    fn test_addition_upserts_one_record_per_day() {
        let mut records = Vec::new();
        let today = date(2024, 6, 15);

        Ledger::new(&mut records).record_addition(today);
        Ledger::new(&mut records).record_addition(today);
        Ledger::new(&mut records).record_addition(date(2024, 6, 16));

        assert_eq!(
            records,
            vec![record("2024-06-15", 2, 0), record("2024-06-16", 1, 0)]
        );
    }

    #[test]
    fn test_completion_creates_record_with_zero_count() {
        let mut records = Vec::new();

        Ledger::new(&mut records).record_completion(CompletionChange::Completed, date(2024, 6, 15));

        assert_eq!(records, vec![record("2024-06-15", 0, 1)]);
    }

    #[test]
    fn test_study_count_never_negative() {
        let mut records = vec![record("2024-06-15", 1, 1)];
        let today = date(2024, 6, 15);
        let mut ledger = Ledger::new(&mut records);

        for _ in 0..5 {
            ledger.record_completion(CompletionChange::Uncompleted, today);
        }

        assert_eq!(records[0].study_count, 0);
        assert_eq!(records[0].count, 1);
    }

    #[test]
    fn test_prune_keeps_nine_months() {
        let mut records = vec![
            record("2023-09-14", 3, 0),
            record("2023-09-15", 1, 0),
            record("2024-01-01", 1, 1),
            record("garbage", 1, 0),
        ];

        let removed = Ledger::new(&mut records).prune(date(2024, 6, 15));

        assert_eq!(removed, 1);
        assert_eq!(records[0].date, "2023-09-15");
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_prune_clamps_month_end() {
        // 2024-11-30 minus 9 months is 2024-02-29 (leap year clamp)
        let mut records = vec![record("2024-02-28", 1, 0), record("2024-02-29", 1, 0)];

        Ledger::new(&mut records).prune(date(2024, 11, 30));

        assert_eq!(records, vec![record("2024-02-29", 1, 0)]);
    }

    #[test]
    fn test_streak_counts_back_from_today_or_yesterday() {
        let records = vec![
            record("2024-06-12", 1, 0),
            record("2024-06-13", 0, 1),
            record("2024-06-14", 2, 0),
            record("2024-06-10", 1, 0),
        ];

        assert_eq!(current_streak(&records, date(2024, 6, 14)), 3);
        assert_eq!(current_streak(&records, date(2024, 6, 15)), 3);
        assert_eq!(current_streak(&records, date(2024, 6, 16)), 0);
    }

    #[test]
    fn test_streak_ignores_zeroed_days() {
        let records = vec![record("2024-06-14", 0, 0), record("2024-06-13", 1, 0)];
        assert_eq!(current_streak(&records, date(2024, 6, 14)), 1);
    }
}
