//! # Dashboard analytics
//! Waste/efficiency numbers derived from notification records.
//!
//! Each notification is bucketed by the UTC day it was posted and settled as
//! claimed, expired or still active via the lifecycle state machine.
//! Efficiency is the share of settled notifications that were claimed.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::lifecycle::{state, LifecycleState};
use crate::notification::FoodNotification;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyTally {
    pub day: NaiveDate,
    pub posted: usize,
    pub claimed: usize,
    pub expired: usize,
    pub active: usize,
    /// `claimed / (claimed + expired) * 100`, absent while nothing has settled.
    pub efficiency_pct: Option<f64>,
}

impl DailyTally {
    fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    fn add(&mut self, s: LifecycleState) {
        self.posted += 1;
        match s {
            LifecycleState::Claimed => self.claimed += 1,
            LifecycleState::Expired => self.expired += 1,
            LifecycleState::Active(_) => self.active += 1,
        }
    }

    fn finish(mut self) -> Self {
        self.efficiency_pct = efficiency(self.claimed, self.expired);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_posted: usize,
    pub total_claimed: usize,
    pub total_expired: usize,
    pub active: usize,
    pub efficiency_pct: Option<f64>,
}

/// Longest window [`daily_report`] will produce.
pub const MAX_REPORT_DAYS: u32 = 90;

fn efficiency(claimed: usize, expired: usize) -> Option<f64> {
    let settled = claimed + expired;
    if settled == 0 {
        None
    } else {
        Some(claimed as f64 * 100.0 / settled as f64)
    }
}

/// One tally per day for the `days` days ending at `now`'s UTC date, oldest
/// first. Days without posts are present with zero counts. `days` is capped
/// at [`MAX_REPORT_DAYS`].
pub fn daily_report(notifications: &[FoodNotification], now: DateTime<Utc>, days: u32) -> Vec<DailyTally> {
    let days = days.min(MAX_REPORT_DAYS);
    if days == 0 {
        return Vec::new();
    }
    let last = now.date_naive();
    let first = last - Duration::days(i64::from(days) - 1);

    let mut by_day: BTreeMap<NaiveDate, DailyTally> = first
        .iter_days()
        .take(days as usize)
        .map(|d| (d, DailyTally::empty(d)))
        .collect();

    for n in notifications {
        let day = n.created_at().date_naive();
        if let Some(t) = by_day.get_mut(&day) {
            t.add(state(n, now));
        }
    }

    by_day.into_values().map(DailyTally::finish).collect()
}

/// Totals over every record.
pub fn summary(notifications: &[FoodNotification], now: DateTime<Utc>) -> Summary {
    let mut s = Summary::default();
    for n in notifications {
        s.total_posted += 1;
        match state(n, now) {
            LifecycleState::Claimed => s.total_claimed += 1,
            LifecycleState::Expired => s.total_expired += 1,
            LifecycleState::Active(_) => s.active += 1,
        }
    }
    s.efficiency_pct = efficiency(s.total_claimed, s.total_expired);
    s
}
