//! # Notification lifecycle
//! Single source of truth for whether a notification can still be claimed.
//!
//! ```text
//! Active(Fresh | Moderate | Spoiling) ──claim──▶ Claimed   (terminal)
//!                                    ──time───▶ Expired   (terminal)
//! ```
//!
//! Every listing, the ranking service and the analytics go through
//! [`is_active`]; nothing else re-derives the filter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::freshness::{evaluate_freshness, FreshnessTier};
use crate::notification::FoodNotification;

/// Where a notification sits in its state machine at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "tier", rename_all = "snake_case")]
pub enum LifecycleState {
    Active(FreshnessTier),
    Claimed,
    Expired,
}

/// Create a new unclaimed notification. See [`FoodNotification::create`].
pub fn create(
    name: impl Into<String>,
    source_location_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
) -> Result<FoodNotification, LifecycleError> {
    FoodNotification::create(name, source_location_id, created_at)
}

/// `true` iff the notification is unclaimed and not expired at `now`.
pub fn is_active(n: &FoodNotification, now: DateTime<Utc>) -> bool {
    !n.is_claimed() && !evaluate_freshness(n, now).is_expired
}

/// Current state. A claimed record reports `Claimed` even after its window
/// has passed.
pub fn state(n: &FoodNotification, now: DateTime<Utc>) -> LifecycleState {
    if n.is_claimed() {
        return LifecycleState::Claimed;
    }
    match evaluate_freshness(n, now).tier {
        FreshnessTier::Expired => LifecycleState::Expired,
        tier => LifecycleState::Active(tier),
    }
}

/// Claim transition. Returns the claimed copy stamped with `now`.
///
/// Fails with `AlreadyClaimed` for a record that is already claimed and with
/// `Expired` once its window has closed. The returned value is a new record;
/// persisting it at most once per id is the store's job
/// (see [`crate::store::NotificationStore::set_claimed`]).
pub fn claim(n: &FoodNotification, now: DateTime<Utc>) -> Result<FoodNotification, LifecycleError> {
    if n.is_claimed() {
        return Err(LifecycleError::AlreadyClaimed(n.id().clone()));
    }
    if evaluate_freshness(n, now).is_expired {
        return Err(LifecycleError::Expired(n.id().clone()));
    }
    Ok(n.to_claimed(now))
}

/// Number of notifications claimed on the given UTC day.
pub fn count_claimed_on_day<'a, I>(notifications: I, day: NaiveDate) -> usize
where
    I: IntoIterator<Item = &'a FoodNotification>,
{
    notifications
        .into_iter()
        .filter(|n| n.is_claimed())
        .filter(|n| n.claimed_at().map(|t| t.date_naive()) == Some(day))
        .count()
}

/// Borrow only the active notifications, preserving order.
pub fn active<'a, I>(notifications: I, now: DateTime<Utc>) -> impl Iterator<Item = &'a FoodNotification>
where
    I: IntoIterator<Item = &'a FoodNotification>,
{
    notifications.into_iter().filter(move |n| is_active(n, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn posted(mins_ago: i64) -> FoodNotification {
        create("Chole", Some("hA".into()), Some(t0() - Duration::minutes(mins_ago))).unwrap()
    }

    #[test]
    fn fresh_unclaimed_is_active() {
        assert!(is_active(&posted(5), t0()));
        assert_eq!(state(&posted(5), t0()), LifecycleState::Active(FreshnessTier::Fresh));
    }

    #[test]
    fn expired_is_inactive() {
        let n = posted(61);
        assert!(!is_active(&n, t0()));
        assert_eq!(state(&n, t0()), LifecycleState::Expired);
    }

    #[test]
    fn claimed_is_never_active() {
        let n = claim(&posted(1), t0()).unwrap();
        for offset in [-120, 0, 10, 59, 61, 600] {
            assert!(!is_active(&n, t0() + Duration::minutes(offset)));
        }
        assert_eq!(state(&n, t0() + Duration::hours(3)), LifecycleState::Claimed);
    }

    #[test]
    fn claim_stamps_time_and_keeps_original() {
        let n = posted(10);
        let c = claim(&n, t0()).unwrap();
        assert!(c.is_claimed());
        assert_eq!(c.claimed_at(), Some(t0()));
        assert_eq!(c.id(), n.id());
        assert!(!n.is_claimed());
    }

    #[test]
    fn second_claim_fails() {
        let c = claim(&posted(10), t0()).unwrap();
        let err = claim(&c, t0() + Duration::seconds(1)).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyClaimed(c.id().clone()));
        assert!(c.is_claimed());
        assert_eq!(c.claimed_at(), Some(t0()));
    }

    #[test]
    fn late_claim_is_rejected() {
        let n = posted(60);
        assert!(matches!(claim(&n, t0()), Err(LifecycleError::Expired(_))));
    }

    #[test]
    fn counts_claims_per_day() {
        let day = t0().date_naive();
        let a = claim(&posted(5), t0()).unwrap();
        let b = claim(&posted(5), t0() - Duration::days(1)).unwrap();
        let c = posted(5);
        let all = vec![a, b, c];
        assert_eq!(count_claimed_on_day(&all, day), 1);
        assert_eq!(count_claimed_on_day(&all, day.pred_opt().unwrap()), 1);
        assert_eq!(count_claimed_on_day(&all, day.succ_opt().unwrap()), 0);
    }

    #[test]
    fn active_filter_keeps_order() {
        let a = posted(1);
        let b = posted(70);
        let c = posted(2);
        let all = vec![a.clone(), b, c.clone()];
        let ids: Vec<_> = active(&all, t0()).map(|n| n.id().clone()).collect();
        assert_eq!(ids, vec![a.id().clone(), c.id().clone()]);
    }
}
