//! # Freshness window
//! Derived, never stored: a pure function of `created_at` and `now`.
//!
//! The 60-minute lifespan is split into three equal 20-minute bands plus a
//! terminal expired state. Each boundary belongs to the lower tier: exactly
//! 40:00 left is `Moderate`, 20:00 is `Spoiling`, 0:00 is `Expired`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::FoodNotification;

/// Total lifespan of a notification.
pub const LIFESPAN_MINUTES: i64 = 60;
/// Width of each freshness band.
pub const TIER_BAND_MINUTES: i64 = 20;

pub fn lifespan() -> Duration {
    Duration::minutes(LIFESPAN_MINUTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreshnessTier {
    Fresh,
    Moderate,
    Spoiling,
    Expired,
}

impl FreshnessTier {
    pub fn label(self) -> &'static str {
        match self {
            FreshnessTier::Fresh => "Fresh",
            FreshnessTier::Moderate => "Moderate",
            FreshnessTier::Spoiling => "Spoiling",
            FreshnessTier::Expired => "Expired",
        }
    }

    /// Tier for a given remaining time.
    pub fn for_remaining(remaining: Duration) -> Self {
        let band = Duration::minutes(TIER_BAND_MINUTES);
        if remaining <= Duration::zero() {
            FreshnessTier::Expired
        } else if remaining <= band {
            FreshnessTier::Spoiling
        } else if remaining <= band * 2 {
            FreshnessTier::Moderate
        } else {
            FreshnessTier::Fresh
        }
    }
}

/// Snapshot of a notification's freshness at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub tier: FreshnessTier,
    /// Whole seconds left, rounded up, never negative.
    pub remaining_seconds: i64,
    /// `MM:SS` countdown as shown on notification cards.
    pub remaining: String,
    pub is_expired: bool,
}

/// Evaluate freshness of `n` at `now`.
///
/// Idempotent and side-effect free, so a display layer may poll it every
/// second. A `created_at` later than `now` counts as zero elapsed time.
pub fn evaluate_freshness(n: &FoodNotification, now: DateTime<Utc>) -> Freshness {
    evaluate_at(n.created_at(), now)
}

pub(crate) fn evaluate_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Freshness {
    let elapsed = (now - created_at).max(Duration::zero());
    let remaining_seconds = whole_seconds_left(lifespan() - elapsed);
    // Tier and countdown come from the same whole-second value.
    let tier = FreshnessTier::for_remaining(Duration::seconds(remaining_seconds));

    Freshness {
        tier,
        remaining_seconds,
        remaining: format_countdown(remaining_seconds),
        is_expired: tier == FreshnessTier::Expired,
    }
}

/// Instant at which a notification created at `created_at` expires.
pub fn expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + lifespan()
}

/// Remaining time rounded up to whole seconds; zero once nothing is left.
fn whole_seconds_left(remaining: Duration) -> i64 {
    if remaining <= Duration::zero() {
        return 0;
    }
    let whole = remaining.num_seconds();
    if remaining > Duration::seconds(whole) {
        whole + 1
    } else {
        whole
    }
}

fn format_countdown(secs: i64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
