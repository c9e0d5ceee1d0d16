//! # Food board
//! The service the HTTP layer talks to: posting, claiming, listing and ranking
//! over a [`NotificationStore`] and a [`LocationDirectory`].
//!
//! All time-dependent operations take `now`; the board never reads a clock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::analytics::{self, DailyTally, Summary};
use crate::community::CommunityBoard;
use crate::error::{BoardError, LifecycleError};
use crate::feedback::{self, DishRating, Feedback, NewFeedback};
use crate::geo::Coordinate;
use crate::lifecycle;
use crate::location::LocationDirectory;
use crate::metrics::{
    CLAIMS_EXPIRED_TOTAL, CLAIMS_TOTAL, CLAIM_CONFLICTS_TOTAL, FEEDBACK_TOTAL, POLL_VOTES_TOTAL, POSTED_TOTAL,
    REPORTS_TOTAL,
};
use crate::notification::{FoodNotification, NotificationId};
use crate::poll::{NewPoll, Poll};
use crate::ranking::{self, RankedLocation};
use crate::report::{LeftoverReport, NewReport};
use crate::store::{NotificationStore, SetClaimed};

/// Staff input for a new notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotification {
    pub name: String,
    /// Location id, or a hostel display name (normalized to the id).
    #[serde(default)]
    pub source_location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, source_location: impl Into<String>) -> Self {
        self.source_location = Some(source_location.into());
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

pub struct FoodBoard {
    store: Arc<dyn NotificationStore>,
    directory: LocationDirectory,
    community: CommunityBoard,
}

impl FoodBoard {
    pub fn new(store: Arc<dyn NotificationStore>, directory: LocationDirectory) -> Self {
        Self {
            store,
            directory,
            community: CommunityBoard::new(),
        }
    }

    pub fn directory(&self) -> &LocationDirectory {
        &self.directory
    }

    /// Create and store a notification. `created_at` defaults to `now`.
    pub async fn post(&self, req: NewNotification, now: DateTime<Utc>) -> Result<FoodNotification, BoardError> {
        let source_id = match req.source_location.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) => {
                let loc = self
                    .directory
                    .resolve(key)
                    .ok_or_else(|| BoardError::UnknownLocation(key.to_string()))?;
                if loc.id != key {
                    debug!(target: "board", key, id = %loc.id, "source given by name, normalized to id");
                }
                Some(loc.id.clone())
            }
        };

        let mut n = lifecycle::create(req.name, None, Some(req.created_at.unwrap_or(now)))?
            .with_source_location(source_id);
        if let Some(d) = req.description {
            n = n.with_description(d);
        }
        if let Some(u) = req.image_url {
            n = n.with_image_url(u);
        }

        self.store.insert(n.clone()).await?;
        counter!(POSTED_TOTAL).increment(1);
        info!(
            target: "board",
            id = %n.id(),
            source = n.source_location_id().unwrap_or("-"),
            "notification posted"
        );
        Ok(n)
    }

    pub async fn get(&self, id: &NotificationId) -> Result<FoodNotification, BoardError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| BoardError::NotFound(id.clone()))
    }

    /// Claim a notification. At most one caller wins per id; everyone else
    /// gets `AlreadyClaimed`, including those that lose a concurrent race.
    pub async fn claim(&self, id: &NotificationId, now: DateTime<Utc>) -> Result<FoodNotification, BoardError> {
        let current = self.get(id).await?;

        if let Err(e) = lifecycle::claim(&current, now) {
            match &e {
                LifecycleError::AlreadyClaimed(_) => counter!(CLAIM_CONFLICTS_TOTAL).increment(1),
                LifecycleError::Expired(_) => counter!(CLAIMS_EXPIRED_TOTAL).increment(1),
                LifecycleError::Validation(_) => {}
            }
            debug!(target: "board", %id, error = %e, "claim rejected");
            return Err(e.into());
        }

        match self.store.set_claimed(id, now).await? {
            SetClaimed::Claimed(n) => {
                counter!(CLAIMS_TOTAL).increment(1);
                info!(target: "board", %id, "notification claimed");
                Ok(n)
            }
            SetClaimed::AlreadyClaimed => {
                counter!(CLAIM_CONFLICTS_TOTAL).increment(1);
                warn!(target: "board", %id, "lost claim race");
                Err(LifecycleError::AlreadyClaimed(id.clone()).into())
            }
            SetClaimed::NotFound => Err(BoardError::NotFound(id.clone())),
        }
    }

    pub async fn all(&self) -> Result<Vec<FoodNotification>, BoardError> {
        Ok(self.store.list().await?)
    }

    /// Active notifications in posting order.
    pub async fn active(&self, now: DateTime<Utc>) -> Result<Vec<FoodNotification>, BoardError> {
        let all = self.store.list().await?;
        Ok(lifecycle::active(&all, now).cloned().collect())
    }

    pub async fn ranked(
        &self,
        user: Option<Coordinate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedLocation>, BoardError> {
        let all = self.store.list().await?;
        Ok(ranking::rank(self.directory.all(), &all, now, user))
    }

    pub async fn claimed_on(&self, day: NaiveDate) -> Result<usize, BoardError> {
        let all = self.store.list().await?;
        Ok(lifecycle::count_claimed_on_day(&all, day))
    }

    pub async fn daily_report(&self, now: DateTime<Utc>, days: u32) -> Result<Vec<DailyTally>, BoardError> {
        let all = self.store.list().await?;
        Ok(analytics::daily_report(&all, now, days))
    }

    pub async fn summary(&self, now: DateTime<Utc>) -> Result<Summary, BoardError> {
        let all = self.store.list().await?;
        Ok(analytics::summary(&all, now))
    }

    // ---- student side: feedback, reports, polls ----

    pub fn rate_dish(&self, req: NewFeedback, now: DateTime<Utc>) -> Result<Feedback, BoardError> {
        let f = Feedback::new(&req.dish_name, req.rating, req.comment.as_deref(), now)?;
        self.community.add_feedback(f.clone());
        counter!(FEEDBACK_TOTAL).increment(1);
        debug!(target: "board", dish = %f.dish_name, rating = f.rating, "feedback recorded");
        Ok(f)
    }

    /// Feedback entries, newest first.
    pub fn feedback(&self) -> Vec<Feedback> {
        self.community.feedback()
    }

    pub fn dish_ratings(&self) -> Vec<DishRating> {
        feedback::dish_ratings(&self.community.feedback())
    }

    /// Record a student report. A location matching the directory is linked
    /// by id; anything else is kept as free text.
    pub fn report_leftovers(&self, req: NewReport, now: DateTime<Utc>) -> Result<LeftoverReport, BoardError> {
        let location_id = self.directory.resolve(req.location.trim()).map(|l| l.id.clone());
        let r = LeftoverReport::create(req, location_id, now)?;
        self.community.add_report(r.clone());
        counter!(REPORTS_TOTAL).increment(1);
        info!(
            target: "board",
            id = %r.id,
            location = %r.location,
            freshness = r.freshness.label(),
            "leftovers reported"
        );
        Ok(r)
    }

    /// Reports, newest first.
    pub fn reports(&self) -> Vec<LeftoverReport> {
        self.community.reports()
    }

    pub fn open_poll(&self, req: NewPoll, now: DateTime<Utc>) -> Result<Poll, BoardError> {
        let p = Poll::open(&req.question, &req.options, req.expires_at, now)?;
        self.community.add_poll(p.clone());
        info!(target: "board", id = %p.id, options = p.options.len(), "poll opened");
        Ok(p)
    }

    pub fn polls(&self) -> Vec<Poll> {
        self.community.polls()
    }

    /// One vote per voter per poll; see [`Poll::vote`] for the checks.
    pub fn vote(&self, poll_id: &str, voter: &str, option_id: &str, now: DateTime<Utc>) -> Result<Poll, BoardError> {
        match self.community.vote(poll_id, voter, option_id, now) {
            Ok(p) => {
                counter!(POLL_VOTES_TOTAL).increment(1);
                Ok(p)
            }
            Err(e) => {
                debug!(target: "board", poll = poll_id, error = %e, "vote rejected");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommunityError;
    use crate::freshness::FreshnessTier;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 20, 0, 0).unwrap()
    }

    fn board() -> FoodBoard {
        FoodBoard::new(Arc::new(MemoryStore::new()), LocationDirectory::campus_seed())
    }

    #[tokio::test]
    async fn post_normalizes_name_to_id() {
        let b = board();
        let n = b.post(NewNotification::new("Pulao").at("Hostel C"), t0()).await.unwrap();
        assert_eq!(n.source_location_id(), Some("hC"));
        assert_eq!(n.created_at(), t0());
    }

    #[tokio::test]
    async fn post_rejects_unknown_location_and_blank_name() {
        let b = board();
        let err = b.post(NewNotification::new("Pulao").at("Hostel Z"), t0()).await.unwrap_err();
        assert!(matches!(err, BoardError::UnknownLocation(_)));

        let err = b.post(NewNotification::new(" "), t0()).await.unwrap_err();
        assert!(matches!(err, BoardError::Lifecycle(LifecycleError::Validation(_))));
        assert!(b.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claim_then_claim_again() {
        let b = board();
        let n = b.post(NewNotification::new("Halwa").at("hA"), t0()).await.unwrap();

        let c = b.claim(n.id(), t0() + Duration::minutes(1)).await.unwrap();
        assert!(c.is_claimed());

        let err = b.claim(n.id(), t0() + Duration::minutes(2)).await.unwrap_err();
        assert!(matches!(err, BoardError::Lifecycle(LifecycleError::AlreadyClaimed(_))));

        let stored = b.get(n.id()).await.unwrap();
        assert!(stored.is_claimed());
        assert_eq!(stored.claimed_at(), Some(t0() + Duration::minutes(1)));
    }

    #[tokio::test]
    async fn claim_after_expiry_is_rejected() {
        let b = board();
        let n = b.post(NewNotification::new("Halwa").at("hA"), t0()).await.unwrap();
        let err = b.claim(n.id(), t0() + Duration::minutes(60)).await.unwrap_err();
        assert!(matches!(err, BoardError::Lifecycle(LifecycleError::Expired(_))));
        assert!(!b.get(n.id()).await.unwrap().is_claimed());
    }

    #[tokio::test]
    async fn claim_unknown_id() {
        let b = board();
        let err = b.claim(&NotificationId::from("nope"), t0()).await.unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
    }

    #[tokio::test]
    async fn active_and_claimed_counts() {
        let b = board();
        let a = b.post(NewNotification::new("A").at("hA"), t0()).await.unwrap();
        b.post(NewNotification::new("B").at("hB").created(t0() - Duration::hours(2)), t0())
            .await
            .unwrap();
        b.post(NewNotification::new("C").at("hC"), t0()).await.unwrap();
        b.claim(a.id(), t0()).await.unwrap();

        let active: Vec<_> = b.active(t0()).await.unwrap().into_iter().map(|n| n.name().to_string()).collect();
        assert_eq!(active, vec!["C"]);
        assert_eq!(b.claimed_on(t0().date_naive()).await.unwrap(), 1);

        let ranked = b.ranked(None, t0()).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].location.id, "hC");
    }

    #[test]
    fn report_links_known_location() {
        let b = board();
        let r = b
            .report_leftovers(NewReport::new("Sandwiches", FreshnessTier::Fresh, "Hostel B"), t0())
            .unwrap();
        assert_eq!(r.location_id.as_deref(), Some("hB"));

        let r = b
            .report_leftovers(NewReport::new("Pizza", FreshnessTier::Spoiling, "Library Cafe"), t0() + Duration::minutes(1))
            .unwrap();
        assert!(r.location_id.is_none());

        let names: Vec<_> = b.reports().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Pizza", "Sandwiches"]);

        let err = b
            .report_leftovers(NewReport::new("Old rice", FreshnessTier::Expired, "hA"), t0())
            .unwrap_err();
        assert!(matches!(err, BoardError::Community(CommunityError::Validation(_))));
    }

    #[test]
    fn ratings_average_across_entries() {
        let b = board();
        for r in [5, 4, 3] {
            b.rate_dish(
                NewFeedback {
                    dish_name: "Chole".into(),
                    rating: r,
                    comment: None,
                },
                t0(),
            )
            .unwrap();
        }
        let err = b
            .rate_dish(
                NewFeedback {
                    dish_name: "Chole".into(),
                    rating: 0,
                    comment: None,
                },
                t0(),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::Community(CommunityError::Validation(_))));

        let ratings = b.dish_ratings();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].total_ratings, 3);
        assert!((ratings[0].average_rating - 4.0).abs() < 1e-9);
        assert_eq!(b.feedback().len(), 3);
    }

    #[test]
    fn poll_vote_flow() {
        let b = board();
        let p = b
            .open_poll(
                NewPoll {
                    question: "Friday dessert?".into(),
                    options: vec!["Kheer".into(), "Jalebi".into()],
                    expires_at: t0() + Duration::hours(3),
                },
                t0(),
            )
            .unwrap();

        let after = b.vote(&p.id, "stu-9", "o2", t0()).unwrap();
        assert_eq!(after.options[1].votes, 1);

        let err = b.vote(&p.id, "stu-9", "o1", t0()).unwrap_err();
        assert!(matches!(err, BoardError::Community(CommunityError::AlreadyVoted { .. })));
        assert_eq!(b.polls()[0].total_votes, 1);
    }
}
