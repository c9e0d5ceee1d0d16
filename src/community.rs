//! In-memory home of the student-facing records: menu feedback, leftover
//! reports and polls. Kept apart from [`crate::store::NotificationStore`];
//! these records are not part of the notification snapshot.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::CommunityError;
use crate::feedback::Feedback;
use crate::poll::Poll;
use crate::report::LeftoverReport;

#[derive(Debug, Default)]
struct Inner {
    feedback: Vec<Feedback>,
    reports: Vec<LeftoverReport>,
    polls: Vec<Poll>,
}

#[derive(Debug, Default)]
pub struct CommunityBoard {
    inner: RwLock<Inner>,
}

impl CommunityBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feedback(&self, f: Feedback) {
        self.inner.write().expect("community lock poisoned").feedback.push(f);
    }

    /// All feedback, newest first.
    pub fn feedback(&self) -> Vec<Feedback> {
        let g = self.inner.read().expect("community lock poisoned");
        let mut out = g.feedback.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn add_report(&self, r: LeftoverReport) {
        self.inner.write().expect("community lock poisoned").reports.push(r);
    }

    /// All reports, newest first.
    pub fn reports(&self) -> Vec<LeftoverReport> {
        let g = self.inner.read().expect("community lock poisoned");
        let mut out = g.reports.clone();
        out.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        out
    }

    pub fn add_poll(&self, p: Poll) {
        self.inner.write().expect("community lock poisoned").polls.push(p);
    }

    /// Polls in creation order.
    pub fn polls(&self) -> Vec<Poll> {
        self.inner.read().expect("community lock poisoned").polls.clone()
    }

    /// Vote under the write lock so a voter cannot slip in twice.
    pub fn vote(
        &self,
        poll_id: &str,
        voter: &str,
        option_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Poll, CommunityError> {
        let mut g = self.inner.write().expect("community lock poisoned");
        let poll = g
            .polls
            .iter_mut()
            .find(|p| p.id == poll_id)
            .ok_or_else(|| CommunityError::PollNotFound(poll_id.to_string()))?;
        poll.vote(voter, option_id, now)?;
        Ok(poll.clone())
    }
}
