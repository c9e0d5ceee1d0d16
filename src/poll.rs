//! # Polls
//! Multiple-choice questions with a closing time. Each voter gets one vote
//! per poll; a poll accepts votes strictly before `expires_at`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CommunityError;

/// Input for opening a poll.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    pub votes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_votes: u32,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    voters: HashSet<String>,
}

impl Poll {
    /// Open a poll. Needs a question, at least two distinct non-blank options
    /// and a closing time after `now`. Options get ids `o1`, `o2`, ...
    pub fn open(
        question: &str,
        options: &[String],
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, CommunityError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CommunityError::Validation("question must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        let mut texts = Vec::with_capacity(options.len());
        for text in options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            if seen.insert(text.to_lowercase()) {
                texts.push(text.to_string());
            }
        }
        if texts.len() < 2 {
            return Err(CommunityError::Validation(
                "a poll needs at least two distinct options".to_string(),
            ));
        }
        if expires_at <= now {
            return Err(CommunityError::Validation("expires_at must be in the future".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            options: texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| PollOption {
                    id: format!("o{}", i + 1),
                    text,
                    votes: 0,
                })
                .collect(),
            total_votes: 0,
            expires_at,
            voters: HashSet::new(),
        })
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.voters.contains(voter.trim())
    }

    /// Record `voter`'s vote for `option_id`.
    ///
    /// Checks in order: blank voter, closed poll, unknown option, repeat vote.
    /// On error the poll is unchanged.
    pub fn vote(&mut self, voter: &str, option_id: &str, now: DateTime<Utc>) -> Result<(), CommunityError> {
        let voter = voter.trim();
        if voter.is_empty() {
            return Err(CommunityError::Validation("voter must not be empty".to_string()));
        }
        if !self.is_open(now) {
            return Err(CommunityError::PollClosed(self.id.clone()));
        }
        let Some(idx) = self.options.iter().position(|o| o.id == option_id) else {
            return Err(CommunityError::UnknownOption {
                poll: self.id.clone(),
                option: option_id.to_string(),
            });
        };
        if !self.voters.insert(voter.to_string()) {
            return Err(CommunityError::AlreadyVoted {
                poll: self.id.clone(),
                voter: voter.to_string(),
            });
        }
        self.options[idx].votes += 1;
        self.total_votes += 1;
        Ok(())
    }

    /// Share of the vote for each option in percent, in option order. All zero
    /// while nobody has voted.
    pub fn shares_pct(&self) -> Vec<f64> {
        self.options
            .iter()
            .map(|o| {
                if self.total_votes == 0 {
                    0.0
                } else {
                    f64::from(o.votes) * 100.0 / f64::from(self.total_votes)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn opts(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn sunday_special() -> Poll {
        Poll::open(
            "Sunday special?",
            &opts(&["Chole Bhature", "Masala Dosa", "Pav Bhaji"]),
            t0() + Duration::days(1),
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn open_validates_input() {
        let later = t0() + Duration::hours(1);
        assert!(Poll::open(" ", &opts(&["a", "b"]), later, t0()).is_err());
        assert!(Poll::open("Q", &opts(&["a", " A ", ""]), later, t0()).is_err());
        assert!(Poll::open("Q", &opts(&["a", "b"]), t0(), t0()).is_err());

        let p = sunday_special();
        let ids: Vec<_> = p.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2", "o3"]);
        assert_eq!(p.total_votes, 0);
    }

    #[test]
    fn one_vote_per_voter() {
        let mut p = sunday_special();
        p.vote("stu-1", "o2", t0()).unwrap();
        p.vote("stu-2", "o2", t0()).unwrap();
        p.vote("stu-3", "o1", t0()).unwrap();

        let err = p.vote(" stu-1 ", "o3", t0()).unwrap_err();
        assert!(matches!(err, CommunityError::AlreadyVoted { .. }));
        assert!(p.has_voted("stu-1"));

        assert_eq!(p.total_votes, 3);
        assert_eq!(p.options[1].votes, 2);
        assert_eq!(p.options[2].votes, 0);
        let shares = p.shares_pct();
        assert!((shares[1] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn rejected_votes_leave_poll_unchanged() {
        let mut p = sunday_special();
        assert!(matches!(
            p.vote("stu-1", "o9", t0()),
            Err(CommunityError::UnknownOption { .. })
        ));
        assert!(matches!(p.vote("  ", "o1", t0()), Err(CommunityError::Validation(_))));
        let closed = p.expires_at;
        assert!(matches!(p.vote("stu-1", "o1", closed), Err(CommunityError::PollClosed(_))));

        assert_eq!(p.total_votes, 0);
        assert!(!p.has_voted("stu-1"));
        assert_eq!(p.shares_pct(), vec![0.0, 0.0, 0.0]);
    }
}
