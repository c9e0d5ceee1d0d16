//! Student-reported leftovers.
//!
//! Unlike staff notifications these carry a freshness label chosen by the
//! reporter instead of a countdown, and a free-text location that may or may
//! not match a configured hostel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CommunityError;
use crate::freshness::FreshnessTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeftoverReport {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub freshness: FreshnessTier,
    /// Location as typed by the reporter.
    pub location: String,
    /// Id of the matching configured location, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reported_at: DateTime<Utc>,
}

/// Reporter input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub freshness: FreshnessTier,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewReport {
    pub fn new(name: impl Into<String>, freshness: FreshnessTier, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            freshness,
            location: location.into(),
            image_url: None,
        }
    }
}

impl LeftoverReport {
    /// Validate `req`. Nobody reports food that is already gone, so an
    /// `Expired` label is rejected along with a blank name or location.
    pub fn create(
        req: NewReport,
        location_id: Option<String>,
        reported_at: DateTime<Utc>,
    ) -> Result<Self, CommunityError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(CommunityError::Validation("name must not be empty".to_string()));
        }
        let location = req.location.trim();
        if location.is_empty() {
            return Err(CommunityError::Validation("location must not be empty".to_string()));
        }
        if req.freshness == FreshnessTier::Expired {
            return Err(CommunityError::Validation(
                "freshness must be Fresh, Moderate or Spoiling".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: non_blank(req.description),
            freshness: req.freshness,
            location: location.to_string(),
            location_id,
            image_url: non_blank(req.image_url),
            reported_at,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
