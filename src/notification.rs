//! # Food notifications
//! The record a staff member posts when surplus food is available.
//!
//! Records are immutable apart from the one-way claim transition, which always
//! produces a new value (see [`crate::lifecycle::claim`]). Nothing in the crate
//! mutates a notification in place.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LifecycleError;

/// Opaque notification identifier. New records get a UUID v4; ids loaded from
/// older snapshots are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A posted batch of surplus food.
///
/// Invariant: `is_claimed` is true iff `claimed_at` is set, and once true it
/// never goes back to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNotification {
    id: NotificationId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    source_location_id: Option<String>,
    #[serde(default)]
    is_claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claimed_at: Option<DateTime<Utc>>,
}

impl FoodNotification {
    /// Create a fresh, unclaimed notification.
    ///
    /// `created_at` defaults to the current instant. A blank `name` is rejected
    /// with [`LifecycleError::Validation`].
    pub fn create(
        name: impl Into<String>,
        source_location_id: Option<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Self, LifecycleError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(LifecycleError::Validation(
                "name must not be empty".to_string(),
            ));
        }

        let source_location_id = source_location_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            id: NotificationId::generate(),
            name: name.to_string(),
            description: None,
            image_url: None,
            created_at: created_at.unwrap_or_else(Utc::now),
            source_location_id,
            is_claimed: false,
            claimed_at: None,
        })
    }

    /// Attach a free-text description (builder style). Blank text is dropped.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into());
        self
    }

    /// Attach an image URL (builder style). Blank text is dropped.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = non_blank(url.into());
        self
    }

    /// Replace the generated id. Used when importing records that already
    /// carry an identifier.
    pub fn with_id(mut self, id: impl Into<NotificationId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn source_location_id(&self) -> Option<&str> {
        self.source_location_id.as_deref()
    }

    pub fn is_claimed(&self) -> bool {
        self.is_claimed
    }

    pub fn claimed_at(&self) -> Option<DateTime<Utc>> {
        self.claimed_at
    }

    /// The claimed copy of this record. Callers check preconditions first.
    pub(crate) fn to_claimed(&self, at: DateTime<Utc>) -> Self {
        Self {
            is_claimed: true,
            claimed_at: Some(at),
            ..self.clone()
        }
    }

    /// Rewrite the source key (legacy display name -> location id).
    pub(crate) fn with_source_location(mut self, id: Option<String>) -> Self {
        self.source_location_id = id;
        self
    }
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
