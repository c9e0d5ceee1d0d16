//! # Notification store
//! Persistence seam for the board.
//!
//! The only write after insertion is [`NotificationStore::set_claimed`], a
//! conditional update: it succeeds at most once per id and every later call
//! observes `AlreadyClaimed`. Any backing technology (document store, SQL,
//! ...) has to honour that contract; [`MemoryStore`] does it under a write lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::error::StoreError;
use crate::notification::{FoodNotification, NotificationId};

/// Outcome of the conditional claim update.
#[derive(Debug, Clone, PartialEq)]
pub enum SetClaimed {
    Claimed(FoodNotification),
    AlreadyClaimed,
    NotFound,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, n: FoodNotification) -> Result<(), StoreError>;
    async fn get(&self, id: &NotificationId) -> Result<Option<FoodNotification>, StoreError>;
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<FoodNotification>, StoreError>;
    /// Flip `is_claimed` to true iff it is currently false.
    async fn set_claimed(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<SetClaimed, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<NotificationId, FoodNotification>,
    order: Vec<NotificationId>,
}

/// In-process store with optional JSON snapshot persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from existing records. Later duplicates of an id are skipped.
    pub fn from_records(records: Vec<FoodNotification>) -> Self {
        let mut inner = Inner::default();
        for n in records {
            if inner.by_id.contains_key(n.id()) {
                tracing::warn!(target: "store", id = %n.id(), "duplicate id in seed, skipping");
                continue;
            }
            inner.order.push(n.id().clone());
            inner.by_id.insert(n.id().clone(), n);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("store lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<FoodNotification> {
        let g = self.inner.read().expect("store lock poisoned");
        g.order
            .iter()
            .filter_map(|id| g.by_id.get(id).cloned())
            .collect()
    }

    /// Load a JSON snapshot. A missing file yields an empty store.
    pub async fn load_snapshot(path: &Path) -> Result<Self, StoreError> {
        match fs::read_to_string(path).await {
            Ok(s) => {
                let records: Vec<FoodNotification> = serde_json::from_str(&s)?;
                tracing::info!(
                    target: "store",
                    path = %path.display(),
                    records = records.len(),
                    "snapshot loaded"
                );
                Ok(Self::from_records(records))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write all records as pretty JSON, creating parent directories.
    ///
    /// The JSON goes to a sibling `.tmp` file first and is then renamed over
    /// `path`, so `path` always holds either the previous or the new snapshot.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let records = self.snapshot();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(&records)?;
        let tmp = temp_path(path);
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// `notifications.json` -> `notifications.json.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, n: FoodNotification) -> Result<(), StoreError> {
        let mut g = self.inner.write().expect("store lock poisoned");
        if g.by_id.contains_key(n.id()) {
            return Err(StoreError::Duplicate(n.id().clone()));
        }
        g.order.push(n.id().clone());
        g.by_id.insert(n.id().clone(), n);
        Ok(())
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<FoodNotification>, StoreError> {
        let g = self.inner.read().expect("store lock poisoned");
        Ok(g.by_id.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<FoodNotification>, StoreError> {
        Ok(self.snapshot())
    }

    async fn set_claimed(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<SetClaimed, StoreError> {
        let mut g = self.inner.write().expect("store lock poisoned");
        let Some(current) = g.by_id.get(id) else {
            return Ok(SetClaimed::NotFound);
        };
        if current.is_claimed() {
            return Ok(SetClaimed::AlreadyClaimed);
        }
        let claimed = current.to_claimed(at);
        g.by_id.insert(id.clone(), claimed.clone());
        Ok(SetClaimed::Claimed(claimed))
    }
}
