//! # Locations
//! Static reference set of hostels/messes where food is posted.
//!
//! - Loads from TOML (`[[locations]]` tables) or a JSON array.
//! - Lookup by id; display-name lookup is a compatibility shim for records
//!   that stored a hostel name instead of its id. Names are compared
//!   case-insensitively with punctuation and dashes collapsed.
//! - Fallback order for the config file: `$LOCATIONS_CONFIG_PATH` →
//!   `config/locations.toml` → `config/locations.json` → built-in campus seed.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::geo::Coordinate;

pub const ENV_LOCATIONS_CONFIG_PATH: &str = "LOCATIONS_CONFIG_PATH";
pub const DEFAULT_LOCATIONS_TOML: &str = "config/locations.toml";
pub const DEFAULT_LOCATIONS_JSON: &str = "config/locations.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Ordered, deduplicated set of locations.
#[derive(Debug, Clone, Default)]
pub struct LocationDirectory {
    locations: Vec<Location>,
}

impl LocationDirectory {
    /// Build from raw entries: trims ids/names, skips blanks, first id wins.
    pub fn new(items: Vec<Location>) -> Self {
        let mut seen = HashSet::new();
        let mut locations = Vec::with_capacity(items.len());
        for mut loc in items {
            loc.id = loc.id.trim().to_string();
            loc.name = loc.name.trim().to_string();
            if loc.id.is_empty() || loc.name.is_empty() {
                continue;
            }
            if seen.insert(loc.id.clone()) {
                locations.push(loc);
            }
        }
        Self { locations }
    }

    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Resolve a source key: exact id first, then normalized display name.
    pub fn resolve(&self, key: &str) -> Option<&Location> {
        resolve_in(&self.locations, key)
    }

    /// Built-in seed used when no config file is found.
    pub fn campus_seed() -> Self {
        Self::new(vec![
            Location::new("hA", "Hostel A", 30.3541, 76.3628),
            Location::new("hB", "Hostel B", 30.3532, 76.3655),
            Location::new("hC", "Hostel C", 30.3512, 76.3619),
            Location::new("hD", "Hostel D", 30.3504, 76.3642),
            Location::new("hJ", "Hostel J", 30.3569, 76.3702),
            Location::new("hM", "Hostel M", 30.3621, 76.3741),
        ])
    }
}

/// Id match, else display-name match. Shared by the directory and ranking.
pub(crate) fn resolve_in<'a>(locations: &'a [Location], key: &str) -> Option<&'a Location> {
    position_in(locations, key).map(|i| &locations[i])
}

/// Index of the location `key` refers to.
pub(crate) fn position_in(locations: &[Location], key: &str) -> Option<usize> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if let Some(i) = locations.iter().position(|l| l.id == key) {
        return Some(i);
    }
    let wanted = normalize_name(key);
    locations.iter().position(|l| normalize_name(&l.name) == wanted)
}

/// Lowercase, map dashes/underscores/dots to spaces, collapse whitespace.
pub(crate) fn normalize_name(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| match c {
            '—' | '–' | '-' | '_' | '.' | ',' | '\'' => ' ',
            other => other,
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Load locations from an explicit path. Supports TOML or JSON.
pub fn load_locations_from(path: &Path) -> Result<LocationDirectory> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading locations from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let items = parse_locations(&content, &ext)
        .with_context(|| format!("parsing locations from {}", path.display()))?;
    Ok(LocationDirectory::new(items))
}

/// Load locations using the env var, then the `config/` fallbacks, then the seed.
pub fn load_locations_default() -> Result<LocationDirectory> {
    if let Ok(p) = std::env::var(ENV_LOCATIONS_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!(
                "{ENV_LOCATIONS_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        return load_locations_from(&pb);
    }
    for candidate in [DEFAULT_LOCATIONS_TOML, DEFAULT_LOCATIONS_JSON] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_locations_from(&pb);
        }
    }
    tracing::info!(target: "config", "no locations config found, using campus seed");
    Ok(LocationDirectory::campus_seed())
}

fn parse_locations(s: &str, hint_ext: &str) -> Result<Vec<Location>> {
    if hint_ext == "json" {
        return parse_json(s);
    }
    if hint_ext == "toml" {
        return parse_toml(s);
    }
    parse_toml(s).or_else(|_| parse_json(s))
}

fn parse_toml(s: &str) -> Result<Vec<Location>> {
    #[derive(Deserialize)]
    struct TomlLocations {
        #[serde(default)]
        locations: Vec<Location>,
    }
    let v: TomlLocations = toml::from_str(s)?;
    Ok(v.locations)
}

fn parse_json(s: &str) -> Result<Vec<Location>> {
    let v: Vec<Location> = serde_json::from_str(s)?;
    Ok(v)
}
