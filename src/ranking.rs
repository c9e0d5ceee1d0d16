//! # Proximity ranking
//! Which hostels have food right now, and how far away are they?
//!
//! Notifications are filtered through [`crate::lifecycle::is_active`], grouped
//! by their source location and, when the user's position is known, sorted by
//! haversine distance. Locations without active food never appear.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::geo::Coordinate;
use crate::lifecycle::is_active;
use crate::location::{position_in, Location};
use crate::notification::FoodNotification;

/// Distance to a location, or a marker that it was not computed.
///
/// `Unknown` serializes as the string `"unknown"` so a display layer cannot
/// mistake it for 0 km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Km(f64),
    Unknown,
}

impl Distance {
    pub fn km(&self) -> Option<f64> {
        match self {
            Distance::Km(d) => Some(*d),
            Distance::Unknown => None,
        }
    }
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Distance::Km(d) => serializer.serialize_f64(*d),
            Distance::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedLocation {
    pub location: Location,
    pub notifications: Vec<FoodNotification>,
    #[serde(rename = "distance_km")]
    pub distance: Distance,
}

/// Rank `locations` that currently have active food.
///
/// With `user` set the result is ascending by distance, ties broken by id.
/// Without it the input order of `locations` is kept and every entry carries
/// [`Distance::Unknown`].
pub fn rank(
    locations: &[Location],
    notifications: &[FoodNotification],
    now: DateTime<Utc>,
    user: Option<Coordinate>,
) -> Vec<RankedLocation> {
    let mut buckets: Vec<Vec<FoodNotification>> = vec![Vec::new(); locations.len()];

    for n in notifications.iter().filter(|n| is_active(n, now)) {
        let Some(key) = n.source_location_id() else {
            continue;
        };
        if let Some(idx) = position_in(locations, key) {
            buckets[idx].push(n.clone());
        }
    }

    let mut ranked: Vec<RankedLocation> = locations
        .iter()
        .zip(buckets)
        .filter(|(_, food)| !food.is_empty())
        .map(|(loc, food)| RankedLocation {
            distance: match user {
                Some(u) => Distance::Km(u.distance_km_to(&loc.coordinate())),
                None => Distance::Unknown,
            },
            location: loc.clone(),
            notifications: food,
        })
        .collect();

    if user.is_some() {
        ranked.sort_by(|a, b| {
            let da = a.distance.km().unwrap_or(f64::INFINITY);
            let db = b.distance.km().unwrap_or(f64::INFINITY);
            da.total_cmp(&db).then_with(|| a.location.id.cmp(&b.location.id))
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 19, 30, 0).unwrap()
    }

    fn food(src: &str, mins_ago: i64) -> FoodNotification {
        lifecycle::create("Rajma", Some(src.to_string()), Some(t0() - Duration::minutes(mins_ago)))
            .unwrap()
    }

    fn hostels() -> Vec<Location> {
        vec![
            Location::new("hA", "Hostel A", 0.0, 0.0),
            Location::new("hB", "Hostel B", 0.0, 0.1),
            Location::new("hC", "Hostel C", 0.0, 0.05),
        ]
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        assert!(rank(&[], &[], t0(), None).is_empty());
        assert!(rank(&hostels(), &[], t0(), Some(Coordinate::new(0.0, 0.0))).is_empty());
    }

    #[test]
    fn without_user_keeps_input_order_and_unknown_distance() {
        let ns = vec![food("hC", 1), food("hA", 1)];
        let out = rank(&hostels(), &ns, t0(), None);
        let ids: Vec<_> = out.iter().map(|r| r.location.id.as_str()).collect();
        assert_eq!(ids, vec!["hA", "hC"]);
        assert!(out.iter().all(|r| r.distance == Distance::Unknown));
    }

    #[test]
    fn with_user_sorts_by_distance() {
        let ns = vec![food("hB", 1), food("hA", 1), food("hC", 1)];
        let out = rank(&hostels(), &ns, t0(), Some(Coordinate::new(0.0, 0.1)));
        let ids: Vec<_> = out.iter().map(|r| r.location.id.as_str()).collect();
        assert_eq!(ids, vec!["hB", "hC", "hA"]);
        assert_eq!(out[0].distance.km(), Some(0.0));
    }

    #[test]
    fn ties_break_on_id() {
        let locs = vec![
            Location::new("z", "Zed", 0.0, 0.0),
            Location::new("a", "Ay", 0.0, 0.0),
        ];
        let ns = vec![food("z", 1), food("a", 1)];
        let out = rank(&locs, &ns, t0(), Some(Coordinate::new(1.0, 1.0)));
        assert_eq!(out[0].location.id, "a");
        assert_eq!(out[1].location.id, "z");
    }

    #[test]
    fn expired_claimed_and_orphans_are_dropped() {
        let claimed = lifecycle::claim(&food("hB", 1), t0()).unwrap();
        let ns = vec![
            food("hA", 61),
            claimed,
            food("nowhere", 1),
            lifecycle::create("Campus-wide", None, Some(t0())).unwrap(),
        ];
        assert!(rank(&hostels(), &ns, t0(), None).is_empty());
    }

    #[test]
    fn legacy_name_keys_are_grouped_under_the_id() {
        let ns = vec![food("Hostel B", 1), food("hB", 2)];
        let out = rank(&hostels(), &ns, t0(), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].location.id, "hB");
        assert_eq!(out[0].notifications.len(), 2);
    }

    #[test]
    fn unknown_distance_serializes_as_marker() {
        let v = serde_json::to_value(Distance::Unknown).unwrap();
        assert_eq!(v, serde_json::json!("unknown"));
        let v = serde_json::to_value(Distance::Km(2.5)).unwrap();
        assert_eq!(v, serde_json::json!(2.5));
    }
}
