//! In-process geo index for the "businesses near me" search

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;
pub const MAX_RESULTS: usize = 50;

#[derive(Debug, Clone)]
struct GeoEntry {
    latitude: f64,
    longitude: f64,
    category: Option<String>,
}

/// Indexed business locations
#[derive(Clone, Default)]
pub struct GeoIndex {
    entries: Arc<DashMap<Uuid, GeoEntry>>,
}

/// Coordinates within the WGS84 ranges
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance in kilometres
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

impl GeoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, id: Uuid, latitude: f64, longitude: f64, category: Option<String>) {
        self.entries.insert(
            id,
            GeoEntry {
                latitude,
                longitude,
                category,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Ids within `radius_km`, nearest first, at most `limit`.
    ///
    /// The category filter is case-insensitive.
    pub fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        limit: usize,
        category: Option<&str>,
    ) -> Vec<(Uuid, f64)> {
        let mut hits: Vec<(Uuid, f64)> = self
            .entries
            .iter()
            .filter(|e| match category {
                Some(c) => e
                    .category
                    .as_deref()
                    .is_some_and(|own| own.eq_ignore_ascii_case(c)),
                None => true,
            })
            .filter_map(|e| {
                let d = haversine_km(latitude, longitude, e.latitude, e.longitude);
                (d <= radius_km).then_some((*e.key(), d))
            })
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(limit);
        hits
    }
}
