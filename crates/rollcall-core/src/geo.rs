//! Great-circle distance and geolocation fix handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Radius around a session's registered point within which check-in is
/// permitted. Exactly on the boundary counts as inside.
pub const GEOFENCE_RADIUS_M: f64 = 100.0;

/// Base delay for user-initiated location retries.
const RETRY_BASE_MS: u64 = 500;
/// Delay stops doubling after this attempt.
const RETRY_MAX_ATTEMPT: u32 = 4;

/// A stored coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A geolocation reading as delivered by the platform location API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Haversine distance in meters between two lat/lng points.
///
/// Pure and total; non-finite inputs propagate as NaN, which the caller
/// is responsible for rejecting.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Signal-quality buckets for a reported accuracy radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyQuality {
    Good,
    Moderate,
    Poor,
    Unknown,
}

impl AccuracyQuality {
    /// Classify a reported accuracy in meters.
    pub fn classify(accuracy_m: f64) -> Self {
        if !accuracy_m.is_finite() {
            AccuracyQuality::Unknown
        } else if accuracy_m <= 30.0 {
            AccuracyQuality::Good
        } else if accuracy_m <= 70.0 {
            AccuracyQuality::Moderate
        } else {
            AccuracyQuality::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccuracyQuality::Good => "Good",
            AccuracyQuality::Moderate => "Moderate",
            AccuracyQuality::Poor => "Poor",
            AccuracyQuality::Unknown => "Unknown",
        }
    }
}

/// Delay before re-issuing a location request after `failure_count`
/// consecutive timeouts: 500ms doubling per attempt, capped at the fourth
/// attempt's delay. Retries are user-initiated; this only shapes the wait.
pub fn retry_backoff(failure_count: u32) -> Duration {
    let attempt = (failure_count + 1).min(RETRY_MAX_ATTEMPT);
    Duration::from_millis(RETRY_BASE_MS * 2u64.pow(attempt - 1))
}
