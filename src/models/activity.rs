// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity record as returned by the activities API.
//!
//! Every metric field is optional: the upstream payload varies per sport and
//! per recording device, and the formatters degrade to placeholder strings
//! instead of failing. Fields we do not model are kept in `extra` so the
//! record re-serializes verbatim into the activities file and the prompt.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Activity summary from the activities-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Strava activity ID
    pub id: u64,
    /// Activity name/title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sport type (Run, Ride, Swim, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_type: Option<String>,
    /// Legacy activity type, used as fallback for `sport_type`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Distance in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Moving time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_time: Option<f64>,
    /// Elapsed time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    /// Average speed in m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
    /// Max speed in m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    /// Average heart rate in bpm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    /// Max heart rate in bpm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
    /// Total elevation gain in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elevation_gain: Option<f64>,
    /// Average power in watts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_watts: Option<f64>,
    /// Normalized power in watts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_average_watts: Option<f64>,
    /// Whether power came from a meter rather than an estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_watts: Option<bool>,
    /// Cadence (rpm / spm) depending on sport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cadence: Option<f64>,
    /// Average temperature in °C
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_temp: Option<f64>,
    /// Calories burned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Strava's relative effort score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffer_score: Option<f64>,
    /// Recorded on a trainer / in a pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer: Option<bool>,
    /// Start coordinates, empty for indoor activities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_latlng: Option<Vec<f64>>,
    /// Everything else the API sent, preserved for round-tripping
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Sport tag with the legacy `type` field as fallback.
    pub fn sport_tag(&self) -> Option<&str> {
        self.sport_type
            .as_deref()
            .or(self.activity_type.as_deref())
    }

    /// Activity id as the string key used by the critique store.
    pub fn id_key(&self) -> String {
        self.id.to_string()
    }

    /// Re-serialize the full record as a JSON value (typed fields + extras).
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sparse_activity() {
        let activity: Activity =
            serde_json::from_str(r#"{"id": 42, "name": "Morning Run"}"#).expect("should parse");
        assert_eq!(activity.id, 42);
        assert_eq!(activity.name.as_deref(), Some("Morning Run"));
        assert!(activity.distance.is_none());
        assert!(activity.sport_tag().is_none());
    }

    #[test]
    fn test_sport_tag_falls_back_to_type() {
        let activity: Activity =
            serde_json::from_str(r#"{"id": 1, "type": "Run"}"#).expect("should parse");
        assert_eq!(activity.sport_tag(), Some("Run"));

        let activity: Activity =
            serde_json::from_str(r#"{"id": 1, "type": "Run", "sport_type": "TrailRun"}"#)
                .expect("should parse");
        assert_eq!(activity.sport_tag(), Some("TrailRun"));
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let raw = r#"{"id": 7, "kudos_count": 3, "gear_id": "b123"}"#;
        let activity: Activity = serde_json::from_str(raw).expect("should parse");
        let value = activity.to_value();
        assert_eq!(value["kudos_count"], 3);
        assert_eq!(value["gear_id"], "b123");
        assert_eq!(value["id"], 7);
    }
}
