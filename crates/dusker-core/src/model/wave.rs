use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ensure_finite, format_abbreviated};
use crate::errors::Result;

/// Wave - one ride within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    /// Unique identifier (UUID v7), immutable after creation
    pub id: Uuid,

    /// Owning session; a wave never exists without one
    pub session_id: Uuid,

    pub start_time: DateTime<Utc>,

    /// Expected to be >= `start_time`; not enforced
    pub end_time: DateTime<Utc>,

    /// Metres ridden
    pub distance: f64,

    /// Seconds
    pub duration: f64,

    pub max_speed: f64,

    /// Serialized track samples, see [`crate::model::track`]; opaque here
    pub coordinates: Vec<u8>,

    /// Detection confidence in [0, 1]; not enforced
    pub confidence: f64,
}

impl Wave {
    /// Mean speed over the ride, 0 for a zero-length ride
    pub fn average_speed(&self) -> f64 {
        if self.duration > 0.0 {
            self.distance / self.duration
        } else {
            0.0
        }
    }

    /// e.g. `"32s"`, minutes and seconds only
    pub fn formatted_duration(&self) -> String {
        format_abbreviated(self.duration.round() as i64, false)
    }

    pub(crate) fn ensure_finite(&self) -> Result<()> {
        ensure_finite(&[
            ("distance", self.distance),
            ("duration", self.duration),
            ("maxSpeed", self.max_speed),
            ("confidence", self.confidence),
        ])
    }

    /// Copy every ride field from `values`; `id` and `session_id` are left alone
    pub(crate) fn overwrite_from(&mut self, values: &Wave) {
        self.start_time = values.start_time;
        self.end_time = values.end_time;
        self.distance = values.distance;
        self.duration = values.duration;
        self.max_speed = values.max_speed;
        self.coordinates = values.coordinates.clone();
        self.confidence = values.confidence;
    }
}

/// Field values for a wave about to be added to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWave {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance: f64,
    pub duration: f64,
    pub max_speed: f64,
    pub coordinates: Vec<u8>,
    pub confidence: f64,
}

impl Default for NewWave {
    fn default() -> Self {
        let start = Utc::now();
        Self {
            start_time: start,
            end_time: start + Duration::seconds(30),
            distance: 0.0,
            duration: 0.0,
            max_speed: 0.0,
            coordinates: Vec::new(),
            confidence: 1.0,
        }
    }
}

impl NewWave {
    pub(crate) fn ensure_finite(&self) -> Result<()> {
        ensure_finite(&[
            ("distance", self.distance),
            ("duration", self.duration),
            ("maxSpeed", self.max_speed),
            ("confidence", self.confidence),
        ])
    }

    /// A 30-second ride starting at `start_time` with the given top speed
    pub fn starting_at(start_time: DateTime<Utc>, max_speed: f64) -> Self {
        Self {
            start_time,
            end_time: start_time + Duration::seconds(30),
            duration: 30.0,
            max_speed,
            ..Self::default()
        }
    }

    pub(crate) fn into_wave(self, id: Uuid, session_id: Uuid) -> Wave {
        Wave {
            id,
            session_id,
            start_time: self.start_time,
            end_time: self.end_time,
            distance: self.distance,
            duration: self.duration,
            max_speed: self.max_speed,
            coordinates: self.coordinates,
            confidence: self.confidence,
        }
    }
}
