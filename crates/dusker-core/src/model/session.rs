use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ensure_finite, format_abbreviated};
use crate::errors::Result;

/// Session - one recorded surf outing
///
/// `total_waves` and the lower bound of `max_speed` are owned by the
/// [`SessionStore`](crate::SessionStore); everything else is caller-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier (UUID v7), immutable after creation
    pub id: Uuid,

    pub start_date: DateTime<Utc>,

    /// `None` while the session is still running
    pub end_date: Option<DateTime<Utc>>,

    /// Free-text spot name
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Number of waves currently owned by this session
    pub total_waves: u32,

    /// Never below the fastest owned wave; may be set higher by the caller
    pub max_speed: f64,

    pub avg_heart_rate: f64,
    pub distance_surfed: f64,
    pub distance_paddled: f64,
    pub stroke_count: u32,
    pub notes: Option<String>,

    /// Sync flag; nothing in this workspace uploads
    pub is_uploaded: bool,
}

impl Session {
    /// Elapsed time, measured against `now` while the session is ongoing
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.end_date.unwrap_or(now) - self.start_date
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }

    /// e.g. `"1h 30m"`
    pub fn formatted_duration(&self, now: DateTime<Utc>) -> String {
        format_abbreviated(self.duration(now).num_seconds(), true)
    }

    /// `InvalidInput` if any metric is NaN or infinite
    pub(crate) fn ensure_finite(&self) -> Result<()> {
        ensure_finite(&[
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("maxSpeed", self.max_speed),
            ("avgHeartRate", self.avg_heart_rate),
            ("distanceSurfed", self.distance_surfed),
            ("distancePaddled", self.distance_paddled),
        ])
    }

    /// Copy every caller-owned field from `values`
    ///
    /// `id` and `total_waves` are left alone.
    pub(crate) fn overwrite_from(&mut self, values: &Session) {
        self.start_date = values.start_date;
        self.end_date = values.end_date;
        self.location = values.location.clone();
        self.latitude = values.latitude;
        self.longitude = values.longitude;
        self.max_speed = values.max_speed;
        self.avg_heart_rate = values.avg_heart_rate;
        self.distance_surfed = values.distance_surfed;
        self.distance_paddled = values.distance_paddled;
        self.stroke_count = values.stroke_count;
        self.notes = values.notes.clone();
        self.is_uploaded = values.is_uploaded;
    }
}

/// Field values for a session that does not exist yet
///
/// A new session always starts with zero waves, so there is no
/// `total_waves` here.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub max_speed: f64,
    pub avg_heart_rate: f64,
    pub distance_surfed: f64,
    pub distance_paddled: f64,
    pub stroke_count: u32,
    pub notes: Option<String>,
    pub is_uploaded: bool,
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            start_date: Utc::now(),
            end_date: None,
            location: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            max_speed: 0.0,
            avg_heart_rate: 0.0,
            distance_surfed: 0.0,
            distance_paddled: 0.0,
            stroke_count: 0,
            notes: None,
            is_uploaded: false,
        }
    }
}

impl NewSession {
    /// A session at `location` starting at `start_date`, everything else default
    pub fn at(location: impl Into<String>, start_date: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            start_date,
            ..Self::default()
        }
    }

    pub(crate) fn into_session(self, id: Uuid) -> Session {
        Session {
            id,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            total_waves: 0,
            max_speed: self.max_speed,
            avg_heart_rate: self.avg_heart_rate,
            distance_surfed: self.distance_surfed,
            distance_paddled: self.distance_paddled,
            stroke_count: self.stroke_count,
            notes: self.notes,
            is_uploaded: self.is_uploaded,
        }
    }
}
