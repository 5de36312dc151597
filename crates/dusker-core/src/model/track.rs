//! Coordinate track payload carried in [`Wave::coordinates`](super::Wave)
//!
//! The payload is a JSON array of `{latitude, longitude, timestamp}` samples,
//! `timestamp` being seconds relative to the start of the ride. The store
//! moves it around as bytes and never decodes it.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: f64,
}

pub fn encode_track(points: &[GeoPoint]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(points)?)
}

/// Decode a payload; an empty payload is an empty track
pub fn decode_track(bytes: &[u8]) -> Result<Vec<GeoPoint>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(bytes)?)
}
