use chrono::{DateTime, Utc};
use geo_types::Coord;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for Coord<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Coord {
            x: coordinates.lng,
            y: coordinates.lat,
        }
    }
}

impl From<Coord<f64>> for Coordinates {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Real,
    Simulated,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinates: Coordinates,
    pub captured_at: DateTime<Utc>,
    pub source: LocationSource,
}

impl LocationSample {
    pub fn real(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            captured_at: Utc::now(),
            source: LocationSource::Real,
        }
    }

    pub fn simulated(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            captured_at: Utc::now(),
            source: LocationSource::Simulated,
        }
    }
}
