use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{invalid_transition_error, Error};

pub type RideId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub status: RideStatus,
    pub rider_id: i64,
    pub driver_id: Option<i64>,
    pub vacation_id: Option<i64>,
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub destination_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub estimated_fare: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RideCommand {
    Accept,
    Start,
    Cancel,
    Complete,
}

impl RideStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[tracing::instrument]
    pub fn transition(self, command: RideCommand) -> Result<RideStatus, Error> {
        match (self, command) {
            (Self::Pending, RideCommand::Accept) => Ok(Self::Accepted),
            (Self::Accepted, RideCommand::Start) => Ok(Self::InProgress),
            (Self::Accepted, RideCommand::Cancel) => Ok(Self::Cancelled),
            (Self::InProgress, RideCommand::Complete) => Ok(Self::Completed),
            _ => Err(invalid_transition_error()),
        }
    }
}

impl Ride {
    pub fn pickup(&self) -> Coordinates {
        Coordinates {
            lat: self.pickup_lat,
            lng: self.pickup_lng,
        }
    }

    pub fn destination(&self) -> Coordinates {
        Coordinates {
            lat: self.destination_lat,
            lng: self.destination_lng,
        }
    }
}

pub fn exists_ride_with_status(rides: &[Ride], driver_id: i64, statuses: &[RideStatus]) -> bool {
    rides
        .iter()
        .filter(|ride| ride.driver_id.map_or(true, |id| id == driver_id))
        .any(|ride| statuses.contains(&ride.status))
}
