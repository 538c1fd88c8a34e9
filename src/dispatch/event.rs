use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{OfferId, RideOffer, VacationOffer};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    NewRideRequest(RideRequest),
    RideTaken {
        ride_id: OfferId,
    },
    NewVacationRequest(VacationRequest),
    RideStatusUpdate,
    VacationStatusUpdate,
    #[serde(other)]
    Unrecognized,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RideRequest {
    pub ride_id: OfferId,
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub destination_address: String,
    pub distance_km: Option<f64>,
    pub estimated_fare: Option<f64>,
    pub vehicle_type: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VacationRequest {
    pub vacation_id: OfferId,
    #[serde(default)]
    pub destination: String,
    pub hotel_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_price: Option<f64>,
    pub passengers: Option<u32>,
    pub vehicle_type: Option<String>,
    pub pickup_address: Option<String>,
}

impl InboundEvent {
    /// Payloads that cannot be read are treated like an unknown event type.
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("malformed dispatch payload: {}", err);
                Self::Unrecognized
            }
        }
    }
}

impl From<RideRequest> for RideOffer {
    fn from(request: RideRequest) -> Self {
        RideOffer {
            id: request.ride_id,
            pickup_address: request.pickup_address,
            destination_address: request.destination_address,
            distance_km: request.distance_km,
            estimated_fare: request.estimated_fare,
            vehicle_type: request.vehicle_type,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            destination_lat: request.destination_lat,
            destination_lng: request.destination_lng,
        }
    }
}

impl From<VacationRequest> for VacationOffer {
    fn from(request: VacationRequest) -> Self {
        VacationOffer {
            id: request.vacation_id,
            destination: request.destination,
            hotel_name: request.hotel_name,
            start_date: request.start_date,
            end_date: request.end_date,
            total_price: request.total_price,
            passengers: request.passengers.unwrap_or(1),
            vehicle_type: request.vehicle_type,
            pickup_address: request.pickup_address,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundEvent {
    #[serde(rename = "SAFETY_ALERT")]
    SafetyAlert {
        message: String,
        level: AlertLevel,
        timestamp: DateTime<Utc>,
    },
}

impl OutboundEvent {
    pub fn safety_alert(message: impl Into<String>, level: AlertLevel) -> Self {
        Self::SafetyAlert {
            message: message.into(),
            level,
            timestamp: Utc::now(),
        }
    }
}
