use serde::Serialize;
use std::collections::HashSet;

use crate::entities::{DriverProfile, RideOffer, VacationOffer, VehicleType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    VehicleMismatch,
    OutsideOperatingCity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Accept,
    Reject(RejectReason),
}

impl Classification {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|token| token.chars().count() > 2)
        .map(|token| token.to_lowercase())
        .collect()
}

fn vehicle_matches(offered: Option<&str>, profile: &DriverProfile) -> bool {
    let offered = offered.unwrap_or(VehicleType::default().name());

    offered.eq_ignore_ascii_case(profile.vehicle_type.name())
}

fn city_matches(pickup: &str, profile: &DriverProfile) -> bool {
    let city = match profile.operating_city.as_deref() {
        Some(city) => city,
        None => return true,
    };

    !tokenize(city).is_disjoint(&tokenize(pickup))
}

pub fn classify_ride(offer: &RideOffer, profile: &DriverProfile) -> Classification {
    if !vehicle_matches(offer.vehicle_type.as_deref(), profile) {
        return Classification::Reject(RejectReason::VehicleMismatch);
    }

    if !city_matches(&offer.pickup_address, profile) {
        return Classification::Reject(RejectReason::OutsideOperatingCity);
    }

    Classification::Accept
}

/// Vacation payloads carry fewer fields than ride payloads; a rule only applies
/// when the field it inspects is present.
pub fn classify_vacation(offer: &VacationOffer, profile: &DriverProfile) -> Classification {
    if let Some(vehicle_type) = offer.vehicle_type.as_deref() {
        if !vehicle_matches(Some(vehicle_type), profile) {
            return Classification::Reject(RejectReason::VehicleMismatch);
        }
    }

    if let Some(pickup) = offer.pickup_address.as_deref() {
        if !city_matches(pickup, profile) {
            return Classification::Reject(RejectReason::OutsideOperatingCity);
        }
    }

    Classification::Accept
}
