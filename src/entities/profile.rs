use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Economy,
    Premium,
    Auto,
    Bike,
}

impl VehicleType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Premium => "premium",
            Self::Auto => "auto",
            Self::Bike => "bike",
        }
    }
}

impl Default for VehicleType {
    fn default() -> Self {
        Self::Economy
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub driver_id: i64,
    pub vehicle_type: VehicleType,
    pub operating_city: Option<String>,
    pub is_available: bool,
}

impl DriverProfile {
    /// Applies a freshly fetched profile. Vehicle type and city stay frozen
    /// while the driver holds an active ride.
    pub fn refresh(&mut self, fetched: DriverProfile, busy: bool) {
        if busy {
            self.is_available = fetched.is_available;
            return;
        }

        *self = fetched;
    }
}
