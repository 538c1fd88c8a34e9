use serde::{Deserialize, Serialize};

use crate::entities::{Keyed, OfferId};
use crate::error::{invalid_transition_error, Error};

pub type VacationId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VacationOffer {
    pub id: OfferId,
    #[serde(default)]
    pub destination: String,
    pub hotel_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_price: Option<f64>,
    #[serde(default = "one")]
    pub passengers: u32,
    pub vehicle_type: Option<String>,
    pub pickup_address: Option<String>,
}

impl Keyed for VacationOffer {
    fn key(&self) -> OfferId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vacation {
    pub id: VacationId,
    pub status: VacationStatus,
    #[serde(default)]
    pub destination: String,
    pub hotel_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_price: Option<f64>,
    #[serde(default = "one")]
    pub passengers: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationCommand {
    Confirm,
    Reject,
    Start,
    Complete,
}

impl VacationCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::Complete => "complete",
        }
    }
}

impl VacationStatus {
    pub fn transition(self, command: VacationCommand) -> Result<VacationStatus, Error> {
        match (self, command) {
            (Self::Pending, VacationCommand::Confirm) => Ok(Self::Confirmed),
            (Self::Pending, VacationCommand::Reject) => Ok(Self::Cancelled),
            (Self::Confirmed, VacationCommand::Start) => Ok(Self::InProgress),
            (Self::InProgress, VacationCommand::Complete) => Ok(Self::Completed),
            _ => Err(invalid_transition_error()),
        }
    }
}

fn one() -> u32 {
    1
}
