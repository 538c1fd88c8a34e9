use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{
    Coordinates, DriverProfile, Ride, RideId, RideOffer, RideStatus, Transaction, Vacation,
    VacationCommand, VacationId, VacationOffer,
};
use crate::error::Error;

#[async_trait]
pub trait RideAPI {
    async fn available_rides(&self) -> Result<Vec<RideOffer>, Error>;
    async fn rides(&self) -> Result<Vec<Ride>, Error>;
    async fn update_ride_status(&self, id: RideId, status: RideStatus) -> Result<Ride, Error>;
    async fn cancel_ride(&self, id: RideId) -> Result<(), Error>;
}

#[async_trait]
pub trait VacationAPI {
    async fn available_vacations(&self) -> Result<Vec<VacationOffer>, Error>;
    async fn vacations(&self) -> Result<Vec<Vacation>, Error>;
    async fn update_vacation(
        &self,
        id: VacationId,
        command: VacationCommand,
    ) -> Result<Vacation, Error>;
}

#[async_trait]
pub trait DriverAPI {
    async fn current_profile(&self) -> Result<DriverProfile, Error>;
    async fn toggle_availability(&self) -> Result<DriverProfile, Error>;
    async fn update_location(&self, coordinates: Coordinates) -> Result<(), Error>;
    async fn transactions(&self) -> Result<Vec<Transaction>, Error>;
}

pub trait API: RideAPI + VacationAPI + DriverAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
