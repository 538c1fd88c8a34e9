use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::{
    api::{DriverAPI, RideAPI, VacationAPI, API},
    dispatch::Credentials,
    entities::{
        Coordinates, DriverProfile, Ride, RideId, RideOffer, RideStatus, Transaction, Vacation,
        VacationCommand, VacationId, VacationOffer, VehicleType,
    },
    error::{missing_credential_error, not_found_error, status_error, Error},
};

pub struct RestClient {
    client: reqwest::Client,
    base: String,
    credentials: Arc<dyn Credentials>,
}

#[derive(Clone, Debug, Deserialize)]
struct User {
    id: i64,
    driver_profile: Option<DriverProfileData>,
}

#[derive(Clone, Debug, Deserialize)]
struct DriverProfileData {
    #[serde(default)]
    vehicle_type: VehicleType,
    city: Option<String>,
    #[serde(default)]
    is_available: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum VacationEnvelope {
    Wrapped { vacation: Vacation },
    Bare(Vacation),
}

#[derive(Serialize)]
struct StatusUpdate {
    status: RideStatus,
}

impl TryFrom<User> for DriverProfile {
    type Error = Error;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let profile = user.driver_profile.ok_or_else(|| not_found_error())?;

        Ok(DriverProfile {
            driver_id: user.id,
            vehicle_type: profile.vehicle_type,
            operating_city: profile.city.filter(|city| !city.trim().is_empty()),
            is_available: profile.is_available,
        })
    }
}

impl RestClient {
    pub fn new(base: impl Into<String>, credentials: Arc<dyn Credentials>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, Error> {
        let token = self
            .credentials
            .token()
            .ok_or_else(|| missing_credential_error())?;

        let url = format!("{}/{}", self.base, path);
        let mut request = self.client.request(method, url).bearer_auth(token);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let res = request.send().await?;
        let status_code = res.status().as_u16();

        if !res.status().is_success() {
            tracing::warn!(status_code, path, "ride-resource request failed");
            return Err(status_error(status_code));
        }

        Ok(res)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, Error> {
        let res = self.send(method, path, body).await?;

        Ok(res.json().await?)
    }
}

#[async_trait]
impl RideAPI for RestClient {
    #[tracing::instrument(skip(self))]
    async fn available_rides(&self) -> Result<Vec<RideOffer>, Error> {
        self.request(Method::GET, "rides/available", None).await
    }

    #[tracing::instrument(skip(self))]
    async fn rides(&self) -> Result<Vec<Ride>, Error> {
        self.request(Method::GET, "rides/", None).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_ride_status(&self, id: RideId, status: RideStatus) -> Result<Ride, Error> {
        let body = serde_json::to_value(StatusUpdate { status })?;

        self.request(Method::PATCH, &format!("rides/{}", id), Some(body))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, id: RideId) -> Result<(), Error> {
        self.send(Method::DELETE, &format!("rides/{}", id), None)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl VacationAPI for RestClient {
    #[tracing::instrument(skip(self))]
    async fn available_vacations(&self) -> Result<Vec<VacationOffer>, Error> {
        self.request(Method::GET, "vacation/available", None).await
    }

    #[tracing::instrument(skip(self))]
    async fn vacations(&self) -> Result<Vec<Vacation>, Error> {
        self.request(Method::GET, "vacation/", None).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_vacation(
        &self,
        id: VacationId,
        command: VacationCommand,
    ) -> Result<Vacation, Error> {
        let envelope: VacationEnvelope = self
            .request(
                Method::PATCH,
                &format!("vacation/{}/{}", id, command.name()),
                None,
            )
            .await?;

        match envelope {
            VacationEnvelope::Wrapped { vacation } | VacationEnvelope::Bare(vacation) => {
                Ok(vacation)
            }
        }
    }
}

#[async_trait]
impl DriverAPI for RestClient {
    #[tracing::instrument(skip(self))]
    async fn current_profile(&self) -> Result<DriverProfile, Error> {
        let user: User = self.request(Method::GET, "users/me", None).await?;

        user.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn toggle_availability(&self) -> Result<DriverProfile, Error> {
        let user: User = self
            .request(Method::PATCH, "users/driver/availability", None)
            .await?;

        user.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn update_location(&self, coordinates: Coordinates) -> Result<(), Error> {
        let body = json!({ "lat": coordinates.lat, "lng": coordinates.lng });

        self.send(Method::PATCH, "users/driver/location", Some(body))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.request(Method::GET, "users/transactions", None).await
    }
}

impl API for RestClient {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_without_driver_profile_is_not_a_driver() {
        let user: User = serde_json::from_str(r#"{"id": 1, "driver_profile": null}"#).unwrap();
        let result: Result<DriverProfile, Error> = user.try_into();

        assert_eq!(result.unwrap_err(), not_found_error());
    }

    #[test]
    fn driver_profile_is_read_from_user_payload() {
        let user: User = serde_json::from_str(
            r#"{"id": 9, "email": "d@x.in", "driver_profile": {"vehicle_type": "premium", "city": "Bangalore", "is_available": true, "rating": 4.9}}"#,
        )
        .unwrap();
        let profile: DriverProfile = user.try_into().unwrap();

        assert_eq!(profile.driver_id, 9);
        assert_eq!(profile.vehicle_type, VehicleType::Premium);
        assert_eq!(profile.operating_city.as_deref(), Some("Bangalore"));
        assert!(profile.is_available);
    }

    #[test]
    fn vacation_responses_may_be_wrapped() {
        let wrapped: VacationEnvelope = serde_json::from_str(
            r#"{"message": "ok", "vacation": {"id": 2, "status": "confirmed", "destination": "Goa"}}"#,
        )
        .unwrap();
        let bare: VacationEnvelope =
            serde_json::from_str(r#"{"id": 2, "status": "confirmed", "destination": "Goa"}"#)
                .unwrap();

        for envelope in [wrapped, bare] {
            match envelope {
                VacationEnvelope::Wrapped { vacation } | VacationEnvelope::Bare(vacation) => {
                    assert_eq!(vacation.id, 2)
                }
            }
        }
    }
}
