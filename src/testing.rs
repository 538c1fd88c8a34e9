//! In-memory collaborators shared by the unit tests.

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use crate::api::{DriverAPI, RideAPI, VacationAPI, API};
use crate::dispatch::{Connector, Credentials, Link};
use crate::entities::{
    Coordinates, DriverProfile, Ride, RideId, RideOffer, RideStatus, Transaction, Vacation,
    VacationCommand, VacationId, VacationOffer, VacationStatus, VehicleType,
};
use crate::error::{channel_error, disconnected_error, not_found_error, upstream_error, Error};

pub const DRIVER_ID: i64 = 7;

pub fn profile() -> DriverProfile {
    DriverProfile {
        driver_id: DRIVER_ID,
        vehicle_type: VehicleType::Economy,
        operating_city: Some("Bangalore".into()),
        is_available: false,
    }
}

pub fn ride(id: RideId, status: RideStatus) -> Ride {
    Ride {
        id,
        status,
        rider_id: 99,
        driver_id: Some(DRIVER_ID),
        vacation_id: None,
        pickup_address: "MG Road, Bangalore".into(),
        destination_address: "Whitefield, Bangalore".into(),
        pickup_lat: 12.90,
        pickup_lng: 77.50,
        destination_lat: 13.00,
        destination_lng: 77.60,
        estimated_fare: Some(320.0),
    }
}

pub fn ride_offer(id: RideId, pickup: &str) -> RideOffer {
    RideOffer {
        id,
        pickup_address: pickup.into(),
        destination_address: "Whitefield, Bangalore".into(),
        distance_km: Some(14.5),
        estimated_fare: Some(320.0),
        vehicle_type: Some("economy".into()),
        pickup_lat: Some(12.90),
        pickup_lng: Some(77.50),
        destination_lat: Some(13.00),
        destination_lng: Some(77.60),
    }
}

pub fn vacation_offer(id: VacationId) -> VacationOffer {
    VacationOffer {
        id,
        destination: "Mysore".into(),
        hotel_name: Some("Lalitha Mahal".into()),
        start_date: Some("2026-11-02".into()),
        end_date: Some("2026-11-05".into()),
        total_price: Some(18000.0),
        passengers: 2,
        vehicle_type: None,
        pickup_address: None,
    }
}

pub fn vacation(id: VacationId, status: VacationStatus) -> Vacation {
    Vacation {
        id,
        status,
        destination: "Mysore".into(),
        hotel_name: Some("Lalitha Mahal".into()),
        start_date: Some("2026-11-02".into()),
        end_date: Some("2026-11-05".into()),
        total_price: Some(18000.0),
        passengers: 2,
    }
}

/// Waits, on the paused clock, until the watched value satisfies `predicate`.
pub async fn wait_for<T>(rx: &mut watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) {
    tokio::time::timeout(Duration::from_secs(3600), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state sender dropped");
}

#[derive(Default)]
pub struct FakeState {
    pub profile: Option<DriverProfile>,
    pub available_rides: Vec<RideOffer>,
    pub rides: Vec<Ride>,
    pub available_vacations: Vec<VacationOffer>,
    pub vacations: Vec<Vacation>,
    pub transactions: Vec<Transaction>,
    pub failing: HashSet<&'static str>,
    pub delays: HashMap<&'static str, VecDeque<Duration>>,
    pub calls: Vec<String>,
    pub locations: Vec<Coordinates>,
}

/// A ride-resource service kept in memory. Responses are captured when the
/// call arrives and released after any scripted delay.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.with(|state| state.failing.insert(endpoint));
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.with(|state| state.failing.remove(endpoint));
    }

    pub fn delay_next(&self, endpoint: &'static str, delay: Duration) {
        self.with(|state| state.delays.entry(endpoint).or_default().push_back(delay));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|state| state.calls.clone())
    }

    pub fn published_locations(&self) -> Vec<Coordinates> {
        self.with(|state| state.locations.clone())
    }

    async fn respond<T>(
        &self,
        endpoint: &'static str,
        f: impl FnOnce(&mut FakeState) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let (result, delay) = self.with(|state| {
            state.calls.push(endpoint.to_string());

            let delay = state
                .delays
                .get_mut(endpoint)
                .and_then(|delays| delays.pop_front());

            let result = if state.failing.contains(endpoint) {
                Err(upstream_error())
            } else {
                f(state)
            };

            (result, delay)
        });

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result
    }
}

fn upsert_ride(rides: &mut Vec<Ride>, ride: Ride) {
    match rides.iter_mut().find(|existing| existing.id == ride.id) {
        Some(existing) => *existing = ride,
        None => rides.push(ride),
    }
}

#[async_trait]
impl RideAPI for FakeApi {
    async fn available_rides(&self) -> Result<Vec<RideOffer>, Error> {
        self.respond("available_rides", |state| Ok(state.available_rides.clone()))
            .await
    }

    async fn rides(&self) -> Result<Vec<Ride>, Error> {
        self.respond("rides", |state| Ok(state.rides.clone())).await
    }

    async fn update_ride_status(&self, id: RideId, status: RideStatus) -> Result<Ride, Error> {
        self.respond("update_ride_status", |state| {
            let mut ride = match state.rides.iter().find(|ride| ride.id == id) {
                Some(ride) => ride.clone(),
                None => {
                    let offer = state
                        .available_rides
                        .iter()
                        .find(|offer| offer.id == id)
                        .cloned()
                        .unwrap_or_else(|| ride_offer(id, "MG Road, Bangalore"));

                    Ride {
                        pickup_address: offer.pickup_address,
                        destination_address: offer.destination_address,
                        ..ride(id, status)
                    }
                }
            };

            ride.status = status;
            ride.driver_id = state.profile.as_ref().map(|p| p.driver_id).or(Some(DRIVER_ID));
            state.available_rides.retain(|offer| offer.id != id);
            upsert_ride(&mut state.rides, ride.clone());

            Ok(ride)
        })
        .await
    }

    async fn cancel_ride(&self, id: RideId) -> Result<(), Error> {
        self.respond("cancel_ride", |state| {
            state.available_rides.retain(|offer| offer.id != id);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl VacationAPI for FakeApi {
    async fn available_vacations(&self) -> Result<Vec<VacationOffer>, Error> {
        self.respond("available_vacations", |state| {
            Ok(state.available_vacations.clone())
        })
        .await
    }

    async fn vacations(&self) -> Result<Vec<Vacation>, Error> {
        self.respond("vacations", |state| Ok(state.vacations.clone()))
            .await
    }

    async fn update_vacation(
        &self,
        id: VacationId,
        command: VacationCommand,
    ) -> Result<Vacation, Error> {
        self.respond("update_vacation", |state| {
            let current = state
                .vacations
                .iter()
                .find(|vacation| vacation.id == id)
                .cloned()
                .unwrap_or_else(|| vacation(id, VacationStatus::Pending));

            let updated = Vacation {
                status: current.status.transition(command)?,
                ..current
            };

            state.available_vacations.retain(|offer| offer.id != id);
            state.vacations.retain(|vacation| vacation.id != id);
            state.vacations.push(updated.clone());

            Ok(updated)
        })
        .await
    }
}

#[async_trait]
impl DriverAPI for FakeApi {
    async fn current_profile(&self) -> Result<DriverProfile, Error> {
        self.respond("current_profile", |state| {
            state.profile.clone().ok_or_else(not_found_error)
        })
        .await
    }

    async fn toggle_availability(&self) -> Result<DriverProfile, Error> {
        self.respond("toggle_availability", |state| {
            let profile = state.profile.as_mut().ok_or_else(not_found_error)?;
            profile.is_available = !profile.is_available;

            Ok(profile.clone())
        })
        .await
    }

    async fn update_location(&self, coordinates: Coordinates) -> Result<(), Error> {
        self.respond("update_location", |state| {
            state.locations.push(coordinates);
            Ok(())
        })
        .await
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.respond("transactions", |state| Ok(state.transactions.clone()))
            .await
    }
}

impl API for FakeApi {}

pub struct StaticCredentials {
    token: Mutex<Option<String>>,
}

impl StaticCredentials {
    pub fn new(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self {
            token: Mutex::new(None),
        }
    }

    pub fn set(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.into());
    }
}

impl Credentials for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

/// The server end of an in-memory link. Dropping it closes the link.
pub struct LinkHandle {
    inbound: mpsc::UnboundedSender<Result<String, Error>>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl LinkHandle {
    pub fn push(&self, text: &str) {
        self.inbound.unbounded_send(Ok(text.into())).unwrap();
    }

    pub async fn next_outbound(&mut self) -> String {
        self.outbound.next().await.expect("link closed")
    }
}

pub fn link() -> (Link, LinkHandle) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded();
    let (outbound_tx, outbound_rx) = mpsc::unbounded::<String>();

    let link = Link {
        incoming: inbound_rx.boxed(),
        outgoing: Box::pin(outbound_tx.sink_map_err(channel_error)),
    };

    let handle = LinkHandle {
        inbound: inbound_tx,
        outbound: outbound_rx,
    };

    (link, handle)
}

/// Hands out prepared links in order; opens fail once they run out.
pub struct FakeConnector {
    opens: AtomicUsize,
    links: Mutex<VecDeque<Link>>,
}

impl FakeConnector {
    pub fn failing() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            links: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_links(count: usize) -> (Self, Vec<LinkHandle>) {
        let (links, handles): (VecDeque<Link>, Vec<LinkHandle>) = (0..count).map(|_| link()).unzip();

        let connector = Self {
            opens: AtomicUsize::new(0),
            links: Mutex::new(links),
        };

        (connector, handles)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(&self, _token: &str) -> Result<Link, Error> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        self.links
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(disconnected_error)
    }
}
