mod events;
mod lifecycle;
mod notifier;
mod reconcile;

pub use notifier::{LogNotifier, Notification, Notifier};

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::dispatch::{
    AlertLevel, ConnectionConfig, ConnectionHealth, ConnectionManager, Connector, Credentials,
    InboundEvent, OutboundEvent,
};
use crate::entities::{
    exists_ride_with_status, DriverProfile, LocationSample, OfferId, OfferPools, Ride,
    RideStatus, Transaction, Vacation,
};
use crate::error::{invalid_transition_error, Error};
use crate::geolocation::GeoStream;
use crate::location::{LocationAuthority, LocationConfig, Mode};
use crate::task::Worker;

use reconcile::PollSequencer;

const BUSY: [RideStatus; 2] = [RideStatus::Accepted, RideStatus::InProgress];

pub struct Services {
    pub api: DynAPI,
    pub connector: Arc<dyn Connector>,
    pub credentials: Arc<dyn Credentials>,
    pub geolocation: GeoStream,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub connection: ConnectionConfig,
    pub location: LocationConfig,
    pub poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            location: LocationConfig::default(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub session_id: Uuid,
    pub online: bool,
    pub blocked: bool,
    pub busy: bool,
    pub profile: Option<DriverProfile>,
    pub connection: ConnectionHealth,
    pub connection_degraded: bool,
    pub offers: OfferPools,
    pub rides: Vec<Ride>,
    pub vacations: Vec<Vacation>,
    pub location: Option<LocationSample>,
    pub location_mode: Mode,
    pub geolocation_available: bool,
}

/// Each collection the UI reads has exactly one writer path through this type.
pub struct Engine {
    id: Uuid,
    api: DynAPI,
    notifier: Arc<dyn Notifier>,
    settings: Settings,
    connection: ConnectionManager,
    location: LocationAuthority,
    events: async_channel::Receiver<InboundEvent>,
    profile: watch::Sender<Option<DriverProfile>>,
    offers: watch::Sender<OfferPools>,
    rides: watch::Sender<Vec<Ride>>,
    vacations: watch::Sender<Vec<Vacation>>,
    online: watch::Sender<bool>,
    in_flight: watch::Sender<HashSet<OfferId>>,
    blocked: AtomicBool,
    polls: PollSequencer,
    refresh: Notify,
    commands: Mutex<()>,
    session: Mutex<Vec<Worker>>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(services: Services, settings: Settings) -> Arc<Self> {
        let (events_tx, events) = async_channel::unbounded();

        let connection = ConnectionManager::new(
            services.connector,
            services.credentials,
            settings.connection,
            events_tx,
        );

        let location =
            LocationAuthority::new(services.api.clone(), services.geolocation, settings.location);

        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "driver session created");

        Arc::new(Self {
            id,
            api: services.api,
            notifier: services.notifier,
            settings,
            connection,
            location,
            events,
            profile: watch::channel(None).0,
            offers: watch::channel(OfferPools::default()).0,
            rides: watch::channel(vec![]).0,
            vacations: watch::channel(vec![]).0,
            online: watch::channel(false).0,
            in_flight: watch::channel(HashSet::new()).0,
            blocked: AtomicBool::new(false),
            polls: PollSequencer::default(),
            refresh: Notify::new(),
            commands: Mutex::new(()),
            session: Mutex::new(vec![]),
        })
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn start(self: &Arc<Self>) -> Result<(), Error> {
        let _guard = self.commands.lock().await;

        let profile = self.api.current_profile().await?;
        let available = profile.is_available;

        self.profile.send_replace(Some(profile));

        if available {
            self.start_session().await;
        }

        Ok(())
    }

    // availability on the server is left as is
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn shutdown(&self) {
        let _guard = self.commands.lock().await;

        self.stop_session().await;
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn toggle_online(self: &Arc<Self>) -> Result<bool, Error> {
        let _guard = self.commands.lock().await;

        let fetched = self.api.toggle_availability().await?;
        let online = fetched.is_available;

        self.apply_profile(fetched);

        if online {
            self.start_session().await;
        } else {
            self.stop_session().await;
        }

        tracing::info!(online, "availability toggled");

        Ok(online)
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn is_busy(&self) -> bool {
        let driver_id = self.profile.borrow().as_ref().map(|p| p.driver_id);
        let rides = self.rides.borrow();

        match driver_id {
            Some(driver_id) => exists_ride_with_status(&rides, driver_id, &BUSY),
            None => rides.iter().any(|ride| BUSY.contains(&ride.status)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.id,
            online: self.is_online(),
            blocked: self.is_blocked(),
            busy: self.is_busy(),
            profile: self.profile.borrow().clone(),
            connection: self.connection.health(),
            connection_degraded: self.connection.health().is_degraded(),
            offers: self.offers.borrow().clone(),
            rides: self.rides.borrow().clone(),
            vacations: self.vacations.borrow().clone(),
            location: self.location.current(),
            location_mode: self.location.mode(),
            geolocation_available: self.location.geolocation_available(),
        }
    }

    pub fn subscribe_offers(&self) -> watch::Receiver<OfferPools> {
        self.offers.subscribe()
    }

    pub fn subscribe_rides(&self) -> watch::Receiver<Vec<Ride>> {
        self.rides.subscribe()
    }

    pub fn subscribe_vacations(&self) -> watch::Receiver<Vec<Vacation>> {
        self.vacations.subscribe()
    }

    pub fn subscribe_location(&self) -> watch::Receiver<Option<LocationSample>> {
        self.location.subscribe()
    }

    pub fn subscribe_health(&self) -> watch::Receiver<ConnectionHealth> {
        self.connection.subscribe()
    }

    pub async fn reconnect(&self) -> Result<(), Error> {
        let _guard = self.commands.lock().await;

        if !self.is_online() {
            return Err(invalid_transition_error());
        }

        self.connection.connect().await;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_safety_alert(&self, message: String, level: AlertLevel) -> Result<(), Error> {
        let event = OutboundEvent::safety_alert(message, level);

        if let Err(err) = self.connection.send(&event).await {
            tracing::warn!("safety alert not delivered: {}", err);
            return Err(err);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.api.transactions().await
    }

    fn apply_profile(&self, fetched: DriverProfile) {
        let busy = self.is_busy();

        self.profile.send_modify(|profile| match profile {
            Some(current) => current.refresh(fetched, busy),
            None => *profile = Some(fetched),
        });
    }

    async fn sync_location(&self) {
        let driver_id = self.profile.borrow().as_ref().map(|p| p.driver_id);
        let rides = self.rides.borrow().clone();

        if let Some(driver_id) = driver_id {
            self.location.sync_with_rides(&rides, driver_id).await;
        }
    }

    async fn start_session(self: &Arc<Self>) {
        let mut session = self.session.lock().await;

        if !session.is_empty() {
            return;
        }

        // events from a previous connection are not replayed
        while self.events.try_recv().is_ok() {}

        self.online.send_replace(true);

        self.connection.connect().await;
        self.location.start().await;
        self.sync_location().await;

        let engine = self.clone();
        session.push(Worker::spawn("dispatch-events", move |cancel| {
            events::consume(engine, cancel)
        }));

        let engine = self.clone();
        session.push(Worker::spawn("reconciliation", move |cancel| {
            reconcile::poll(engine, cancel)
        }));

        tracing::info!(session_id = %self.id, "driver session started");
    }

    async fn stop_session(&self) {
        self.online.send_replace(false);

        let workers: Vec<Worker> = self.session.lock().await.drain(..).collect();

        for worker in workers {
            worker.stop().await;
        }

        self.connection.disconnect().await;
        self.location.stop().await;

        self.offers.send_modify(|pools| pools.clear());

        tracing::info!(session_id = %self.id, "driver session stopped");
    }
}
