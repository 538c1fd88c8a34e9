use futures::StreamExt;
use geo_types::{Coord, Line};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::api::DynAPI;
use crate::entities::{Coordinates, LocationSample, LocationSource, Ride, RideId, RideStatus};
use crate::error::ErrorKind;
use crate::geolocation::GeoStream;
use crate::task::Worker;

#[derive(Clone, Copy, Debug)]
pub struct LocationConfig {
    pub sample_interval: Duration,
    pub simulation_steps: u32,
    pub simulation_interval: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(10),
            simulation_steps: 100,
            simulation_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Leg {
    pub ride_id: RideId,
    pub from: Coordinates,
    pub to: Coordinates,
}

/// Which producer owns the current location. Switching mode stops the old
/// producer before the new one starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    Off,
    Real,
    Simulated(Leg),
}

impl Mode {
    fn source(&self) -> Option<LocationSource> {
        match self {
            Self::Off => None,
            Self::Real => Some(LocationSource::Real),
            Self::Simulated(_) => Some(LocationSource::Simulated),
        }
    }
}

pub fn interpolate(from: Coordinates, to: Coordinates, progress: f64) -> Coordinates {
    let line = Line::new(Coord::from(from), Coord::from(to));
    let progress = progress.clamp(0.0, 1.0);

    (line.start + line.delta() * progress).into()
}

struct Shared {
    api: DynAPI,
    config: LocationConfig,
    source: Mutex<GeoStream>,
    mode: watch::Sender<Mode>,
    current: watch::Sender<Option<LocationSample>>,
    geolocation_available: watch::Sender<bool>,
}

impl Shared {
    async fn publish(&self, sample: LocationSample, cancel: &CancellationToken) {
        let mode = *self.mode.borrow();

        if mode.source() != Some(sample.source) {
            tracing::debug!(?mode, source = ?sample.source, "discarding location sample");
            return;
        }

        self.current.send_replace(Some(sample));

        tokio::select! {
            _ = cancel.cancelled() => {}
            result = self.api.update_location(sample.coordinates) => {
                if let Err(err) = result {
                    tracing::warn!("failed to publish location: {}", err);
                }
            }
        }
    }
}

pub struct LocationAuthority {
    shared: Arc<Shared>,
    producer: Mutex<Option<Worker>>,
}

impl LocationAuthority {
    pub fn new(api: DynAPI, source: GeoStream, config: LocationConfig) -> Self {
        let (mode, _) = watch::channel(Mode::Off);
        let (current, _) = watch::channel(None);
        let (geolocation_available, _) = watch::channel(true);

        Self {
            shared: Arc::new(Shared {
                api,
                config,
                source: Mutex::new(source),
                mode,
                current,
                geolocation_available,
            }),
            producer: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<LocationSample> {
        *self.shared.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LocationSample>> {
        self.shared.current.subscribe()
    }

    pub fn mode(&self) -> Mode {
        *self.shared.mode.borrow()
    }

    pub fn geolocation_available(&self) -> bool {
        *self.shared.geolocation_available.borrow()
    }

    pub async fn start(&self) {
        self.switch(|mode| match mode {
            Mode::Off => Mode::Real,
            other => other,
        })
        .await;
    }

    pub async fn stop(&self) {
        self.switch(|_| Mode::Off).await;
    }

    /// Simulates the driver's in-progress ride, or falls back to the device
    /// position when there is none. Does nothing while stopped.
    pub async fn sync_with_rides(&self, rides: &[Ride], driver_id: i64) {
        let mut in_progress = rides.iter().filter(|ride| {
            ride.status == RideStatus::InProgress && ride.driver_id.map_or(true, |id| id == driver_id)
        });

        let desired = match in_progress.next() {
            Some(ride) => {
                if let Some(other) = in_progress.next() {
                    tracing::warn!(
                        ride_id = ride.id,
                        other_ride_id = other.id,
                        "more than one ride in progress, simulating the first"
                    );
                }

                Mode::Simulated(Leg {
                    ride_id: ride.id,
                    from: ride.pickup(),
                    to: ride.destination(),
                })
            }
            None => Mode::Real,
        };

        self.switch(|mode| match mode {
            Mode::Off => Mode::Off,
            // an unchanged leg keeps its progress
            Mode::Simulated(leg) if desired == Mode::Simulated(leg) => mode,
            _ => desired,
        })
        .await;
    }

    #[tracing::instrument(skip_all)]
    async fn switch<F>(&self, decide: F)
    where
        F: FnOnce(Mode) -> Mode,
    {
        let mut producer = self.producer.lock().await;

        let current = *self.shared.mode.borrow();
        let next = decide(current);

        if next == current {
            return;
        }

        if let Some(worker) = producer.take() {
            worker.stop().await;
        }

        self.shared.mode.send_replace(next);
        tracing::info!(from = ?current, to = ?next, "location mode switched");

        let shared = self.shared.clone();

        *producer = match next {
            Mode::Off => None,
            Mode::Real => Some(Worker::spawn("real-location", move |cancel| {
                sample_device(shared, cancel)
            })),
            Mode::Simulated(leg) => Some(Worker::spawn("simulated-location", move |cancel| {
                simulate(shared, leg, cancel)
            })),
        };
    }
}

async fn sample_device(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(shared.config.sample_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let sample = {
            let mut source = shared.source.lock().await;

            tokio::select! {
                _ = cancel.cancelled() => return,
                sample = source.next() => sample,
            }
        };

        match sample {
            Some(Ok(coordinates)) => {
                shared.geolocation_available.send_replace(true);
                shared.publish(LocationSample::real(coordinates), &cancel).await;
            }
            Some(Err(err)) if err.kind() == ErrorKind::GeolocationUnavailable => {
                tracing::warn!("geolocation unavailable, device location stays idle");
                shared.geolocation_available.send_replace(false);
                return;
            }
            Some(Err(err)) => tracing::warn!("failed to sample device location: {}", err),
            None => {
                tracing::warn!("geolocation source ended");
                shared.geolocation_available.send_replace(false);
                return;
            }
        }
    }
}

async fn simulate(shared: Arc<Shared>, leg: Leg, cancel: CancellationToken) {
    let steps = shared.config.simulation_steps.max(1);

    for step in 1..=steps {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(shared.config.simulation_interval) => {}
        }

        let progress = f64::from(step) / f64::from(steps);
        let coordinates = interpolate(leg.from, leg.to, progress);

        shared
            .publish(LocationSample::simulated(coordinates), &cancel)
            .await;
    }

    tracing::info!(ride_id = leg.ride_id, "simulated ride reached its destination");
}
