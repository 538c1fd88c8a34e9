use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Engine;

/// Orders reconciliation polls so that a slow response never overwrites a
/// newer one.
#[derive(Default)]
pub(super) struct PollSequencer {
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl PollSequencer {
    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub(super) async fn poll(engine: Arc<Engine>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(engine.settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let periodic = tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => true,
            _ = engine.refresh.notified() => false,
        };

        if periodic && engine.is_blocked() {
            tracing::debug!("reconciliation paused while blocked");
            continue;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = engine.reconcile() => {}
        }
    }
}

impl Engine {
    /// Re-fetches every authoritative collection and replaces the local copy
    /// of each one that was fetched successfully. Returns false when a newer
    /// poll had already been applied.
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn reconcile(&self) -> bool {
        let generation = self.polls.issue();

        let (profile, available_rides, rides, available_vacations, vacations) = tokio::join!(
            self.api.current_profile(),
            self.api.available_rides(),
            self.api.rides(),
            self.api.available_vacations(),
            self.api.vacations(),
        );

        {
            let mut applied = self.polls.applied.lock().await;

            if generation <= *applied {
                tracing::debug!(generation, applied = *applied, "discarding stale poll");
                return false;
            }

            *applied = generation;

            let driver_id = match &profile {
                Ok(profile) => Some(profile.driver_id),
                Err(_) => self.profile.borrow().as_ref().map(|p| p.driver_id),
            };

            match (rides, driver_id) {
                (Ok(rides), Some(driver_id)) => {
                    let own = rides
                        .into_iter()
                        .filter(|ride| ride.driver_id == Some(driver_id))
                        .collect();

                    self.rides.send_replace(own);
                }
                (Ok(_), None) => tracing::warn!("driver unknown, keeping own rides"),
                (Err(err), _) => tracing::warn!(resource = "rides", "fetch failed: {}", err),
            }

            match vacations {
                Ok(vacations) => {
                    self.vacations.send_replace(vacations);
                }
                Err(err) => tracing::warn!(resource = "vacations", "fetch failed: {}", err),
            }

            match profile {
                Ok(profile) => self.apply_profile(profile),
                Err(err) => tracing::warn!(resource = "profile", "fetch failed: {}", err),
            }

            // pools are emptied while offline
            if self.is_online() {
                self.offers.send_modify(|pools| {
                    match available_rides {
                        Ok(offers) => pools.rides.replace(offers),
                        Err(err) => {
                            tracing::warn!(resource = "available_rides", "fetch failed: {}", err)
                        }
                    }

                    match available_vacations {
                        Ok(offers) => pools.vacations.replace(offers),
                        Err(err) => {
                            tracing::warn!(resource = "available_vacations", "fetch failed: {}", err)
                        }
                    }
                });
            }
        }

        self.sync_location().await;

        true
    }
}
