use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{Engine, Notification};
use crate::classifier::{classify_ride, classify_vacation, Classification};
use crate::dispatch::InboundEvent;
use crate::entities::{RideOffer, VacationOffer};

pub(super) async fn consume(engine: Arc<Engine>, cancel: CancellationToken) {
    let events = engine.events.clone();

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            event = events.recv() => match event {
                Ok(event) => event,
                Err(_) => return,
            },
        };

        engine.handle_event(event);
    }
}

impl Engine {
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub(super) fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::NewRideRequest(request) => self.offer_ride(request.into()),
            InboundEvent::NewVacationRequest(request) => self.offer_vacation(request.into()),
            InboundEvent::RideTaken { ride_id } => {
                let pooled = self.offers.send_if_modified(|pools| pools.withdraw(ride_id));
                let claimed = self.in_flight.send_if_modified(|ids| ids.remove(&ride_id));

                if pooled || claimed {
                    tracing::info!(ride_id, "offer taken by another driver");
                }
            }
            InboundEvent::RideStatusUpdate
            | InboundEvent::VacationStatusUpdate
            | InboundEvent::Unrecognized => self.refresh.notify_one(),
        }
    }

    fn offer_ride(&self, offer: RideOffer) {
        let classification = match self.profile.borrow().as_ref() {
            Some(profile) => classify_ride(&offer, profile),
            None => Classification::Accept,
        };

        if let Classification::Reject(reason) = classification {
            tracing::debug!(offer_id = offer.id, ?reason, "ride offer filtered out");
            return;
        }

        if !self.offers.send_if_modified(|pools| pools.rides.admit(offer.clone())) {
            tracing::debug!(offer_id = offer.id, "duplicate ride offer ignored");
            return;
        }

        self.raise(Notification::from(&offer));
    }

    fn offer_vacation(&self, offer: VacationOffer) {
        let classification = match self.profile.borrow().as_ref() {
            Some(profile) => classify_vacation(&offer, profile),
            None => Classification::Accept,
        };

        if let Classification::Reject(reason) = classification {
            tracing::debug!(offer_id = offer.id, ?reason, "vacation offer filtered out");
            return;
        }

        if !self
            .offers
            .send_if_modified(|pools| pools.vacations.admit(offer.clone()))
        {
            tracing::debug!(offer_id = offer.id, "duplicate vacation offer ignored");
            return;
        }

        self.raise(Notification::from(&offer));
    }

    fn raise(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(&notification) {
            tracing::warn!(offer_id = notification.offer_id, "notification failed: {}", err);
        }
    }
}
