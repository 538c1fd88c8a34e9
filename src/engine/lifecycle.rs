use super::Engine;
use crate::entities::{
    OfferId, OfferKind, Ride, RideCommand, RideId, RideStatus, Vacation, VacationCommand,
    VacationId, VacationStatus,
};
use crate::error::{invalid_transition_error, not_found_error, Error};

fn upsert_ride(rides: &mut Vec<Ride>, ride: Ride) {
    match rides.iter_mut().find(|existing| existing.id == ride.id) {
        Some(existing) => *existing = ride,
        None => rides.push(ride),
    }
}

fn upsert_vacation(vacations: &mut Vec<Vacation>, vacation: Vacation) {
    match vacations.iter_mut().find(|existing| existing.id == vacation.id) {
        Some(existing) => *existing = vacation,
        None => vacations.push(vacation),
    }
}

impl Engine {
    /// Commits the driver to a pooled offer. Ride offers are refused while the
    /// driver already holds an accepted or in-progress ride.
    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn accept_offer(&self, kind: OfferKind, id: OfferId) -> Result<(), Error> {
        let _guard = self.commands.lock().await;

        match kind {
            OfferKind::Ride => self.accept_ride_offer(id).await,
            OfferKind::Vacation => self.confirm_vacation_offer(id).await,
        }
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn reject_offer(&self, kind: OfferKind, id: OfferId) -> Result<(), Error> {
        let _guard = self.commands.lock().await;

        match kind {
            OfferKind::Ride => self.reject_ride_offer(id).await,
            OfferKind::Vacation => self.reject_vacation_offer(id).await,
        }
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn start_ride(&self, id: RideId) -> Result<Ride, Error> {
        let _guard = self.commands.lock().await;

        self.advance_ride(id, RideCommand::Start).await
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn complete_ride(&self, id: RideId) -> Result<Ride, Error> {
        let _guard = self.commands.lock().await;

        self.advance_ride(id, RideCommand::Complete).await
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn cancel_ride(&self, id: RideId) -> Result<Ride, Error> {
        let _guard = self.commands.lock().await;

        self.advance_ride(id, RideCommand::Cancel).await
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn start_vacation(&self, id: VacationId) -> Result<Vacation, Error> {
        let _guard = self.commands.lock().await;

        self.advance_vacation(id, VacationCommand::Start).await
    }

    #[tracing::instrument(skip(self), fields(session_id = %self.id))]
    pub async fn complete_vacation(&self, id: VacationId) -> Result<Vacation, Error> {
        let _guard = self.commands.lock().await;

        self.advance_vacation(id, VacationCommand::Complete).await
    }

    async fn accept_ride_offer(&self, id: OfferId) -> Result<(), Error> {
        let offer = self
            .offers
            .borrow()
            .rides
            .get(id)
            .cloned()
            .ok_or_else(not_found_error)?;

        if self.is_busy() {
            tracing::info!(offer_id = id, "driver is busy, refusing offer");
            return Err(invalid_transition_error());
        }

        let status = RideStatus::Pending.transition(RideCommand::Accept)?;

        // withdrawn while the request is in flight
        self.claim(id);
        self.offers.send_modify(|pools| {
            pools.rides.remove(id);
        });

        let result = self.api.update_ride_status(id, status).await;
        let restorable = self.release(id);

        match result {
            Ok(ride) => {
                tracing::info!(ride_id = ride.id, "ride accepted");
                self.rides.send_modify(|rides| upsert_ride(rides, ride));
                self.sync_location().await;

                Ok(())
            }
            Err(err) => {
                tracing::warn!(offer_id = id, "failed to accept ride: {}", err);
                if restorable {
                    self.offers.send_modify(|pools| {
                        pools.rides.admit(offer);
                    });
                }

                Err(err)
            }
        }
    }

    async fn reject_ride_offer(&self, id: OfferId) -> Result<(), Error> {
        let offer = self
            .offers
            .borrow()
            .rides
            .get(id)
            .cloned()
            .ok_or_else(not_found_error)?;

        self.claim(id);
        self.offers.send_modify(|pools| {
            pools.rides.remove(id);
        });

        let result = self.api.cancel_ride(id).await;
        let restorable = self.release(id);

        if let Err(err) = result {
            tracing::warn!(offer_id = id, "failed to reject ride: {}", err);
            if restorable {
                self.offers.send_modify(|pools| {
                    pools.rides.admit(offer);
                });
            }

            return Err(err);
        }

        Ok(())
    }

    async fn confirm_vacation_offer(&self, id: OfferId) -> Result<(), Error> {
        self.settle_vacation_offer(id, VacationCommand::Confirm).await
    }

    async fn reject_vacation_offer(&self, id: OfferId) -> Result<(), Error> {
        self.settle_vacation_offer(id, VacationCommand::Reject).await
    }

    async fn settle_vacation_offer(&self, id: OfferId, command: VacationCommand) -> Result<(), Error> {
        let offer = self
            .offers
            .borrow()
            .vacations
            .get(id)
            .cloned()
            .ok_or_else(not_found_error)?;

        VacationStatus::Pending.transition(command)?;

        self.claim(id);
        self.offers.send_modify(|pools| {
            pools.vacations.remove(id);
        });

        let result = self.api.update_vacation(id, command).await;
        let restorable = self.release(id);

        match result {
            Ok(vacation) => {
                tracing::info!(vacation_id = id, command = command.name(), "vacation offer settled");

                if command == VacationCommand::Confirm {
                    self.vacations
                        .send_modify(|vacations| upsert_vacation(vacations, vacation));
                }

                Ok(())
            }
            Err(err) => {
                tracing::warn!(vacation_id = id, command = command.name(), "failed to settle vacation offer: {}", err);
                if restorable {
                    self.offers.send_modify(|pools| {
                        pools.vacations.admit(offer);
                    });
                }

                Err(err)
            }
        }
    }

    fn claim(&self, id: OfferId) {
        self.in_flight.send_modify(|ids| {
            ids.insert(id);
        });
    }

    /// False when the offer was taken by another driver while the request ran.
    fn release(&self, id: OfferId) -> bool {
        self.in_flight.send_if_modified(|ids| ids.remove(&id))
    }

    async fn advance_ride(&self, id: RideId, command: RideCommand) -> Result<Ride, Error> {
        let current = self
            .rides
            .borrow()
            .iter()
            .find(|ride| ride.id == id)
            .map(|ride| ride.status)
            .ok_or_else(not_found_error)?;

        let next = current.transition(command)?;

        let ride = self.api.update_ride_status(id, next).await?;
        tracing::info!(ride_id = id, status = ride.status.name(), "ride advanced");

        self.rides
            .send_modify(|rides| upsert_ride(rides, ride.clone()));
        self.sync_location().await;

        Ok(ride)
    }

    async fn advance_vacation(
        &self,
        id: VacationId,
        command: VacationCommand,
    ) -> Result<Vacation, Error> {
        let current = self
            .vacations
            .borrow()
            .iter()
            .find(|vacation| vacation.id == id)
            .map(|vacation| vacation.status)
            .ok_or_else(not_found_error)?;

        current.transition(command)?;

        let vacation = self.api.update_vacation(id, command).await?;
        tracing::info!(vacation_id = id, command = command.name(), "vacation advanced");

        self.vacations
            .send_modify(|vacations| upsert_vacation(vacations, vacation.clone()));

        Ok(vacation)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{engine, seeded_api};
    use super::*;
    use crate::dispatch::InboundEvent;
    use crate::error::ErrorKind;
    use crate::location::Mode;
    use crate::testing;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn pool_ride(engine: &Engine, id: OfferId) {
        engine.offers.send_modify(|pools| {
            pools.rides.admit(testing::ride_offer(id, "MG Road, Bangalore"));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn accepting_moves_the_offer_into_own_rides() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        pool_ride(&engine, 1);

        assert_ok!(engine.accept_offer(OfferKind::Ride, 1).await);

        let snapshot = engine.snapshot();
        assert!(snapshot.offers.rides.is_empty());
        assert_eq!(snapshot.rides[0].status, RideStatus::Accepted);
        assert!(snapshot.busy);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_driver_cannot_accept_and_nothing_is_sent() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        engine.rides.send_replace(vec![testing::ride(1, RideStatus::InProgress)]);
        pool_ride(&engine, 2);

        let err = engine.accept_offer(OfferKind::Ride, 2).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert!(api.calls().is_empty());
        assert!(engine.snapshot().offers.rides.contains(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_accept_restores_the_offer() {
        let api = seeded_api();
        api.fail("update_ride_status");
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        pool_ride(&engine, 3);

        let err = engine.accept_offer(OfferKind::Ride, 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        let snapshot = engine.snapshot();
        assert!(snapshot.offers.rides.contains(3));
        assert!(snapshot.rides.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn offer_taken_during_a_failed_accept_stays_gone() {
        let api = seeded_api();
        api.fail("update_ride_status");
        api.delay_next("update_ride_status", Duration::from_secs(5));
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        pool_ride(&engine, 9);

        let accept = tokio::spawn({
            let engine = engine.clone();
            async move { engine.accept_offer(OfferKind::Ride, 9).await }
        });
        while !api.calls().iter().any(|call| call == "update_ride_status") {
            tokio::task::yield_now().await;
        }

        engine.handle_event(InboundEvent::RideTaken { ride_id: 9 });

        assert!(accept.await.unwrap().is_err());
        assert!(!engine.snapshot().offers.rides.contains(9));
        assert!(engine.in_flight.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn illegal_transitions_never_reach_the_network() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.rides.send_replace(vec![
            testing::ride(1, RideStatus::Pending),
            testing::ride(2, RideStatus::InProgress),
        ]);

        let err = engine.start_ride(1).await.unwrap_err();
        assert!(err.is_invalid_transition_error());

        let err = engine.cancel_ride(2).await.unwrap_err();
        assert!(err.is_invalid_transition_error());

        let err = engine.complete_ride(42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ride_walks_through_its_lifecycle() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        pool_ride(&engine, 4);

        engine.accept_offer(OfferKind::Ride, 4).await.unwrap();
        let ride = engine.start_ride(4).await.unwrap();
        assert_eq!(ride.status, RideStatus::InProgress);

        let ride = engine.complete_ride(4).await.unwrap();
        assert_eq!(ride.status, RideStatus::Completed);
        assert!(!engine.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_ride_switches_to_simulated_location() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.profile.send_replace(Some(testing::profile()));
        engine.rides.send_replace(vec![testing::ride(5, RideStatus::Accepted)]);
        engine.location.start().await;

        engine.start_ride(5).await.unwrap();
        assert!(matches!(engine.location.mode(), Mode::Simulated(leg) if leg.ride_id == 5));

        engine.complete_ride(5).await.unwrap();
        assert_eq!(engine.location.mode(), Mode::Real);

        engine.location.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rejecting_a_ride_offer_restores_it_on_failure() {
        let api = seeded_api();
        let engine = engine(api.clone());
        pool_ride(&engine, 6);

        api.fail("cancel_ride");
        assert!(engine.reject_offer(OfferKind::Ride, 6).await.is_err());
        assert!(engine.snapshot().offers.rides.contains(6));

        api.recover("cancel_ride");
        assert_ok!(engine.reject_offer(OfferKind::Ride, 6).await);
        assert!(engine.snapshot().offers.rides.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn vacation_offers_follow_their_own_machine() {
        let api = seeded_api();
        let engine = engine(api.clone());
        engine.offers.send_modify(|pools| {
            pools.vacations.admit(testing::vacation_offer(7));
            pools.vacations.admit(testing::vacation_offer(8));
        });

        engine.accept_offer(OfferKind::Vacation, 7).await.unwrap();
        engine.reject_offer(OfferKind::Vacation, 8).await.unwrap();

        let snapshot = engine.snapshot();
        assert!(snapshot.offers.vacations.is_empty());
        assert_eq!(snapshot.vacations.len(), 1);
        assert_eq!(snapshot.vacations[0].status, VacationStatus::Confirmed);

        let vacation = engine.start_vacation(7).await.unwrap();
        assert_eq!(vacation.status, VacationStatus::InProgress);

        let vacation = engine.complete_vacation(7).await.unwrap();
        assert_eq!(vacation.status, VacationStatus::Completed);

        let err = engine.start_vacation(7).await.unwrap_err();
        assert!(err.is_invalid_transition_error());
    }
}
