use serde::Serialize;

use crate::entities::{OfferId, OfferKind, RideOffer, VacationOffer};
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub kind: OfferKind,
    pub offer_id: OfferId,
    pub title: String,
    pub body: String,
}

impl From<&RideOffer> for Notification {
    fn from(offer: &RideOffer) -> Self {
        let fare = offer
            .estimated_fare
            .map(|fare| format!(" for ₹{:.0}", fare))
            .unwrap_or_default();

        Self {
            kind: OfferKind::Ride,
            offer_id: offer.id,
            title: "New ride request".into(),
            body: format!(
                "{} to {}{}",
                offer.pickup_address, offer.destination_address, fare
            ),
        }
    }
}

impl From<&VacationOffer> for Notification {
    fn from(offer: &VacationOffer) -> Self {
        Self {
            kind: OfferKind::Vacation,
            offer_id: offer.id,
            title: "New vacation request".into(),
            body: format!("{} for {} passenger(s)", offer.destination, offer.passengers),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), Error>;
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(
            kind = ?notification.kind,
            offer_id = notification.offer_id,
            "{}: {}",
            notification.title,
            notification.body
        );

        Ok(())
    }
}
