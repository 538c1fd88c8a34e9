mod location;
mod offer;
mod profile;
mod ride;
mod transaction;
mod vacation;

pub use location::{Coordinates, LocationSample, LocationSource};
pub use offer::{Keyed, OfferId, OfferKind, OfferPool, OfferPools, RideOffer};
pub use profile::{DriverProfile, VehicleType};
pub use ride::{exists_ride_with_status, Ride, RideCommand, RideId, RideStatus};
pub use transaction::Transaction;
pub use vacation::{Vacation, VacationCommand, VacationId, VacationOffer, VacationStatus};
