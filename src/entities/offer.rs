use serde::{Deserialize, Serialize};

use crate::entities::VacationOffer;

pub type OfferId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    #[serde(alias = "local")]
    Ride,
    Vacation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideOffer {
    pub id: OfferId,
    #[serde(default)]
    pub pickup_address: String,
    #[serde(default)]
    pub destination_address: String,
    pub distance_km: Option<f64>,
    pub estimated_fare: Option<f64>,
    pub vehicle_type: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
}

pub trait Keyed {
    fn key(&self) -> OfferId;
}

impl Keyed for RideOffer {
    fn key(&self) -> OfferId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OfferPool<T> {
    entries: Vec<T>,
}

impl<T> Default for OfferPool<T> {
    fn default() -> Self {
        Self { entries: vec![] }
    }
}

impl<T: Keyed> OfferPool<T> {
    pub fn contains(&self, id: OfferId) -> bool {
        self.entries.iter().any(|entry| entry.key() == id)
    }

    pub fn get(&self, id: OfferId) -> Option<&T> {
        self.entries.iter().find(|entry| entry.key() == id)
    }

    /// Returns false, leaving the existing entry in place, when the id is
    /// already pooled.
    pub fn admit(&mut self, offer: T) -> bool {
        if self.contains(offer.key()) {
            return false;
        }

        self.entries.insert(0, offer);
        true
    }

    pub fn remove(&mut self, id: OfferId) -> Option<T> {
        let index = self.entries.iter().position(|entry| entry.key() == id)?;
        Some(self.entries.remove(index))
    }

    pub fn replace(&mut self, offers: Vec<T>) {
        self.entries.clear();

        for offer in offers {
            if !self.contains(offer.key()) {
                self.entries.push(offer);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OfferPools {
    pub rides: OfferPool<RideOffer>,
    pub vacations: OfferPool<VacationOffer>,
}

impl OfferPools {
    pub fn withdraw(&mut self, id: OfferId) -> bool {
        let ride = self.rides.remove(id).is_some();
        let vacation = self.vacations.remove(id).is_some();

        ride || vacation
    }

    pub fn clear(&mut self) {
        self.rides.clear();
        self.vacations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: OfferId, pickup: &str) -> RideOffer {
        RideOffer {
            id,
            pickup_address: pickup.into(),
            destination_address: "Airport".into(),
            distance_km: Some(12.0),
            estimated_fare: Some(240.0),
            vehicle_type: Some("economy".into()),
            pickup_lat: None,
            pickup_lng: None,
            destination_lat: None,
            destination_lng: None,
        }
    }

    #[test]
    fn duplicate_admission_keeps_the_original_entry() {
        let mut pool = OfferPool::default();

        assert!(pool.admit(offer(1, "MG Road")));
        assert!(!pool.admit(offer(1, "Somewhere else")));

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(1).map(|o| o.pickup_address.as_str()), Some("MG Road"));
    }

    #[test]
    fn newest_offers_come_first() {
        let mut pool = OfferPool::default();
        pool.admit(offer(1, "a"));
        pool.admit(offer(2, "b"));

        let ids: Vec<OfferId> = pool.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn replace_is_wholesale_and_deduplicated() {
        let mut pool = OfferPool::default();
        pool.admit(offer(1, "a"));

        pool.replace(vec![offer(2, "b"), offer(3, "c"), offer(2, "dup")]);

        let ids: Vec<OfferId> = pool.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn withdraw_clears_both_pools() {
        let mut pools = OfferPools::default();
        pools.rides.admit(offer(4, "a"));

        assert!(pools.withdraw(4));
        assert!(!pools.withdraw(4));
        assert!(pools.rides.is_empty());
    }
}
