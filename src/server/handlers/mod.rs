pub mod offers;
pub mod rides;
pub mod safety;
pub mod session;
pub mod transactions;
pub mod vacations;
