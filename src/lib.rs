pub mod api;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod entities;
pub mod error;
pub mod external;
pub mod geolocation;
pub mod location;
pub mod server;
pub mod task;

#[cfg(test)]
mod testing;
