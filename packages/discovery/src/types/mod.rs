//! Domain data types.

pub mod city;
pub mod config;
pub mod doctor;

pub use city::{CityInfo, CityTier};
pub use config::{ClientConfig, DiscoveryConfig, HeuristicsConfig};
pub use doctor::DoctorRecord;
