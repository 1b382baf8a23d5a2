//! Sea-ORM entities for the `providers`, `regions` and `availability_zones` tables

pub mod availability_zone;
pub mod provider;
pub mod region;
