//! Regions Domain
//!
//! Regions are the geographic deployment areas of a cloud (or on-premises)
//! provider. Each region owns a set of availability zones.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Load, mutate, save; logging
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access, aggregate queries, zone cascade
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Region, AvailabilityZone, Provider, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_regions::{CreateRegion, PgRegionRepository, RegionService};
//! use sea_orm::Database;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//!
//! let service = RegionService::new(PgRegionRepository::new(db));
//! let region = service
//!     .create_region(CreateRegion::new(Uuid::now_v7(), "us-west-2", "US West", "ami-0123"))
//!     .await?;
//!
//! // deactivates the region and every zone it owns, or nothing at all
//! service.disable_region_and_zones(region.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod masking;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{RegionError, RegionResult};
pub use masking::MaskingPolicy;
pub use models::{
    AvailabilityZone, CreateAvailabilityZone, CreateRegion, Provider, Region, RegionSummary,
    RegionWithProvider,
};
pub use postgres::PgRegionRepository;
pub use repository::{InMemoryRegionRepository, RegionRepository};
pub use service::RegionService;
