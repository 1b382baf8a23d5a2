//! PostgreSQL plumbing shared by the domain crates
//!
//! - connection management with pool settings and retry ([`postgres`])
//! - a migration runner generic over any `MigratorTrait`
//! - a `SELECT 1` health probe
//! - [`BaseRepository`], the thin sea-orm wrapper domain repositories build on
//!
//! # Features
//!
//! - `postgres` (default) - SeaORM-backed PostgreSQL support
//! - `config` - `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config(PostgresConfig::new("postgresql://localhost/regions")).await?;
//! postgres::run_migrations::<Migrator>(&db, "region-admin").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod repository;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use repository::BaseRepository;
