use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use std::time::Instant;
use tracing::debug;

use crate::common::DatabaseError;

/// Outcome of a health probe
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: u128,
    pub error: Option<String>,
}

/// Run `SELECT 1` against the pool
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    debug!("Running PostgreSQL health check");

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
    db.query_one_raw(stmt)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;

    Ok(())
}

/// Like [`check_health`] but never fails; reports latency instead
pub async fn check_health_detailed(db: &DatabaseConnection) -> HealthStatus {
    let started = Instant::now();
    let result = check_health(db).await;
    let latency_ms = started.elapsed().as_millis();

    match result {
        Ok(()) => HealthStatus {
            healthy: true,
            latency_ms,
            error: None,
        },
        Err(e) => HealthStatus {
            healthy: false,
            latency_ms,
            error: Some(e.to_string()),
        },
    }
}
