use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement,
};
use uuid::Uuid;

use crate::{
    entity::{availability_zone, provider, region},
    error::{RegionError, RegionResult},
    models::{AvailabilityZone, Region, RegionSummary, RegionWithProvider},
    repository::RegionRepository,
};

const OWNED_REGION_SQL: &str = r#"
SELECT r.id, r.code, r.name
FROM regions r
JOIN providers p ON p.id = r.provider_id
WHERE r.id = $1 AND p.id = $2 AND p.customer_id = $3
"#;

const VALID_REGIONS_SQL: &str = r#"
SELECT r.id, r.code, r.name
FROM regions r
JOIN providers p ON p.id = r.provider_id
LEFT JOIN availability_zones z ON z.region_id = r.id
WHERE p.id = $1 AND p.customer_id = $2
GROUP BY r.id, r.code, r.name
HAVING COUNT(z.id) >= $3
ORDER BY r.code
"#;

#[derive(Debug, FromQueryResult)]
struct RegionSummaryRow {
    id: Uuid,
    code: String,
    name: String,
}

impl From<RegionSummaryRow> for RegionSummary {
    fn from(row: RegionSummaryRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
        }
    }
}

fn db_error(e: DbErr) -> RegionError {
    RegionError::Internal(format!("Database error: {}", e))
}

/// Map insert/update failures on `regions` to domain errors
fn write_error(e: DbErr, region: &Region) -> RegionError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RegionError::DuplicateCode {
            provider_id: region.provider_id,
            code: region.code.clone(),
        },
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            RegionError::ProviderNotFound(region.provider_id)
        }
        _ => match e {
            DbErr::RecordNotUpdated => RegionError::NotFound(region.id),
            other => db_error(other),
        },
    }
}

pub struct PgRegionRepository {
    base: BaseRepository<region::Entity>,
}

impl PgRegionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Both cascade updates on an open transaction
    ///
    /// `None` when the region row does not exist.
    async fn deactivate(txn: &DatabaseTransaction, region_id: Uuid) -> Result<Option<u64>, DbErr> {
        let now = chrono::Utc::now();

        let region = region::Entity::update_many()
            .col_expr(region::Column::Active, Expr::value(false))
            .col_expr(region::Column::UpdatedAt, Expr::value(now))
            .filter(region::Column::Id.eq(region_id))
            .exec(txn)
            .await?;
        if region.rows_affected == 0 {
            return Ok(None);
        }

        let zones = availability_zone::Entity::update_many()
            .col_expr(availability_zone::Column::Active, Expr::value(false))
            .col_expr(availability_zone::Column::UpdatedAt, Expr::value(now))
            .filter(availability_zone::Column::RegionId.eq(region_id))
            .exec(txn)
            .await?;

        Ok(Some(zones.rows_affected))
    }
}

#[async_trait]
impl RegionRepository for PgRegionRepository {
    async fn create(&self, region: Region) -> RegionResult<Region> {
        let active_model: region::ActiveModel = (&region).into();

        let model = self
            .base
            .insert(active_model)
            .await
            .map_err(|e| write_error(e, &region))?;

        model.try_into()
    }

    async fn save(&self, region: Region) -> RegionResult<Region> {
        let active_model: region::ActiveModel = (&region).into();

        let model = self
            .base
            .update(active_model)
            .await
            .map_err(|e| write_error(e, &region))?;

        model.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> RegionResult<Option<Region>> {
        let model = self.base.find_by_id(id).await.map_err(db_error)?;

        model.map(Region::try_from).transpose()
    }

    async fn find_with_provider(&self, id: Uuid) -> RegionResult<Option<RegionWithProvider>> {
        let row = region::Entity::find_by_id(id)
            .find_also_related(provider::Entity)
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        match row {
            None => Ok(None),
            Some((region, Some(provider))) => Ok(Some(RegionWithProvider {
                region: region.try_into()?,
                provider: provider.into(),
            })),
            Some((region, None)) => Err(RegionError::DataIntegrity(format!(
                "region {} references missing provider {}",
                region.id, region.provider_id
            ))),
        }
    }

    async fn find_by_code(&self, provider_id: Uuid, code: &str) -> RegionResult<Option<Region>> {
        // two rows are enough to detect a broken uniqueness invariant
        let mut models = region::Entity::find()
            .filter(region::Column::ProviderId.eq(provider_id))
            .filter(region::Column::Code.eq(code))
            .limit(2)
            .all(self.base.db())
            .await
            .map_err(db_error)?;

        if models.len() > 1 {
            return Err(RegionError::DataIntegrity(format!(
                "multiple regions with code '{}' for provider {}",
                code, provider_id
            )));
        }

        models.pop().map(Region::try_from).transpose()
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> RegionResult<Vec<Region>> {
        let models = region::Entity::find()
            .filter(region::Column::ProviderId.eq(provider_id))
            .order_by_asc(region::Column::Code)
            .all(self.base.db())
            .await
            .map_err(db_error)?;

        models.into_iter().map(Region::try_from).collect()
    }

    async fn find_owned(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        region_id: Uuid,
    ) -> RegionResult<Option<RegionSummary>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            OWNED_REGION_SQL,
            [region_id.into(), provider_id.into(), customer_id.into()],
        );

        let row = RegionSummaryRow::find_by_statement(stmt)
            .one(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(row.map(Into::into))
    }

    async fn fetch_valid_regions(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        min_zone_count: u32,
    ) -> RegionResult<Vec<RegionSummary>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            VALID_REGIONS_SQL,
            [
                provider_id.into(),
                customer_id.into(),
                i64::from(min_zone_count).into(),
            ],
        );

        let rows = RegionSummaryRow::find_by_statement(stmt)
            .all(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn disable_region_and_zones(&self, region_id: Uuid) -> RegionResult<u64> {
        let cascade_failed = |e: DbErr| RegionError::CascadeFailed {
            region_id,
            reason: e.to_string(),
        };

        let txn = self.base.begin().await.map_err(cascade_failed)?;

        match Self::deactivate(&txn, region_id).await {
            Ok(Some(zones)) => {
                txn.commit().await.map_err(cascade_failed)?;
                Ok(zones)
            }
            Ok(None) => {
                txn.rollback().await.map_err(cascade_failed)?;
                Err(RegionError::NotFound(region_id))
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(region_id = %region_id, error = %rollback, "Rollback failed");
                }
                Err(cascade_failed(e))
            }
        }
    }

    async fn add_zone(&self, zone: AvailabilityZone) -> RegionResult<AvailabilityZone> {
        let active_model: availability_zone::ActiveModel = (&zone).into();

        let model = active_model
            .insert(self.base.db())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    RegionError::NotFound(zone.region_id)
                }
                Some(SqlErr::UniqueConstraintViolation(_)) => RegionError::DuplicateZone(zone.id),
                _ => db_error(e),
            })?;

        Ok(model.into())
    }

    async fn list_zones(&self, region_id: Uuid) -> RegionResult<Vec<AvailabilityZone>> {
        let models = availability_zone::Entity::find()
            .filter(availability_zone::Column::RegionId.eq(region_id))
            .order_by_asc(availability_zone::Column::Code)
            .all(self.base.db())
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn region_model(provider_id: Uuid, code: &str) -> region::Model {
        let now = Utc::now().into();
        region::Model {
            id: Uuid::now_v7(),
            provider_id,
            code: code.to_string(),
            name: code.to_string(),
            image: "ami-1".to_string(),
            latitude: Some(0.0),
            longitude: Some(0.0),
            active: true,
            details: None,
            config: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn executed_sql(db: DatabaseConnection) -> Vec<String> {
        db.into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements())
            .map(|stmt| stmt.sql.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_find_by_code_single_match() {
        let provider_id = Uuid::now_v7();
        let model = region_model(provider_id, "us-east-1");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model.clone()]])
            .into_connection();
        let repo = PgRegionRepository::new(db);

        let region = repo
            .find_by_code(provider_id, "us-east-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(region.id, model.id);
    }

    #[tokio::test]
    async fn test_find_by_code_two_matches_is_integrity_fault() {
        let provider_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                region_model(provider_id, "dc-1"),
                region_model(provider_id, "dc-1"),
            ]])
            .into_connection();
        let repo = PgRegionRepository::new(db);

        let result = repo.find_by_code(provider_id, "dc-1").await;
        assert!(matches!(result, Err(RegionError::DataIntegrity(_))));
    }

    #[tokio::test]
    async fn test_cascade_commits_both_updates() {
        let region_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(3)])
            .into_connection();
        let repo = PgRegionRepository::new(db.clone());

        let zones = repo.disable_region_and_zones(region_id).await.unwrap();
        assert_eq!(zones, 3);

        let sql = executed_sql(db);
        assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
        assert!(sql.iter().any(|s| s.contains(r#"UPDATE "regions""#)));
        assert!(sql.iter().any(|s| s.contains(r#"UPDATE "availability_zones""#)));
        assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
        assert!(!sql.iter().any(|s| s == "ROLLBACK"));
    }

    #[tokio::test]
    async fn test_cascade_zone_failure_rolls_back() {
        let region_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = PgRegionRepository::new(db.clone());

        let err = repo.disable_region_and_zones(region_id).await.unwrap_err();
        match err {
            RegionError::CascadeFailed { region_id: id, reason } => {
                assert_eq!(id, region_id);
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let sql = executed_sql(db);
        assert!(sql.iter().any(|s| s.contains(r#"UPDATE "availability_zones""#)));
        assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!sql.iter().any(|s| s == "COMMIT"));
    }

    #[tokio::test]
    async fn test_cascade_missing_region_is_not_found() {
        let region_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let repo = PgRegionRepository::new(db);

        let err = repo.disable_region_and_zones(region_id).await.unwrap_err();
        assert!(matches!(err, RegionError::NotFound(id) if id == region_id));
    }
}
