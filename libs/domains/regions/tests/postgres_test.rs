//! PostgreSQL tests for the Regions domain
//!
//! Run against a real database in a container, with the workspace
//! migrations applied. Ignored by default: `cargo test -- --ignored`.

use std::collections::BTreeMap;

use domain_regions::*;
use test_utils::{TestDataBuilder, TestDatabase};
use uuid::Uuid;

async fn setup(test_name: &str) -> (TestDatabase, RegionService<PgRegionRepository>, Uuid, Uuid) {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name(test_name);
    let customer_id = builder.customer_id();
    let provider_id = db.create_test_provider(customer_id, &builder.code("aws")).await;
    let service = RegionService::new(PgRegionRepository::new(db.connection()));
    (db, service, customer_id, provider_id)
}

async fn create_with_zones(
    service: &RegionService<PgRegionRepository>,
    provider_id: Uuid,
    code: &str,
    zones: usize,
) -> Region {
    let region = service
        .create_region(CreateRegion::new(provider_id, code, code, "ami-0123"))
        .await
        .unwrap();
    for i in 0..zones {
        service
            .add_zone(CreateAvailabilityZone::new(
                region.id,
                format!("{}{}", code, (b'a' + i as u8) as char),
                format!("{} {}", code, i),
            ))
            .await
            .unwrap();
    }
    region
}

#[tokio::test]
#[ignore] // Requires Docker for testcontainers
async fn test_region_persists_mutations() {
    let (_db, service, _, provider_id) = setup("pg_mutations").await;
    let region = create_with_zones(&service, provider_id, "us-west-2", 0).await;

    service
        .set_coordinates(region.id, 45.52, -122.68)
        .await
        .unwrap();
    service
        .set_security_group_id(region.id, "sg-0123")
        .await
        .unwrap();
    service
        .update_config(
            region.id,
            BTreeMap::from([("HOSTED_ZONE_ID".to_string(), "Z1".to_string())]),
        )
        .await
        .unwrap();

    let loaded = service.get_region(region.id).await.unwrap();
    assert_eq!(loaded.provider.id, provider_id);
    assert_eq!(loaded.region.latitude(), 45.52);
    assert_eq!(loaded.region.longitude(), -122.68);
    assert_eq!(loaded.region.security_group_id().as_deref(), Some("sg-0123"));
    assert_eq!(loaded.region.config()["HOSTED_ZONE_ID"], "Z1");
}

#[tokio::test]
#[ignore] // Requires Docker for testcontainers
async fn test_duplicate_code_maps_unique_violation() {
    let (_db, service, _, provider_id) = setup("pg_duplicate").await;
    create_with_zones(&service, provider_id, "eu-west-1", 0).await;

    let result = service
        .create_region(CreateRegion::new(provider_id, "eu-west-1", "dup", "img"))
        .await;
    assert!(matches!(result, Err(RegionError::DuplicateCode { .. })));

    let orphan = service
        .create_region(CreateRegion::new(Uuid::now_v7(), "eu-west-1", "x", "img"))
        .await;
    assert!(matches!(orphan, Err(RegionError::ProviderNotFound(_))));
}

#[tokio::test]
#[ignore] // Requires Docker for testcontainers
async fn test_disable_region_and_zones() {
    let (_db, service, _, provider_id) = setup("pg_cascade").await;
    let region = create_with_zones(&service, provider_id, "us-east-1", 3).await;
    let untouched = create_with_zones(&service, provider_id, "us-east-2", 1).await;

    let touched = service.disable_region_and_zones(region.id).await.unwrap();
    assert_eq!(touched, 3);

    let loaded = service.get_region(region.id).await.unwrap().region;
    assert!(!loaded.is_active());
    assert!(
        service
            .list_zones(region.id)
            .await
            .unwrap()
            .iter()
            .all(|z| !z.active)
    );
    assert!(service.list_zones(untouched.id).await.unwrap()[0].active);

    let missing = service.disable_region_and_zones(Uuid::now_v7()).await;
    assert!(matches!(missing, Err(RegionError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires Docker for testcontainers
async fn test_aggregate_queries() {
    let (db, service, customer_id, provider_id) = setup("pg_aggregates").await;
    let r0 = create_with_zones(&service, provider_id, "r0", 0).await;
    let r2 = create_with_zones(&service, provider_id, "r2", 2).await;

    let other_customer = Uuid::now_v7();
    let other_provider = db.create_test_provider(other_customer, "gcp").await;
    create_with_zones(&service, other_provider, "r5", 5).await;

    let valid = service
        .fetch_valid_regions(customer_id, provider_id, 1)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, r2.id);

    let all = service
        .fetch_valid_regions(customer_id, provider_id, 0)
        .await
        .unwrap();
    assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![r0.id, r2.id]);

    let owned = service
        .get_owned_region(customer_id, provider_id, r0.id)
        .await
        .unwrap();
    assert_eq!(owned.code, "r0");

    let foreign = service
        .get_owned_region(other_customer, provider_id, r0.id)
        .await;
    assert!(matches!(foreign, Err(RegionError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires Docker for testcontainers
async fn test_duplicate_rows_surface_as_integrity_fault() {
    let (db, service, _, provider_id) = setup("pg_integrity").await;
    create_with_zones(&service, provider_id, "dc-1", 0).await;

    db.execute("DROP INDEX unique_region_code_per_provider")
        .await;
    db.execute(&format!(
        "INSERT INTO regions (id, provider_id, code, name, image, active, created_at, updated_at) \
         VALUES ('{}', '{}', 'dc-1', 'copy', 'img', true, NOW(), NOW())",
        Uuid::now_v7(),
        provider_id
    ))
    .await;

    let result = service.get_region_by_code(provider_id, "dc-1").await;
    assert!(matches!(result, Err(RegionError::DataIntegrity(_))));
}
