use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RegionError, RegionResult};
use crate::models::{AvailabilityZone, Provider, Region, RegionSummary, RegionWithProvider};

/// Repository trait for Region persistence
///
/// Aggregate queries and the zone cascade are named operations here so each
/// backend can run them as a single statement or transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionRepository: Send + Sync {
    /// Insert a new region; the provider must exist and the code must be
    /// free within that provider
    async fn create(&self, region: Region) -> RegionResult<Region>;

    /// Persist every field of an existing region
    async fn save(&self, region: Region) -> RegionResult<Region>;

    async fn find_by_id(&self, id: Uuid) -> RegionResult<Option<Region>>;

    /// Get a region with its provider resolved in the same round trip
    async fn find_with_provider(&self, id: Uuid) -> RegionResult<Option<RegionWithProvider>>;

    /// Look up a region by code within one provider
    ///
    /// More than one match is a `DataIntegrity` error.
    async fn find_by_code(&self, provider_id: Uuid, code: &str) -> RegionResult<Option<Region>>;

    /// All regions of a provider, active or not
    async fn list_by_provider(&self, provider_id: Uuid) -> RegionResult<Vec<Region>>;

    /// Resolve a region only when region -> provider -> customer holds
    async fn find_owned(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        region_id: Uuid,
    ) -> RegionResult<Option<RegionSummary>>;

    /// Regions of a customer's provider owning at least `min_zone_count` zones
    async fn fetch_valid_regions(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        min_zone_count: u32,
    ) -> RegionResult<Vec<RegionSummary>>;

    /// Atomically deactivate a region and every zone it owns
    ///
    /// Returns the number of zones touched. On failure nothing changes.
    async fn disable_region_and_zones(&self, region_id: Uuid) -> RegionResult<u64>;

    async fn add_zone(&self, zone: AvailabilityZone) -> RegionResult<AvailabilityZone>;

    async fn list_zones(&self, region_id: Uuid) -> RegionResult<Vec<AvailabilityZone>>;
}

#[derive(Debug, Default)]
struct Store {
    providers: HashMap<Uuid, Provider>,
    regions: HashMap<Uuid, Region>,
    zones: HashMap<Uuid, AvailabilityZone>,
}

/// In-memory implementation of RegionRepository (for development/testing)
///
/// Every mutation holds the write lock for its whole duration, so readers
/// never see a half-applied cascade.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegionRepository {
    store: Arc<RwLock<Store>>,
    fail_zone_update: Arc<AtomicBool>,
}

impl InMemoryRegionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider (providers are managed outside this domain)
    pub async fn add_provider(&self, provider: Provider) {
        self.store
            .write()
            .await
            .providers
            .insert(provider.id, provider);
    }

    /// Store a region as-is, skipping provider and code checks
    ///
    /// Mirrors rows loaded from a legacy store that predates the unique index.
    pub async fn import_region(&self, region: Region) {
        self.store.write().await.regions.insert(region.id, region);
    }

    /// Make the zone step of the next cascade fail
    pub fn fail_next_zone_update(&self) {
        self.fail_zone_update.store(true, Ordering::SeqCst);
    }

    fn summaries<'a>(regions: impl Iterator<Item = &'a Region>) -> Vec<RegionSummary> {
        let mut summaries: Vec<RegionSummary> = regions.map(Region::summary).collect();
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }
}

impl Store {
    fn owned_by(&self, customer_id: Uuid, provider_id: Uuid) -> bool {
        self.providers
            .get(&provider_id)
            .is_some_and(|p| p.customer_id == customer_id)
    }

    fn code_taken(&self, region: &Region) -> bool {
        self.regions.values().any(|r| {
            r.id != region.id && r.provider_id == region.provider_id && r.code == region.code
        })
    }
}

#[async_trait]
impl RegionRepository for InMemoryRegionRepository {
    async fn create(&self, region: Region) -> RegionResult<Region> {
        let mut store = self.store.write().await;

        if !store.providers.contains_key(&region.provider_id) {
            return Err(RegionError::ProviderNotFound(region.provider_id));
        }
        if store.code_taken(&region) {
            return Err(RegionError::DuplicateCode {
                provider_id: region.provider_id,
                code: region.code,
            });
        }

        store.regions.insert(region.id, region.clone());
        Ok(region)
    }

    async fn save(&self, region: Region) -> RegionResult<Region> {
        let mut store = self.store.write().await;

        if !store.regions.contains_key(&region.id) {
            return Err(RegionError::NotFound(region.id));
        }
        if store.code_taken(&region) {
            return Err(RegionError::DuplicateCode {
                provider_id: region.provider_id,
                code: region.code,
            });
        }

        store.regions.insert(region.id, region.clone());
        Ok(region)
    }

    async fn find_by_id(&self, id: Uuid) -> RegionResult<Option<Region>> {
        let store = self.store.read().await;
        Ok(store.regions.get(&id).cloned())
    }

    async fn find_with_provider(&self, id: Uuid) -> RegionResult<Option<RegionWithProvider>> {
        let store = self.store.read().await;

        let Some(region) = store.regions.get(&id) else {
            return Ok(None);
        };
        let provider = store.providers.get(&region.provider_id).ok_or_else(|| {
            RegionError::DataIntegrity(format!(
                "region {} references missing provider {}",
                id, region.provider_id
            ))
        })?;

        Ok(Some(RegionWithProvider {
            region: region.clone(),
            provider: provider.clone(),
        }))
    }

    async fn find_by_code(&self, provider_id: Uuid, code: &str) -> RegionResult<Option<Region>> {
        let store = self.store.read().await;

        let mut matches = store
            .regions
            .values()
            .filter(|r| r.provider_id == provider_id && r.code == code);

        match (matches.next(), matches.next()) {
            (None, _) => Ok(None),
            (Some(region), None) => Ok(Some(region.clone())),
            (Some(_), Some(_)) => Err(RegionError::DataIntegrity(format!(
                "multiple regions with code '{}' for provider {}",
                code, provider_id
            ))),
        }
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> RegionResult<Vec<Region>> {
        let store = self.store.read().await;
        Ok(store
            .regions
            .values()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn find_owned(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        region_id: Uuid,
    ) -> RegionResult<Option<RegionSummary>> {
        let store = self.store.read().await;

        if !store.owned_by(customer_id, provider_id) {
            return Ok(None);
        }
        Ok(store
            .regions
            .get(&region_id)
            .filter(|r| r.provider_id == provider_id)
            .map(Region::summary))
    }

    async fn fetch_valid_regions(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        min_zone_count: u32,
    ) -> RegionResult<Vec<RegionSummary>> {
        let store = self.store.read().await;

        if !store.owned_by(customer_id, provider_id) {
            return Ok(Vec::new());
        }

        let mut zone_counts: HashMap<Uuid, u32> = HashMap::new();
        for zone in store.zones.values() {
            *zone_counts.entry(zone.region_id).or_default() += 1;
        }

        Ok(Self::summaries(store.regions.values().filter(|r| {
            r.provider_id == provider_id
                && zone_counts.get(&r.id).copied().unwrap_or(0) >= min_zone_count
        })))
    }

    async fn disable_region_and_zones(&self, region_id: Uuid) -> RegionResult<u64> {
        let mut store = self.store.write().await;

        let snapshot = store
            .regions
            .get(&region_id)
            .cloned()
            .ok_or(RegionError::NotFound(region_id))?;

        if let Some(region) = store.regions.get_mut(&region_id) {
            region.set_active_flag(false);
        }

        if self.fail_zone_update.swap(false, Ordering::SeqCst) {
            store.regions.insert(region_id, snapshot);
            return Err(RegionError::CascadeFailed {
                region_id,
                reason: "zone update failed".to_string(),
            });
        }

        let now = chrono::Utc::now();
        let mut touched = 0;
        for zone in store.zones.values_mut().filter(|z| z.region_id == region_id) {
            zone.active = false;
            zone.updated_at = now;
            touched += 1;
        }

        Ok(touched)
    }

    async fn add_zone(&self, zone: AvailabilityZone) -> RegionResult<AvailabilityZone> {
        let mut store = self.store.write().await;

        if !store.regions.contains_key(&zone.region_id) {
            return Err(RegionError::NotFound(zone.region_id));
        }
        if store.zones.contains_key(&zone.id) {
            return Err(RegionError::DuplicateZone(zone.id));
        }

        store.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn list_zones(&self, region_id: Uuid) -> RegionResult<Vec<AvailabilityZone>> {
        let store = self.store.read().await;

        let mut zones: Vec<AvailabilityZone> = store
            .zones
            .values()
            .filter(|z| z.region_id == region_id)
            .cloned()
            .collect();
        zones.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateAvailabilityZone, CreateRegion};

    async fn seeded() -> (InMemoryRegionRepository, Provider) {
        let repo = InMemoryRegionRepository::new();
        let provider = Provider {
            id: Uuid::now_v7(),
            customer_id: Uuid::now_v7(),
            code: "aws".to_string(),
            name: "AWS".to_string(),
        };
        repo.add_provider(provider.clone()).await;
        (repo, provider)
    }

    fn region(provider_id: Uuid, code: &str) -> Region {
        Region::new(CreateRegion::new(provider_id, code, code, "ami-1")).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_by_code() {
        let (repo, provider) = seeded().await;

        let created = repo.create(region(provider.id, "us-east-1")).await.unwrap();
        let found = repo
            .find_by_code(provider.id, "us-east-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        assert!(
            repo.find_by_code(Uuid::now_v7(), "us-east-1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_provider_and_duplicates() {
        let (repo, provider) = seeded().await;

        let orphan = repo.create(region(Uuid::now_v7(), "us-east-1")).await;
        assert!(matches!(orphan, Err(RegionError::ProviderNotFound(_))));

        repo.create(region(provider.id, "us-east-1")).await.unwrap();
        let dup = repo.create(region(provider.id, "us-east-1")).await;
        assert!(matches!(dup, Err(RegionError::DuplicateCode { .. })));
    }

    #[tokio::test]
    async fn test_find_by_code_duplicate_rows_is_integrity_fault() {
        let (repo, provider) = seeded().await;
        repo.import_region(region(provider.id, "dc-1")).await;
        repo.import_region(region(provider.id, "dc-1")).await;

        let result = repo.find_by_code(provider.id, "dc-1").await;
        assert!(matches!(result, Err(RegionError::DataIntegrity(_))));
    }

    #[tokio::test]
    async fn test_cascade_restores_snapshot_on_failure() {
        let (repo, provider) = seeded().await;
        let created = repo.create(region(provider.id, "us-east-1")).await.unwrap();
        let zone =
            AvailabilityZone::new(CreateAvailabilityZone::new(created.id, "us-east-1a", "a"))
                .unwrap();
        repo.add_zone(zone).await.unwrap();

        repo.fail_next_zone_update();
        let err = repo.disable_region_and_zones(created.id).await.unwrap_err();
        assert!(matches!(err, RegionError::CascadeFailed { region_id, .. } if region_id == created.id));

        let after = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(after, created);
        assert!(repo.list_zones(created.id).await.unwrap()[0].active);

        // the injected failure is one-shot
        assert_eq!(repo.disable_region_and_zones(created.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_zone_rejects_existing_id() {
        let (repo, provider) = seeded().await;
        let created = repo.create(region(provider.id, "us-east-1")).await.unwrap();
        let zone =
            AvailabilityZone::new(CreateAvailabilityZone::new(created.id, "us-east-1a", "a"))
                .unwrap();
        repo.add_zone(zone.clone()).await.unwrap();

        let mut renamed = zone.clone();
        renamed.code = "us-east-1b".to_string();
        let dup = repo.add_zone(renamed).await;
        assert!(matches!(dup, Err(RegionError::DuplicateZone(id)) if id == zone.id));

        let zones = repo.list_zones(created.id).await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].code, "us-east-1a");
    }
}
