use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{RegionError, RegionResult};
use crate::masking::MaskingPolicy;
use crate::models::{
    AvailabilityZone, CreateAvailabilityZone, CreateRegion, Region, RegionSummary,
    RegionWithProvider,
};
use crate::repository::RegionRepository;

/// Service layer for region business logic
///
/// Mutations load the region, apply the change on the domain value and
/// persist it with an explicit `save`; nothing is written when the change
/// itself is rejected.
pub struct RegionService<R: RegionRepository> {
    repository: Arc<R>,
    masking: MaskingPolicy,
}

impl<R: RegionRepository> Clone for RegionService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            masking: self.masking.clone(),
        }
    }
}

impl<R: RegionRepository> RegionService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            masking: MaskingPolicy::default(),
        }
    }

    pub fn with_masking_policy(mut self, masking: MaskingPolicy) -> Self {
        self.masking = masking;
        self
    }

    pub fn masking_policy(&self) -> &MaskingPolicy {
        &self.masking
    }

    /// Create a new region (validated, active, fresh id)
    pub async fn create_region(&self, input: CreateRegion) -> RegionResult<Region> {
        let region = Region::new(input)?;
        let region = self.repository.create(region).await?;

        tracing::info!(region_id = %region.id, provider_id = %region.provider_id, code = %region.code, "Created region");
        Ok(region)
    }

    /// Create a region from a provider metadata document
    pub async fn create_region_with_metadata(
        &self,
        provider_id: Uuid,
        code: &str,
        metadata: Value,
    ) -> RegionResult<Region> {
        self.create_region(CreateRegion::from_metadata(provider_id, code, metadata)?)
            .await
    }

    /// Get a region with its provider
    pub async fn get_region(&self, id: Uuid) -> RegionResult<RegionWithProvider> {
        self.repository
            .find_with_provider(id)
            .await?
            .ok_or(RegionError::NotFound(id))
    }

    /// Get a region by code within a provider
    pub async fn get_region_by_code(&self, provider_id: Uuid, code: &str) -> RegionResult<Region> {
        match self.repository.find_by_code(provider_id, code).await {
            Ok(Some(region)) => Ok(region),
            Ok(None) => Err(RegionError::CodeNotFound {
                provider_id,
                code: code.to_string(),
            }),
            Err(e @ RegionError::DataIntegrity(_)) => {
                tracing::warn!(provider_id = %provider_id, code = %code, error = %e, "Duplicate region code in store");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_regions_by_provider(&self, provider_id: Uuid) -> RegionResult<Vec<Region>> {
        self.repository.list_by_provider(provider_id).await
    }

    /// Resolve a region through its ownership chain
    ///
    /// Any break in region -> provider -> customer reads as `NotFound`.
    pub async fn get_owned_region(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        region_id: Uuid,
    ) -> RegionResult<RegionSummary> {
        self.repository
            .find_owned(customer_id, provider_id, region_id)
            .await?
            .ok_or(RegionError::NotFound(region_id))
    }

    pub async fn fetch_valid_regions(
        &self,
        customer_id: Uuid,
        provider_id: Uuid,
        min_zone_count: u32,
    ) -> RegionResult<Vec<RegionSummary>> {
        self.repository
            .fetch_valid_regions(customer_id, provider_id, min_zone_count)
            .await
    }

    async fn load(&self, id: Uuid) -> RegionResult<Region> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(RegionError::NotFound(id))
    }

    pub async fn set_coordinates(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> RegionResult<Region> {
        let mut region = self.load(id).await?;
        region.set_coordinates(latitude, longitude)?;
        let region = self.repository.save(region).await?;

        tracing::info!(region_id = %id, latitude, longitude, "Updated region coordinates");
        Ok(region)
    }

    pub async fn set_security_group_id(
        &self,
        id: Uuid,
        security_group_id: &str,
    ) -> RegionResult<Region> {
        let mut region = self.load(id).await?;
        region.set_security_group_id(security_group_id);
        let region = self.repository.save(region).await?;

        tracing::info!(region_id = %id, security_group_id, "Updated region security group");
        Ok(region)
    }

    pub async fn security_group_id(&self, id: Uuid) -> RegionResult<Option<String>> {
        Ok(self.load(id).await?.security_group_id())
    }

    /// Merge `updates` into the stored configuration and persist the result
    pub async fn update_config(
        &self,
        id: Uuid,
        updates: BTreeMap<String, String>,
    ) -> RegionResult<BTreeMap<String, String>> {
        let keys = updates.len();
        let mut region = self.load(id).await?;
        region.merge_config(updates);
        let region = self.repository.save(region).await?;

        tracing::info!(region_id = %id, keys, "Merged region config");
        Ok(region.config())
    }

    pub async fn config(&self, id: Uuid) -> RegionResult<BTreeMap<String, String>> {
        Ok(self.load(id).await?.config())
    }

    /// Configuration with sensitive values redacted under this service's policy
    pub async fn masked_config(&self, id: Uuid) -> RegionResult<Value> {
        Ok(self.load(id).await?.masked_config(&self.masking))
    }

    /// Flip the region's own flag; zones are untouched
    pub async fn set_active_flag(&self, id: Uuid, active: bool) -> RegionResult<Region> {
        let mut region = self.load(id).await?;
        region.set_active_flag(active);
        let region = self.repository.save(region).await?;

        tracing::info!(region_id = %id, active, "Updated region active flag");
        Ok(region)
    }

    /// Deactivate a region and all of its zones in one transaction
    pub async fn disable_region_and_zones(&self, id: Uuid) -> RegionResult<u64> {
        match self.repository.disable_region_and_zones(id).await {
            Ok(zones) => {
                tracing::info!(region_id = %id, zones, "Disabled region and zones");
                Ok(zones)
            }
            Err(e) => {
                tracing::error!(region_id = %id, error = %e, "Failed to disable region and zones");
                Err(e)
            }
        }
    }

    /// Add a zone to an existing region
    pub async fn add_zone(&self, input: CreateAvailabilityZone) -> RegionResult<AvailabilityZone> {
        let zone = AvailabilityZone::new(input)?;
        self.load(zone.region_id).await?;
        let zone = self.repository.add_zone(zone).await?;

        tracing::info!(region_id = %zone.region_id, zone_id = %zone.id, code = %zone.code, "Added availability zone");
        Ok(zone)
    }

    pub async fn list_zones(&self, region_id: Uuid) -> RegionResult<Vec<AvailabilityZone>> {
        self.repository.list_zones(region_id).await
    }
}
