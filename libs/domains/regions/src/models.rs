use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::error::{RegionError, RegionResult};
use crate::masking::MaskingPolicy;

/// Key under which the provider-side security group id lives in `details`
pub const SECURITY_GROUP_KEY: &str = "sg_id";

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Reject out-of-range (or NaN) coordinates
pub fn check_coordinates(latitude: f64, longitude: f64) -> RegionResult<()> {
    if !LATITUDE_RANGE.contains(&latitude) {
        return Err(RegionError::InvalidArgument(format!(
            "Invalid latitude {}, it should be between -90 and 90",
            latitude
        )));
    }
    if !LONGITUDE_RANGE.contains(&longitude) {
        return Err(RegionError::InvalidArgument(format!(
            "Invalid longitude {}, it should be between -180 and 180",
            longitude
        )));
    }
    Ok(())
}

/// Cloud provider account owning regions; read-only in this domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub code: String,
    pub name: String,
}

/// Geographic deployment area of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub provider_id: Uuid,
    /// Short identifier, unique per provider (e.g. `us-west-2`)
    pub code: String,
    pub name: String,
    /// Base machine image used when provisioning nodes here
    pub image: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<Map<String, Value>>,
    // Exposed only through `config()` / `masked_config()`
    #[serde(skip)]
    pub(crate) config: Option<BTreeMap<String, String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal projection returned by ownership-scoped queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// A region with its provider resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionWithProvider {
    #[serde(flatten)]
    pub region: Region,
    pub provider: Provider,
}

/// DTO for creating a region
///
/// Cloud regions are created without coordinates (they resolve to `0.0, 0.0`
/// until known); on-premises regions usually supply them up front.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRegion {
    pub provider_id: Uuid,
    #[validate(length(min = 1, max = 25))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub image: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Region description as found in provider metadata documents
#[derive(Debug, Deserialize)]
struct RegionMetadata {
    name: String,
    #[serde(alias = "ybImage")]
    image: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl CreateRegion {
    pub fn new(
        provider_id: Uuid,
        code: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            provider_id,
            code: code.into(),
            name: name.into(),
            image: image.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Build the DTO from a metadata document such as
    /// `{"name": "US West", "ybImage": "ami-0123", "latitude": 37.4, "longitude": -122.1}`
    pub fn from_metadata(
        provider_id: Uuid,
        code: impl Into<String>,
        metadata: Value,
    ) -> RegionResult<Self> {
        let metadata: RegionMetadata = serde_json::from_value(metadata)
            .map_err(|e| RegionError::InvalidArgument(format!("Invalid region metadata: {}", e)))?;

        Ok(Self {
            provider_id,
            code: code.into(),
            name: metadata.name,
            image: metadata.image,
            latitude: metadata.latitude,
            longitude: metadata.longitude,
        })
    }
}

impl Region {
    /// Validate the DTO and build an active region with a fresh id
    pub fn new(input: CreateRegion) -> RegionResult<Self> {
        input.validate()?;

        let latitude = input.latitude.unwrap_or(0.0);
        let longitude = input.longitude.unwrap_or(0.0);
        check_coordinates(latitude, longitude)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            provider_id: input.provider_id,
            code: input.code,
            name: input.name,
            image: input.image,
            latitude,
            longitude,
            active: true,
            details: None,
            config: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Set both coordinates, or neither when either is out of range
    pub fn set_coordinates(&mut self, latitude: f64, longitude: f64) -> RegionResult<()> {
        check_coordinates(latitude, longitude)?;
        self.latitude = latitude;
        self.longitude = longitude;
        self.touch();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Plain flag update. Zones are left alone; deactivating a region
    /// together with its zones goes through the repository cascade.
    pub fn set_active_flag(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    pub fn security_group_id(&self) -> Option<String> {
        match self.details.as_ref()?.get(SECURITY_GROUP_KEY)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn set_security_group_id(&mut self, security_group_id: impl Into<String>) {
        self.details
            .get_or_insert_with(Map::new)
            .insert(SECURITY_GROUP_KEY.to_string(), Value::String(security_group_id.into()));
        self.touch();
    }

    /// Current configuration; empty when none was ever set
    pub fn config(&self) -> BTreeMap<String, String> {
        self.config.clone().unwrap_or_default()
    }

    /// Overlay `updates` on the current configuration
    ///
    /// New keys are added, existing keys overwritten, all other keys kept.
    pub fn merge_config<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.config.get_or_insert_with(BTreeMap::new).extend(updates);
        self.touch();
    }

    /// Configuration with sensitive values redacted; `{}` when none was set
    pub fn masked_config(&self, policy: &MaskingPolicy) -> Value {
        match &self.config {
            None => Value::Object(Map::new()),
            Some(config) => {
                let raw: Map<String, Value> = config
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                policy.mask_json(&Value::Object(raw))
            }
        }
    }

    pub fn summary(&self) -> RegionSummary {
        RegionSummary {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Independent failure domain inside a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub id: Uuid,
    pub region_id: Uuid,
    pub code: String,
    pub name: String,
    pub subnet: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for adding a zone to a region
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAvailabilityZone {
    pub region_id: Uuid,
    #[validate(length(min = 1, max = 25))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub subnet: Option<String>,
}

impl CreateAvailabilityZone {
    pub fn new(region_id: Uuid, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region_id,
            code: code.into(),
            name: name.into(),
            subnet: None,
        }
    }

    pub fn with_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.subnet = Some(subnet.into());
        self
    }
}

impl AvailabilityZone {
    pub fn new(input: CreateAvailabilityZone) -> RegionResult<Self> {
        input.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            region_id: input.region_id,
            code: input.code,
            name: input.name,
            subnet: input.subnet,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }
}
