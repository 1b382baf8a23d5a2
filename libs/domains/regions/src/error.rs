use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegionError {
    /// Rejected input; nothing was mutated or persisted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Region not found: {0}")]
    NotFound(Uuid),

    #[error("Region '{code}' not found for provider {provider_id}")]
    CodeNotFound { provider_id: Uuid, code: String },

    #[error("Provider not found: {0}")]
    ProviderNotFound(Uuid),

    #[error("Region with code '{code}' already exists for provider {provider_id}")]
    DuplicateCode { provider_id: Uuid, code: String },

    #[error("Availability zone already exists: {0}")]
    DuplicateZone(Uuid),

    /// Stored data breaks an invariant the domain relies on
    #[error("Data integrity fault: {0}")]
    DataIntegrity(String),

    /// The cascade transaction was rolled back; neither the region nor its
    /// zones changed
    #[error("Unable to flag region {region_id} as deleted: {reason}")]
    CascadeFailed { region_id: Uuid, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RegionResult<T> = Result<T, RegionError>;

impl From<sea_orm::DbErr> for RegionError {
    fn from(err: sea_orm::DbErr) -> Self {
        RegionError::Internal(format!("Database error: {}", err))
    }
}

impl From<validator::ValidationErrors> for RegionError {
    fn from(err: validator::ValidationErrors) -> Self {
        RegionError::InvalidArgument(err.to_string())
    }
}
