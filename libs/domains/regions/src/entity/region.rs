use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RegionError;
use crate::models::Region;

/// Sea-ORM Entity for regions table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "regions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider_id: Uuid,
    pub code: String,
    pub name: String,
    pub image: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub details: Option<Json>, // JSONB object, holds `sg_id`
    pub config: Option<Json>,  // JSONB string map
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::provider::Entity",
        from = "Column::ProviderId",
        to = "super::provider::Column::Id",
        on_delete = "Cascade"
    )]
    Provider,
    #[sea_orm(has_many = "super::availability_zone::Entity")]
    AvailabilityZones,
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl Related<super::availability_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AvailabilityZones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// Stored JSON that no longer matches the domain shape surfaces as a data
// integrity fault instead of being silently dropped.
impl TryFrom<Model> for Region {
    type Error = RegionError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let details = match model.details {
            None | Some(Json::Null) => None,
            Some(Json::Object(map)) => Some(map),
            Some(other) => {
                return Err(RegionError::DataIntegrity(format!(
                    "region {} details is not an object: {}",
                    model.id, other
                )));
            }
        };

        let config = match model.config {
            None | Some(Json::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<BTreeMap<String, String>>(value).map_err(|e| {
                    RegionError::DataIntegrity(format!(
                        "region {} config is not a string map: {}",
                        model.id, e
                    ))
                })?,
            ),
        };

        Ok(Self {
            id: model.id,
            provider_id: model.provider_id,
            code: model.code,
            name: model.name,
            image: model.image,
            latitude: model.latitude.unwrap_or(0.0),
            longitude: model.longitude.unwrap_or(0.0),
            active: model.active,
            details,
            config,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<&Region> for ActiveModel {
    fn from(region: &Region) -> Self {
        ActiveModel {
            id: Set(region.id),
            provider_id: Set(region.provider_id),
            code: Set(region.code.clone()),
            name: Set(region.name.clone()),
            image: Set(region.image.clone()),
            latitude: Set(Some(region.latitude)),
            longitude: Set(Some(region.longitude)),
            active: Set(region.active),
            details: Set(region.details.clone().map(Json::Object)),
            config: Set(region.config.as_ref().map(|config| {
                Json::Object(
                    config
                        .iter()
                        .map(|(k, v)| (k.clone(), Json::String(v.clone())))
                        .collect(),
                )
            })),
            created_at: Set(region.created_at.into()),
            updated_at: Set(region.updated_at.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn model(details: Option<Json>, config: Option<Json>) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::now_v7(),
            provider_id: Uuid::now_v7(),
            code: "eu-west-1".to_string(),
            name: "EU (Ireland)".to_string(),
            image: "ami-eu".to_string(),
            latitude: None,
            longitude: Some(-6.2),
            active: true,
            details,
            config,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_into_region() {
        let region = Region::try_from(model(
            Some(json!({"sg_id": "sg-1"})),
            Some(json!({"KEY": "value"})),
        ))
        .unwrap();

        assert_eq!(region.latitude(), 0.0);
        assert_eq!(region.longitude(), -6.2);
        assert_eq!(region.security_group_id().as_deref(), Some("sg-1"));
        assert_eq!(region.config()["KEY"], "value");
    }

    #[test]
    fn test_malformed_json_is_integrity_fault() {
        let bad_details = Region::try_from(model(Some(json!(["sg-1"])), None));
        assert!(matches!(bad_details, Err(RegionError::DataIntegrity(_))));

        let bad_config = Region::try_from(model(None, Some(json!({"KEY": 1}))));
        assert!(matches!(bad_config, Err(RegionError::DataIntegrity(_))));
    }
}
