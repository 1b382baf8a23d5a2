use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for availability_zones table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_zones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub region_id: Uuid,
    pub code: String,
    pub name: String,
    pub subnet: Option<String>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::region::Entity",
        from = "Column::RegionId",
        to = "super::region::Column::Id",
        on_delete = "Cascade"
    )]
    Region,
}

impl Related<super::region::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Region.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::AvailabilityZone {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            region_id: model.region_id,
            code: model.code,
            name: model.name,
            subnet: model.subnet,
            active: model.active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&crate::models::AvailabilityZone> for ActiveModel {
    fn from(zone: &crate::models::AvailabilityZone) -> Self {
        ActiveModel {
            id: Set(zone.id),
            region_id: Set(zone.region_id),
            code: Set(zone.code.clone()),
            name: Set(zone.name.clone()),
            subnet: Set(zone.subnet.clone()),
            active: Set(zone.active),
            created_at: Set(zone.created_at.into()),
            updated_at: Set(zone.updated_at.into()),
        }
    }
}
