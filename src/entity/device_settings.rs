use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Calibration defaults applied when a device is created without explicit
/// values.
pub const DEFAULT_INITIAL_DISTANCE: f64 = 10.0;
pub const DEFAULT_ALERT_THRESHOLD: f64 = 50.0;
pub const DEFAULT_DANGER_THRESHOLD: f64 = 80.0;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = DeviceSettings)]
#[sea_orm(table_name = "device_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub device_id: i32,
    pub initial_distance: f64,
    pub alert_threshold: f64,
    pub danger_threshold: f64,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub created_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::DeviceId",
        to = "super::devices::Column::Id"
    )]
    Device,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
