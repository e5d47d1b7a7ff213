use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Append-only; the relevant subset of the nullable fields depends on the
/// owning device's type.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = SensorReading)]
#[sea_orm(table_name = "sensor_readings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub device_id: i32,
    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub recorded_at: DateTimeWithTimeZone,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub water_level: Option<f64>,
    pub tilt_x: Option<f64>,
    pub tilt_y: Option<f64>,
    pub magnitude: Option<f64>,
    pub landslide_score: Option<f32>,
    pub landslide_status: Option<String>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::DeviceId",
        to = "super::devices::Column::Id"
    )]
    Device,
    #[sea_orm(has_many = "super::classification_results::Entity")]
    ClassificationResults,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl Related<super::classification_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassificationResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
