use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = ClassificationResult)]
#[sea_orm(table_name = "classification_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sensor_reading_id: Option<i32>,
    pub device_id: i32,
    pub label: String,
    #[sea_orm(column_type = "Float")]
    pub confidence: f32,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sensor_readings::Entity",
        from = "Column::SensorReadingId",
        to = "super::sensor_readings::Column::Id"
    )]
    SensorReading,
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::DeviceId",
        to = "super::devices::Column::Id"
    )]
    Device,
}

impl Related<super::sensor_readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorReading.def()
    }
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
