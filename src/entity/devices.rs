use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Determines which sensor fields are semantically relevant for a device.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    #[sea_orm(string_value = "SIGMA")]
    Sigma,
    #[sea_orm(string_value = "FLOWS")]
    Flows,
    #[sea_orm(string_value = "LANDSLIDE")]
    Landslide,
    #[sea_orm(string_value = "WILDFIRE")]
    Wildfire,
}

impl std::str::FromStr for DeviceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGMA" => Ok(Self::Sigma),
            "FLOWS" => Ok(Self::Flows),
            "LANDSLIDE" => Ok(Self::Landslide),
            "WILDFIRE" => Ok(Self::Wildfire),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Device)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub device_code: String,
    pub name: String,
    pub device_type: DeviceType,
    pub latitude: f64,
    pub longitude: f64,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub image: Option<String>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub created_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::device_settings::Entity")]
    Settings,
    #[sea_orm(has_many = "super::sensor_readings::Entity")]
    SensorReadings,
    #[sea_orm(has_many = "super::classification_results::Entity")]
    ClassificationResults,
    #[sea_orm(has_many = "super::device_user::Entity")]
    DeviceUser,
}

impl Related<super::device_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settings.def()
    }
}

impl Related<super::sensor_readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorReadings.def()
    }
}

impl Related<super::classification_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassificationResults.def()
    }
}

impl Related<super::device_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeviceUser.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        super::device_user::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::device_user::Relation::Device.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
