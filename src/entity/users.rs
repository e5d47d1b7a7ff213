use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = User)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: Option<i32>,
    pub photo_path: Option<String>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub created_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Role,
    #[sea_orm(has_many = "super::device_user::Entity")]
    DeviceUser,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::device_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeviceUser.def()
    }
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        super::device_user::Relation::Device.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::device_user::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
