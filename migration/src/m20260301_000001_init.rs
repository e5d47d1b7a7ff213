use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== ROLES ==========
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== USERS ==========
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::RoleId).integer())
                    .col(ColumnDef::new(Users::PhotoPath).string_len(512))
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_role")
                            .from(Users::Table, Users::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .to_owned(),
            )
            .await?;

        // ========== DEVICES ==========
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Devices::DeviceCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Devices::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::DeviceType).string_len(16).not_null())
                    .col(ColumnDef::new(Devices::Latitude).double().not_null())
                    .col(ColumnDef::new(Devices::Longitude).double().not_null())
                    .col(ColumnDef::new(Devices::Address).text().not_null())
                    .col(ColumnDef::new(Devices::Image).string_len(512))
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(
                        ColumnDef::new(Devices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== DEVICE SETTINGS ==========
        // Unique index on device_id backs the atomic calibration upsert.
        manager
            .create_table(
                Table::create()
                    .table(DeviceSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::DeviceId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::InitialDistance)
                            .double()
                            .not_null()
                            .default(10.0),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::AlertThreshold)
                            .double()
                            .not_null()
                            .default(50.0),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::DangerThreshold)
                            .double()
                            .not_null()
                            .default(80.0),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(
                        ColumnDef::new(DeviceSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_settings_device")
                            .from(DeviceSettings::Table, DeviceSettings::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SENSOR READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(SensorReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorReadings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorReadings::DeviceId).integer().not_null())
                    .col(
                        ColumnDef::new(SensorReadings::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SensorReadings::Temperature).double())
                    .col(ColumnDef::new(SensorReadings::Humidity).double())
                    .col(ColumnDef::new(SensorReadings::WindSpeed).double())
                    .col(ColumnDef::new(SensorReadings::WaterLevel).double())
                    .col(ColumnDef::new(SensorReadings::TiltX).double())
                    .col(ColumnDef::new(SensorReadings::TiltY).double())
                    .col(ColumnDef::new(SensorReadings::Magnitude).double())
                    .col(ColumnDef::new(SensorReadings::LandslideScore).float())
                    .col(ColumnDef::new(SensorReadings::LandslideStatus).string_len(64))
                    .col(
                        ColumnDef::new(SensorReadings::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensor_readings_device")
                            .from(SensorReadings::Table, SensorReadings::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-reading lookups drive the derived device status.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_sensor_readings_device_recorded ON sensor_readings (device_id, recorded_at DESC)",
            )
            .await?;

        // ========== CLASSIFICATION RESULTS ==========
        manager
            .create_table(
                Table::create()
                    .table(ClassificationResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassificationResults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClassificationResults::SensorReadingId).integer())
                    .col(
                        ColumnDef::new(ClassificationResults::DeviceId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassificationResults::Label)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClassificationResults::Confidence).float().not_null())
                    .col(
                        ColumnDef::new(ClassificationResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classification_results_reading")
                            .from(
                                ClassificationResults::Table,
                                ClassificationResults::SensorReadingId,
                            )
                            .to(SensorReadings::Table, SensorReadings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classification_results_device")
                            .from(ClassificationResults::Table, ClassificationResults::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_classification_results_device ON classification_results (device_id, created_at DESC)",
            )
            .await?;

        // ========== DEVICE_USER (access grants) ==========
        manager
            .create_table(
                Table::create()
                    .table(DeviceUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceUser::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DeviceUser::UserId).integer().not_null())
                    .col(ColumnDef::new(DeviceUser::DeviceId).integer().not_null())
                    .col(
                        ColumnDef::new(DeviceUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_user_user")
                            .from(DeviceUser::Table, DeviceUser::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_device_user_device")
                            .from(DeviceUser::Table, DeviceUser::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One grant per (user, device); attach relies on this for idempotency.
        manager
            .create_index(
                Index::create()
                    .name("idx_device_user_unique")
                    .table(DeviceUser::Table)
                    .col(DeviceUser::UserId)
                    .col(DeviceUser::DeviceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeviceUser::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ClassificationResults::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SensorReadings::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(DeviceSettings::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Roles {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    RoleId,
    PhotoPath,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Devices {
    Table,
    Id,
    DeviceCode,
    Name,
    DeviceType,
    Latitude,
    Longitude,
    Address,
    Image,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum DeviceSettings {
    Table,
    Id,
    DeviceId,
    InitialDistance,
    AlertThreshold,
    DangerThreshold,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum SensorReadings {
    Table,
    Id,
    DeviceId,
    RecordedAt,
    Temperature,
    Humidity,
    WindSpeed,
    WaterLevel,
    TiltX,
    TiltY,
    Magnitude,
    LandslideScore,
    LandslideStatus,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ClassificationResults {
    Table,
    Id,
    SensorReadingId,
    DeviceId,
    Label,
    Confidence,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DeviceUser {
    Table,
    Id,
    UserId,
    DeviceId,
    CreatedAt,
}
