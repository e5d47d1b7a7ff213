use sea_orm_migration::prelude::*;

use crate::m20260301_000001_init::Roles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reference data: the policy layer resolves permissions by role name.
        for name in ["SuperAdmin", "Admin", "User"] {
            let insert = Query::insert()
                .into_table(Roles::Table)
                .columns([Roles::Name])
                .values_panic([name.into()])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Roles::Table)
            .and_where(
                Expr::col(Roles::Name).is_in(["SuperAdmin", "Admin", "User"]),
            )
            .to_owned();
        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
