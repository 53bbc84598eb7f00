use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts_tables::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Couriers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Couriers::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Couriers::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Couriers::Phone).string_len(12).not_null())
                    .col(ColumnDef::new(Couriers::GroupRole).string_len(50).null())
                    .col(
                        ColumnDef::new(Couriers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_couriers_user_id")
                            .from(Couriers::Table, Couriers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Couriers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Couriers {
    Table,
    Id,
    UserId,
    Phone,
    GroupRole,
    CreatedAt,
}
