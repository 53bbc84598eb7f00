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
                    .table(Promos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Promos::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Promos::Code)
                            .string_len(8)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Promos::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Promos::Description).text().null())
                    .col(ColumnDef::new(Promos::DiscountPercent).integer().not_null())
                    .col(
                        ColumnDef::new(Promos::MinQualifyingAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Promos::ExpiryDate).date().null())
                    .col(
                        ColumnDef::new(Promos::IsExpired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Promos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promos_owner_id")
                            .from(Promos::Table, Promos::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PromoRedemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoRedemptions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PromoRedemptions::PromoId).uuid().not_null())
                    .col(ColumnDef::new(PromoRedemptions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PromoRedemptions::RedeemedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promo_redemptions_promo_id")
                            .from(PromoRedemptions::Table, PromoRedemptions::PromoId)
                            .to(Promos::Table, Promos::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promo_redemptions_user_id")
                            .from(PromoRedemptions::Table, PromoRedemptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one redemption per (promo, user), enforced by the database.
        manager
            .create_index(
                Index::create()
                    .name("uq_promo_redemptions_promo_user")
                    .table(PromoRedemptions::Table)
                    .col(PromoRedemptions::PromoId)
                    .col(PromoRedemptions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoRedemptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Promos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Promos {
    Table,
    Id,
    Code,
    OwnerId,
    Description,
    DiscountPercent,
    MinQualifyingAmount,
    ExpiryDate,
    IsExpired,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PromoRedemptions {
    Table,
    Id,
    PromoId,
    UserId,
    RedeemedAt,
}
