use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts_tables::Users;
use super::m20240101_000003_create_cart_items_table::CartItems;
use super::m20240101_000005_create_couriers_table::Couriers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::LocationSnapshot).json().not_null())
                    .col(ColumnDef::new(Orders::ItemsSnapshot).json().not_null())
                    .col(ColumnDef::new(Orders::PromoCode).string_len(8).null())
                    .col(
                        ColumnDef::new(Orders::SubtotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::FileAttachment).string_len(255).null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(20)
                            .not_null()
                            .default("preparing"),
                    )
                    .col(ColumnDef::new(Orders::CourierId).uuid().null())
                    .col(
                        ColumnDef::new(Orders::AssignedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user_id")
                            .from(Orders::Table, Orders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_courier_id")
                            .from(Orders::Table, Orders::CourierId)
                            .to(Couriers::Table, Couriers::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_courier_id")
                    .table(Orders::Table)
                    .col(Orders::CourierId)
                    .to_owned(),
            )
            .await?;

        // Traceability links between an order and the cart rows it consumed.
        manager
            .create_table(
                Table::create()
                    .table(OrderCartItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrderCartItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderCartItems::CartItemId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(OrderCartItems::OrderId)
                            .col(OrderCartItems::CartItemId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_cart_items_order_id")
                            .from(OrderCartItems::Table, OrderCartItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_cart_items_cart_item_id")
                            .from(OrderCartItems::Table, OrderCartItems::CartItemId)
                            .to(CartItems::Table, CartItems::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderCartItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    LocationSnapshot,
    ItemsSnapshot,
    PromoCode,
    SubtotalAmount,
    TotalAmount,
    FileAttachment,
    Status,
    CourierId,
    AssignedAt,
    DeliveredAt,
    CreatedAt,
    UpdatedAt,
    Version,
}

#[derive(DeriveIden)]
enum OrderCartItems {
    Table,
    OrderId,
    CartItemId,
}
