use anyhow::Result;
use sea_orm_migration::prelude::*;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250201_000001_create_addresses_table::Migration),
            Box::new(m20250201_000002_create_rental_units_table::Migration),
            Box::new(m20250201_000003_create_orders_table::Migration),
            Box::new(m20250201_000004_create_order_items_table::Migration),
            Box::new(m20250201_000005_create_discounts_table::Migration),
            Box::new(m20250201_000006_create_custom_fees_table::Migration),
            Box::new(m20250201_000007_create_order_changelog_table::Migration),
            Box::new(m20250201_000008_create_pricing_rules_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250201_000001_create_addresses_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000001_create_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Addresses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Addresses::Street).string().not_null())
                        .col(ColumnDef::new(Addresses::City).string().not_null())
                        .col(ColumnDef::new(Addresses::State).string().not_null())
                        .col(ColumnDef::new(Addresses::PostalCode).string().not_null())
                        .col(ColumnDef::new(Addresses::Latitude).double().null())
                        .col(ColumnDef::new(Addresses::Longitude).double().null())
                        .col(ColumnDef::new(Addresses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Addresses::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Addresses {
        Table,
        Id,
        Street,
        City,
        State,
        PostalCode,
        Latitude,
        Longitude,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250201_000002_create_rental_units_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000002_create_rental_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RentalUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RentalUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalUnits::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(RentalUnits::Sku).string().null())
                        .col(
                            ColumnDef::new(RentalUnits::DryPriceCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RentalUnits::WaterPriceCents)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RentalUnits::RequiresGenerator)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(RentalUnits::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(RentalUnits::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RentalUnits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum RentalUnits {
        Table,
        Id,
        Name,
        Sku,
        DryPriceCents,
        WaterPriceCents,
        RequiresGenerator,
        IsActive,
        CreatedAt,
    }
}

mod m20250201_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20250201_000001_create_addresses_table::Addresses;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerPhone).string().null())
                        .col(ColumnDef::new(Orders::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Orders::LocationType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Surface).string_len(16).not_null())
                        .col(ColumnDef::new(Orders::EventDate).date().not_null())
                        .col(ColumnDef::new(Orders::EventEndDate).date().not_null())
                        .col(ColumnDef::new(Orders::SetupWindow).string().null())
                        .col(ColumnDef::new(Orders::PickupWindow).string().null())
                        .col(
                            ColumnDef::new(Orders::PickupPreference)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::AddressId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::GeneratorQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::SubtotalCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TravelFeeCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::SurfaceFeeCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::SameDayPickupFeeCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::GeneratorFeeCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::DepositDueCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::DepositPaidCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::BalanceDueCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::CustomDepositCents)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxWaived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::TaxWaivedReason).string().null())
                        .col(
                            ColumnDef::new(Orders::TravelFeeWaived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::TravelFeeWaivedReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::SurfaceFeeWaived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::SurfaceFeeWaivedReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::SameDayFeeWaived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::SameDayFeeWaivedReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::GeneratorFeeWaived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::GeneratorFeeWaivedReason)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::PaymentMethodRef).string().null())
                        .col(
                            ColumnDef::new(Orders::AmountPaidCents)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::PaidInFull)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::AdminMessage).string().null())
                        .col(
                            ColumnDef::new(Orders::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .col(
                            ColumnDef::new(Orders::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_address_id")
                                .from(Orders::Table, Orders::AddressId)
                                .to(Addresses::Table, Addresses::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Availability queries filter on status and the event date range.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_event_date")
                        .table(Orders::Table)
                        .col(Orders::EventDate)
                        .col(Orders::EventEndDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerName,
        CustomerEmail,
        CustomerPhone,
        Status,
        LocationType,
        Surface,
        EventDate,
        EventEndDate,
        SetupWindow,
        PickupWindow,
        PickupPreference,
        AddressId,
        GeneratorQty,
        SubtotalCents,
        TravelFeeCents,
        SurfaceFeeCents,
        SameDayPickupFeeCents,
        GeneratorFeeCents,
        TaxCents,
        TotalCents,
        DepositDueCents,
        DepositPaidCents,
        BalanceDueCents,
        CustomDepositCents,
        TaxWaived,
        TaxWaivedReason,
        TravelFeeWaived,
        TravelFeeWaivedReason,
        SurfaceFeeWaived,
        SurfaceFeeWaivedReason,
        SameDayFeeWaived,
        SameDayFeeWaivedReason,
        GeneratorFeeWaived,
        GeneratorFeeWaivedReason,
        PaymentMethodRef,
        AmountPaidCents,
        PaidInFull,
        AdminMessage,
        IsArchived,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20250201_000004_create_order_items_table {

    use sea_orm_migration::prelude::*;

    use super::m20250201_000002_create_rental_units_table::RentalUnits;
    use super::m20250201_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000004_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::UnitId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::UnitName).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::Mode).string_len(8).not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPriceCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_unit_id")
                                .from(OrderItems::Table, OrderItems::UnitId)
                                .to(RentalUnits::Table, RentalUnits::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_unit_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::UnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        UnitId,
        UnitName,
        Quantity,
        Mode,
        UnitPriceCents,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250201_000005_create_discounts_table {

    use sea_orm_migration::prelude::*;

    use super::m20250201_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000005_create_discounts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Discounts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Discounts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Discounts::OrderId).uuid().null())
                        .col(ColumnDef::new(Discounts::Name).string().not_null())
                        .col(ColumnDef::new(Discounts::AmountCents).big_integer().null())
                        .col(ColumnDef::new(Discounts::PercentBps).integer().null())
                        .col(
                            ColumnDef::new(Discounts::IsTemplate)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Discounts::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_discounts_order_id")
                                .from(Discounts::Table, Discounts::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discounts_order_id")
                        .table(Discounts::Table)
                        .col(Discounts::OrderId)
                        .to_owned(),
                )
                .await?;

            // Template uniqueness is checked by the reconciliation service;
            // the index keeps the lookup cheap.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_discounts_template_name")
                        .table(Discounts::Table)
                        .col(Discounts::IsTemplate)
                        .col(Discounts::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Discounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Discounts {
        Table,
        Id,
        OrderId,
        Name,
        AmountCents,
        PercentBps,
        IsTemplate,
        CreatedAt,
    }
}

mod m20250201_000006_create_custom_fees_table {

    use sea_orm_migration::prelude::*;

    use super::m20250201_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000006_create_custom_fees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomFees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomFees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomFees::OrderId).uuid().null())
                        .col(ColumnDef::new(CustomFees::Name).string().not_null())
                        .col(
                            ColumnDef::new(CustomFees::AmountCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomFees::IsTemplate)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(CustomFees::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_custom_fees_order_id")
                                .from(CustomFees::Table, CustomFees::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_custom_fees_order_id")
                        .table(CustomFees::Table)
                        .col(CustomFees::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomFees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CustomFees {
        Table,
        Id,
        OrderId,
        Name,
        AmountCents,
        IsTemplate,
        CreatedAt,
    }
}

mod m20250201_000007_create_order_changelog_table {

    use sea_orm_migration::prelude::*;

    use super::m20250201_000003_create_orders_table::Orders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000007_create_order_changelog_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderChangelog::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderChangelog::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderChangelog::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderChangelog::Actor).string().not_null())
                        .col(ColumnDef::new(OrderChangelog::Field).string().not_null())
                        .col(ColumnDef::new(OrderChangelog::OldValue).string().null())
                        .col(ColumnDef::new(OrderChangelog::NewValue).string().null())
                        .col(
                            ColumnDef::new(OrderChangelog::Kind)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderChangelog::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_changelog_order_id")
                                .from(OrderChangelog::Table, OrderChangelog::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_changelog_order_id")
                        .table(OrderChangelog::Table)
                        .col(OrderChangelog::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_changelog_created_at")
                        .table(OrderChangelog::Table)
                        .col(OrderChangelog::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderChangelog::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderChangelog {
        Table,
        Id,
        OrderId,
        Actor,
        Field,
        OldValue,
        NewValue,
        Kind,
        CreatedAt,
    }
}

mod m20250201_000008_create_pricing_rules_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250201_000008_create_pricing_rules_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PricingRules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PricingRules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PricingRules::Name).string().not_null())
                        .col(
                            ColumnDef::new(PricingRules::BaseRadiusMiles)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::PerMileAfterBaseCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::SurfaceFeeCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::GeneratorPriceCents)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::ExtraDayPctBps)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::ResidentialMultiplierBps)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::CommercialMultiplierBps)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::TaxRateBps)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::DepositPctBps)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::OvernightHolidayOnly)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PricingRules::IncludedCities)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::ZoneOverrides)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::SameDayFeeMatrix)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::HolidayPeriods)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingRules::IsActive)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PricingRules::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PricingRules::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pricing_rules_is_active")
                        .table(PricingRules::Table)
                        .col(PricingRules::IsActive)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PricingRules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PricingRules {
        Table,
        Id,
        Name,
        BaseRadiusMiles,
        PerMileAfterBaseCents,
        SurfaceFeeCents,
        GeneratorPriceCents,
        ExtraDayPctBps,
        ResidentialMultiplierBps,
        CommercialMultiplierBps,
        TaxRateBps,
        DepositPctBps,
        OvernightHolidayOnly,
        IncludedCities,
        ZoneOverrides,
        SameDayFeeMatrix,
        HolidayPeriods,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

/// Applies all pending migrations against an already-established connection.
pub async fn run_migration(db: &sea_orm::DatabaseConnection) -> Result<()> {
    info!("Running database migrations");

    match Migrator::up(db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
