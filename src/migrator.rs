use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_master_data_tables::Migration),
            Box::new(m20240101_000002_create_product_tables::Migration),
            Box::new(m20240101_000003_create_invoice_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_master_data_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_master_data_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Salesmen::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Salesmen::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Salesmen::Code).string().not_null())
                        .col(ColumnDef::new(Salesmen::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Deliverymen::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliverymen::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Deliverymen::Code).string().not_null())
                        .col(ColumnDef::new(Deliverymen::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::CareOf).string().null())
                        .col(ColumnDef::new(Customers::Address).string().not_null())
                        .col(ColumnDef::new(Customers::TelephoneNumber).string().null())
                        .col(ColumnDef::new(Customers::SalesmanId).integer().null())
                        .col(ColumnDef::new(Customers::Terms).string().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customers_salesman")
                                .from(Customers::Table, Customers::SalesmanId)
                                .to(Salesmen::Table, Salesmen::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Customers::Table)
                        .col(Customers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Deliverymen::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Salesmen::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Salesmen {
        Table,
        Id,
        Code,
        Name,
    }

    #[derive(DeriveIden)]
    pub enum Deliverymen {
        Table,
        Id,
        Code,
        Name,
    }

    #[derive(DeriveIden)]
    pub enum Customers {
        Table,
        Id,
        Name,
        CareOf,
        Address,
        TelephoneNumber,
        SalesmanId,
        Terms,
        CreatedAt,
    }
}

mod m20240101_000002_create_product_tables {
    use super::m20240101_000001_create_master_data_tables::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_product_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Unit).string().null())
                        .col(
                            ColumnDef::new(Products::UnitsPerPack)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Products::UnitPerBox)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::BoxAmount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::BoxRemain)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Supplier).string().null())
                        .col(ColumnDef::new(Products::ImportDate).date().null())
                        .col(ColumnDef::new(Products::ImportInvoiceNumber).string().null())
                        .col(ColumnDef::new(Products::RegistrationCode).string().null())
                        .col(ColumnDef::new(Products::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(Products::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SpecialPrices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SpecialPrices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SpecialPrices::CustomerId).integer().not_null())
                        .col(
                            ColumnDef::new(SpecialPrices::ProductBaseName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialPrices::SpecialPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_special_prices_customer")
                                .from(SpecialPrices::Table, SpecialPrices::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_special_prices_customer_base_name")
                        .table(SpecialPrices::Table)
                        .col(SpecialPrices::CustomerId)
                        .col(SpecialPrices::ProductBaseName)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductTransactions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::ProductId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::TransactionType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::Change)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::QuantityAfterTransaction)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductTransactions::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductTransactions::InvoiceId).integer().null())
                        .col(
                            ColumnDef::new(ProductTransactions::IsMemo)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_transactions_product")
                                .from(ProductTransactions::Table, ProductTransactions::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_transactions_product_timestamp")
                        .table(ProductTransactions::Table)
                        .col(ProductTransactions::ProductId)
                        .col(ProductTransactions::Timestamp)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SpecialPrices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Name,
        Price,
        Quantity,
        Unit,
        UnitsPerPack,
        UnitPerBox,
        BoxAmount,
        BoxRemain,
        Supplier,
        ImportDate,
        ImportInvoiceNumber,
        RegistrationCode,
        ExpiryDate,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SpecialPrices {
        Table,
        Id,
        CustomerId,
        ProductBaseName,
        SpecialPrice,
    }

    #[derive(DeriveIden)]
    enum ProductTransactions {
        Table,
        Id,
        ProductId,
        TransactionType,
        Change,
        QuantityAfterTransaction,
        Timestamp,
        Description,
        InvoiceId,
        IsMemo,
    }
}

mod m20240101_000003_create_invoice_tables {
    use super::m20240101_000001_create_master_data_tables::{Customers, Deliverymen, Salesmen};
    use super::m20240101_000002_create_product_tables::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::Number).string().not_null().unique_key())
                        .col(ColumnDef::new(Invoices::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Invoices::SalesmanId).integer().null())
                        .col(ColumnDef::new(Invoices::DeliverymanId).integer().null())
                        .col(ColumnDef::new(Invoices::Terms).string().null())
                        .col(ColumnDef::new(Invoices::OrderNumber).string().null())
                        .col(ColumnDef::new(Invoices::SampleCustomer).string().null())
                        .col(ColumnDef::new(Invoices::ChequeDetail).string().null())
                        .col(ColumnDef::new(Invoices::DeliveryDate).date().null())
                        .col(ColumnDef::new(Invoices::PaymentDate).date().null())
                        .col(ColumnDef::new(Invoices::DepositDate).date().null())
                        .col(
                            ColumnDef::new(Invoices::TotalPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Invoices::SalePosted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_customer")
                                .from(Invoices::Table, Invoices::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_salesman")
                                .from(Invoices::Table, Invoices::SalesmanId)
                                .to(Salesmen::Table, Salesmen::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_deliveryman")
                                .from(Invoices::Table, Invoices::DeliverymanId)
                                .to(Deliverymen::Table, Deliverymen::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_invoices_customer_id", Invoices::CustomerId),
                ("idx_invoices_delivery_date", Invoices::DeliveryDate),
                ("idx_invoices_payment_date", Invoices::PaymentDate),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Invoices::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).integer().not_null())
                        .col(ColumnDef::new(InvoiceItems::ProductId).integer().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::Price)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InvoiceItems::NetPrice).decimal_len(10, 2).null())
                        .col(
                            ColumnDef::new(InvoiceItems::HideNett)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::SumPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::ProductType)
                                .string_len(20)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice")
                                .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_product")
                                .from(InvoiceItems::Table, InvoiceItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_invoice_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AdditionalItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdditionalItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AdditionalItems::InvoiceId).integer().not_null())
                        .col(ColumnDef::new(AdditionalItems::Description).string().not_null())
                        .col(
                            ColumnDef::new(AdditionalItems::Price)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_additional_items_invoice")
                                .from(AdditionalItems::Table, AdditionalItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdditionalItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum Invoices {
        Table,
        Id,
        Number,
        CustomerId,
        SalesmanId,
        DeliverymanId,
        Terms,
        OrderNumber,
        SampleCustomer,
        ChequeDetail,
        DeliveryDate,
        PaymentDate,
        DepositDate,
        TotalPrice,
        SalePosted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        ProductId,
        Quantity,
        Price,
        NetPrice,
        HideNett,
        SumPrice,
        ProductType,
    }

    #[derive(DeriveIden)]
    enum AdditionalItems {
        Table,
        Id,
        InvoiceId,
        Description,
        Price,
    }
}
