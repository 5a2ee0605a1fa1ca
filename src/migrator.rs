use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250601_000001_create_devices_table::Migration)]
    }
}

mod m20250601_000001_create_devices_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000001_create_devices_table"
        }
    }

    #[async_trait::async_trait]
    #[allow(elided_lifetimes_in_paths)]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Devices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Devices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Devices::Device).string().not_null())
                        .col(ColumnDef::new(Devices::Provider).string().null())
                        .col(ColumnDef::new(Devices::Model).string().null())
                        .col(ColumnDef::new(Devices::DeviceType).string().null())
                        .col(ColumnDef::new(Devices::Os).string().null())
                        .col(ColumnDef::new(Devices::Specifications).string().null())
                        .col(ColumnDef::new(Devices::Ram).string().null())
                        .col(ColumnDef::new(Devices::Availability).string().not_null())
                        .col(ColumnDef::new(Devices::ProductId).string().null())
                        .col(ColumnDef::new(Devices::Price).decimal().null())
                        .col(ColumnDef::new(Devices::DateOfPurchase).date().null())
                        .col(ColumnDef::new(Devices::Comments).string().null())
                        .col(ColumnDef::new(Devices::AccessoryType).string().null())
                        .col(ColumnDef::new(Devices::DeviceNumber).string().not_null())
                        .col(ColumnDef::new(Devices::OrganizationId).string().not_null())
                        .col(ColumnDef::new(Devices::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(Devices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Product ids are globally unique when present (multiple
            // NULLs are permitted by the partial-unique semantics of
            // both Postgres and SQLite).
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_product_id")
                        .table(Devices::Table)
                        .col(Devices::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Backstop for the non-transactional device-number
            // generator: concurrent writers that observe the same count
            // trip this index instead of persisting duplicates.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_org_device_number")
                        .table(Devices::Table)
                        .col(Devices::OrganizationId)
                        .col(Devices::DeviceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_organization_id")
                        .table(Devices::Table)
                        .col(Devices::OrganizationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_created_at")
                        .table(Devices::Table)
                        .col(Devices::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Devices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Devices {
        Table,
        Id,
        Device,
        Provider,
        Model,
        DeviceType,
        Os,
        Specifications,
        Ram,
        Availability,
        ProductId,
        Price,
        DateOfPurchase,
        Comments,
        AccessoryType,
        DeviceNumber,
        OrganizationId,
        CreatedBy,
        CreatedAt,
    }
}
