use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingAnchors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BillingAnchors::UserId).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(BillingAnchors::AnchorAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingAnchors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsageBuckets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsageBuckets::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(UsageBuckets::CycleStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageBuckets::CycleEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageBuckets::MessagesUsed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageBuckets::PageSpeedReportsUsed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageBuckets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageBuckets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UsageBuckets::UserId)
                            .col(UsageBuckets::CycleStart),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sites::UserId).uuid().not_null())
                    .col(ColumnDef::new(Sites::Domain).string().not_null())
                    .col(
                        ColumnDef::new(Sites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sites_user_id")
                    .table(Sites::Table)
                    .col(Sites::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsageBuckets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillingAnchors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BillingAnchors {
    Table,
    UserId,
    AnchorAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UsageBuckets {
    Table,
    UserId,
    CycleStart,
    CycleEnd,
    MessagesUsed,
    PageSpeedReportsUsed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
    UserId,
    Domain,
    CreatedAt,
}
