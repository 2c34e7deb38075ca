use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Visualizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visualizations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Visualizations::Name).string().not_null())
                    .col(ColumnDef::new(Visualizations::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Visualizations::SpreadsheetId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Visualizations::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Visualizations::LastSyncedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Visualizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Visualizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visualizations_user_id")
                    .table(Visualizations::Table)
                    .col(Visualizations::UserId)
                    .to_owned(),
            )
            .await?;

        // Child tables carry no foreign key to visualizations: rows of a deleted
        // visualization are removed by the cleanup worker, not by a cascade.
        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Nodes::VisualizationId).integer().not_null())
                    .col(
                        ColumnDef::new(Nodes::IsCategory)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Nodes::Name).string().not_null())
                    .col(ColumnDef::new(Nodes::ShortDescription).text())
                    .col(ColumnDef::new(Nodes::LongDescription).text())
                    .col(ColumnDef::new(Nodes::ContextUrl).string())
                    .col(ColumnDef::new(Nodes::Credit).string())
                    .col(ColumnDef::new(Nodes::Importance).integer())
                    .col(ColumnDef::new(Nodes::CategoryIds).json_binary().not_null())
                    .col(ColumnDef::new(Nodes::NodeStyle).string())
                    .col(ColumnDef::new(Nodes::LabelStyle).string())
                    .col(
                        ColumnDef::new(Nodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_nodes_visualization_id")
                    .table(Nodes::Table)
                    .col(Nodes::VisualizationId)
                    .col(Nodes::IsCategory)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ErrorLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ErrorLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ErrorLogs::VisualizationId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ErrorLogs::Entries).json_binary().not_null())
                    .col(
                        ColumnDef::new(ErrorLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ErrorLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_error_logs_visualization_id")
                    .table(ErrorLogs::Table)
                    .col(ErrorLogs::VisualizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Styles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Styles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Styles::VisualizationId).integer().not_null())
                    .col(ColumnDef::new(Styles::Styles).text().not_null())
                    .col(
                        ColumnDef::new(Styles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_styles_visualization_id")
                    .table(Styles::Table)
                    .col(Styles::VisualizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CleanupTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CleanupTasks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CleanupTasks::VisualizationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CleanupTasks::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CleanupTasks::LastError).text())
                    .col(
                        ColumnDef::new(CleanupTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CleanupTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CleanupTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Styles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ErrorLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Visualizations::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Visualizations {
    Table,
    Id,
    Name,
    UserId,
    SpreadsheetId,
    IsPublic,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Nodes {
    Table,
    Id,
    VisualizationId,
    IsCategory,
    Name,
    ShortDescription,
    LongDescription,
    ContextUrl,
    Credit,
    Importance,
    CategoryIds,
    NodeStyle,
    LabelStyle,
    CreatedAt,
}

#[derive(Iden)]
enum ErrorLogs {
    Table,
    Id,
    VisualizationId,
    Entries,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Styles {
    Table,
    Id,
    VisualizationId,
    Styles,
    CreatedAt,
}

#[derive(Iden)]
enum CleanupTasks {
    Table,
    Id,
    VisualizationId,
    Attempts,
    LastError,
    CreatedAt,
    UpdatedAt,
}
