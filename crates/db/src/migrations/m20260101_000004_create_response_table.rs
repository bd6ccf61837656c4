//! Create response table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Response::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Response::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Response::FormId).string_len(32).not_null())
                    .col(ColumnDef::new(Response::SubmittedBy).string_len(32))
                    .col(
                        ColumnDef::new(Response::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Response::IpAddress).string_len(45))
                    .col(ColumnDef::new(Response::UserAgent).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_form")
                            .from(Response::Table, Response::FormId)
                            .to(Form::Table, Form::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_submitted_by")
                            .from(Response::Table, Response::SubmittedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_response_form_id")
                    .table(Response::Table)
                    .col(Response::FormId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Response::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Response {
    Table,
    Id,
    FormId,
    SubmittedBy,
    SubmittedAt,
    IpAddress,
    UserAgent,
}

#[derive(Iden)]
enum Form {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
