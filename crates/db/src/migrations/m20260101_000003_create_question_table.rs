//! Create question table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::FormId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Text).string_len(500).not_null())
                    .col(ColumnDef::new(Question::QuestionType).string_len(20).not_null())
                    .col(ColumnDef::new(Question::Options).json())
                    .col(
                        ColumnDef::new(Question::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::HelpText).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_form")
                            .from(Question::Table, Question::FormId)
                            .to(Form::Table, Form::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One question per slot; also serves form_id lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_question_form_display_order")
                    .table(Question::Table)
                    .col(Question::FormId)
                    .col(Question::DisplayOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    FormId,
    Text,
    QuestionType,
    Options,
    DisplayOrder,
    IsRequired,
    HelpText,
}

#[derive(Iden)]
enum Form {
    Table,
    Id,
}
