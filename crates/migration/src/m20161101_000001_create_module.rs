//! Create `module` table.
//!
//! One row per storage key; `config` holds the JSON document as written.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_statement()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Module::Table).if_exists().to_owned()).await
    }
}

pub(crate) fn create_statement() -> TableCreateStatement {
    Table::create()
        .table(Module::Table)
        .if_not_exists()
        .col(text(Module::Id).primary_key())
        .col(json(Module::Config))
        .to_owned()
}

#[derive(DeriveIden)]
pub enum Module { Table, Id, Config }
