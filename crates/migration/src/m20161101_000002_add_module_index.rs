use sea_orm_migration::prelude::*;

use crate::Module;

pub const MODULE_ID_INDEX: &str = "id_index";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_index(create_statement()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(MODULE_ID_INDEX).table(Module::Table).if_exists().to_owned())
            .await
    }
}

pub(crate) fn create_statement() -> IndexCreateStatement {
    Index::create()
        .name(MODULE_ID_INDEX)
        .table(Module::Table)
        .col(Module::Id)
        .if_not_exists()
        .to_owned()
}
