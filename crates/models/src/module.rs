//! The `module` table: one JSON configuration document per storage key.

use sea_orm::{entity::prelude::*, ConnectionTrait, DbBackend, QueryFilter, Statement};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "module")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    pub config: Json,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_SQL: &str = r#"INSERT INTO "module" ("id", "config") VALUES ($1, $2::json) ON CONFLICT ("id") DO UPDATE SET "config" = EXCLUDED."config""#;

/// All rows stored under `id`. The primary key allows at most one; callers
/// decide what to do when that does not hold.
pub async fn find_by_key<C: ConnectionTrait>(db: &C, id: &str) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Id.eq(id)).all(db).await?)
}

/// Insert the document under `id`, replacing any existing one.
///
/// `document` is JSON text; it is stored verbatim (the column is `json`, not
/// `jsonb`), so formatting survives the round trip.
pub async fn upsert<C: ConnectionTrait>(db: &C, id: &str, document: &str) -> Result<u64, ModelError> {
    if id.trim().is_empty() { return Err(ModelError::Validation("id required".into())); }
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        UPSERT_SQL,
        [id.to_owned().into(), document.to_owned().into()],
    );
    let res = db.execute(stmt).await?;
    Ok(res.rows_affected())
}
