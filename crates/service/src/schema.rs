//! Schema bootstrap run once per service start.
//!
//! Each step is `IF NOT EXISTS`, so concurrent starts settle in the database.
//! A failed step is logged and skipped; later steps still run and the store
//! still comes up.

use migration::{Migrator, MigratorTrait, SchemaManager};
use sea_orm::DatabaseConnection;
use tracing::{debug, error};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub applied: Vec<String>,
    /// `(step, error)` for every step that failed.
    pub failed: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool { self.failed.is_empty() }
}

pub async fn ensure_schema(db: &DatabaseConnection) -> SchemaReport {
    let manager = SchemaManager::new(db);
    let mut report = SchemaReport::default();
    for step in Migrator::migrations() {
        let name = step.name().to_string();
        match step.up(&manager).await {
            Ok(()) => {
                debug!(step = %name, "schema step applied");
                report.applied.push(name);
            }
            Err(e) => {
                error!(step = %name, error = %e, "schema step failed");
                report.failed.push((name, e.to_string()));
            }
        }
    }
    report
}
