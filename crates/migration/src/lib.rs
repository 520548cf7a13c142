//! Schema for the configuration store: the `module` table and its index.
//!
//! Every step is idempotent (`IF NOT EXISTS`), so the steps can be run on each
//! service start without the migration bookkeeping table. `Migrator` is kept
//! for operators who prefer tracked migrations.
pub use sea_orm_migration::prelude::*;

mod m20161101_000001_create_module;
mod m20161101_000002_add_module_index;

pub use m20161101_000001_create_module::Module;
pub use m20161101_000002_add_module_index::MODULE_ID_INDEX;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20161101_000001_create_module::Migration),
            // Indexes should always be applied last
            Box::new(m20161101_000002_add_module_index::Migration),
        ]
    }
}
