#![cfg(test)]
use std::sync::{Arc, Mutex};

use configs::StoreConfig;
use sea_orm::{DatabaseConnection, MockDatabase, MockExecResult, Transaction};

use crate::host::{ConfigBackend, ConfigHost};
use crate::store::ConfigStore;

/// Host stand-in recording every `set_interceptor` call (`true` = installed).
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<bool>>,
    active: Mutex<Option<Arc<dyn ConfigBackend>>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<bool> { self.calls.lock().unwrap().clone() }

    pub fn active(&self) -> Option<Arc<dyn ConfigBackend>> { self.active.lock().unwrap().clone() }
}

impl ConfigHost for RecordingHost {
    fn set_interceptor(&self, backend: Option<Arc<dyn ConfigBackend>>) {
        self.calls.lock().unwrap().push(backend.is_some());
        *self.active.lock().unwrap() = backend;
    }
}

/// Exec results for the two schema bootstrap statements.
pub fn ddl_ok() -> [MockExecResult; 2] {
    [MockExecResult { last_insert_id: 0, rows_affected: 0 }, MockExecResult { last_insert_id: 0, rows_affected: 0 }]
}

pub fn unloaded_store() -> (Arc<ConfigStore>, Arc<RecordingHost>) {
    common::utils::logging::init_logging_test();
    let host = Arc::new(RecordingHost::default());
    let store = ConfigStore::new(host.clone(), StoreConfig::default());
    (store, host)
}

/// Store loaded over a mock pool; the returned handle shares the mock's
/// transaction log.
pub async fn ready_store(mock: MockDatabase) -> (Arc<ConfigStore>, Arc<DatabaseConnection>, Arc<RecordingHost>) {
    let (store, host) = unloaded_store();
    let db = Arc::new(mock.into_connection());
    store.load_with_connection(db.clone()).await;
    (store, db, host)
}

/// Unload the store, then drain every statement the mock saw.
pub async fn transaction_log(store: &ConfigStore, db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    store.unload().await;
    match Arc::try_unwrap(db) {
        Ok(db) => db.into_transaction_log(),
        Err(_) => panic!("mock connection still shared after unload"),
    }
}
