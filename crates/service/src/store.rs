use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use configs::{DatabaseConfig, StoreConfig};
use models::module;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::codec;
use crate::descriptor::Descriptor;
use crate::errors::StoreError;
use crate::host::{ConfigBackend, ConfigHost};
use crate::key::{KeyResolver, KeyRoots};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unloaded,
    Loading,
    Ready,
}

enum State {
    Unloaded,
    /// Carries the attempt number so a load overtaken by `unload` can tell.
    Loading(u64),
    Ready(Arc<DatabaseConnection>),
}

impl State {
    fn lifecycle(&self) -> Lifecycle {
        match self {
            Self::Unloaded => Lifecycle::Unloaded,
            Self::Loading(_) => Lifecycle::Loading,
            Self::Ready(_) => Lifecycle::Ready,
        }
    }
}

/// Result of a lookup that separates "nothing stored" from a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    NotFound,
}

impl Lookup {
    pub fn into_document(self) -> Value {
        match self {
            Self::Found(v) => v,
            Self::NotFound => codec::empty_document(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The document pruned to nothing; the stored row was left as it was.
    Skipped,
}

/// Configuration backend persisting one JSON document per module in PostgreSQL.
///
/// The store owns its pool. `load` opens it, bootstraps the schema and
/// registers the store with the host; `unload` closes it and deregisters.
pub struct ConfigStore {
    host: Arc<dyn ConfigHost>,
    config: StoreConfig,
    resolver: KeyResolver,
    state: RwLock<State>,
    attempts: AtomicU64,
}

impl ConfigStore {
    pub fn new(host: Arc<dyn ConfigHost>, config: StoreConfig) -> Arc<Self> {
        let resolver = KeyResolver::new(KeyRoots::from_paths(&config.paths), host.global_indicator());
        Arc::new(Self { host, config, resolver, state: RwLock::new(State::Unloaded), attempts: AtomicU64::new(0) })
    }

    /// Store configured from `.env`, `CONFIG_PATH` / `config.toml` and
    /// `DATABASE_URL`, defaults otherwise.
    pub fn from_env(host: Arc<dyn ConfigHost>) -> Result<Arc<Self>, StoreError> {
        let config = StoreConfig::load_and_validate().map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self::new(host, config))
    }

    pub fn resolver(&self) -> &KeyResolver { &self.resolver }

    pub async fn lifecycle(&self) -> Lifecycle { self.state.read().await.lifecycle() }

    /// Open the pool, bootstrap the schema and register with the host.
    ///
    /// `DATABASE_URL` (from the process or a `.env` file) takes precedence
    /// over the configured settings. The pool connects lazily and schema
    /// failures are only logged, so an unreachable database does not keep the
    /// store from registering. Only unusable settings return an error. Loading
    /// a loaded store is a no-op.
    pub async fn load(self: &Arc<Self>) -> Result<(), StoreError> {
        configs::load_env_file();
        let mut settings = self.config.database.clone();
        let resolved = match settings.normalize_from_env() {
            Ok(()) => Ok(settings),
            Err(e) => Err(StoreError::Config(e.to_string())),
        };
        self.open(resolved).await
    }

    /// Like [`ConfigStore::load`], with explicit settings; the environment is not consulted.
    pub async fn load_with_settings(self: &Arc<Self>, settings: DatabaseConfig) -> Result<(), StoreError> {
        self.open(Ok(settings)).await
    }

    /// Like [`ConfigStore::load`], with a pool the caller already opened.
    pub async fn load_with_connection(self: &Arc<Self>, db: Arc<DatabaseConnection>) {
        if let Some(attempt) = self.begin_loading().await {
            self.finish_loading(attempt, db).await;
        }
    }

    async fn open(self: &Arc<Self>, settings: Result<DatabaseConfig, StoreError>) -> Result<(), StoreError> {
        let Some(attempt) = self.begin_loading().await else {
            return Ok(());
        };
        let opened = match settings {
            Ok(settings) => models::db::connect_with_config(&settings).await.map_err(StoreError::from),
            Err(e) => Err(e),
        };
        match opened {
            Ok(db) => {
                self.finish_loading(attempt, Arc::new(db)).await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "config store failed to open its pool");
                let mut state = self.state.write().await;
                if matches!(*state, State::Loading(current) if current == attempt) {
                    *state = State::Unloaded;
                }
                Err(e)
            }
        }
    }

    async fn begin_loading(&self) -> Option<u64> {
        let mut state = self.state.write().await;
        if matches!(*state, State::Unloaded) {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            *state = State::Loading(attempt);
            return Some(attempt);
        }
        warn!(state = ?state.lifecycle(), "config store already loaded");
        None
    }

    async fn finish_loading(self: &Arc<Self>, attempt: u64, db: Arc<DatabaseConnection>) {
        let report = schema::ensure_schema(&db).await;
        if !report.is_complete() {
            warn!(failed = report.failed.len(), "schema bootstrap incomplete; continuing");
        }
        let mut state = self.state.write().await;
        if !matches!(*state, State::Loading(current) if current == attempt) {
            drop(state);
            warn!(attempt, "config store unloaded while loading; discarding its pool");
            models::db::close(&db).await;
            return;
        }
        *state = State::Ready(db);
        // registered under the lock so a concurrent unload cannot interleave
        let backend: Arc<dyn ConfigBackend> = self.clone();
        self.host.set_interceptor(Some(backend));
        drop(state);
        info!("config store ready");
    }

    /// Close the pool and deregister from the host. Safe to call twice.
    ///
    /// An unload that overtakes a `load` in progress wins: that load closes
    /// the pool it opened and never registers.
    pub async fn unload(&self) {
        let previous = {
            let mut state = self.state.write().await;
            self.host.set_interceptor(None);
            std::mem::replace(&mut *state, State::Unloaded)
        };
        match previous {
            State::Ready(db) => models::db::close(&db).await,
            _ => debug!("unload on a config store that was not ready"),
        }
        info!("config store unloaded");
    }

    async fn connection(&self) -> Result<Arc<DatabaseConnection>, StoreError> {
        match &*self.state.read().await {
            State::Ready(db) => Ok(db.clone()),
            _ => Err(StoreError::PoolClosed),
        }
    }

    #[instrument(skip(self, descriptor), fields(descriptor = %descriptor))]
    pub async fn try_load_config(&self, descriptor: &Descriptor) -> Result<Lookup, StoreError> {
        let key = self.resolver.resolve(descriptor);
        let db = self.connection().await?;
        let mut rows = module::find_by_key(db.as_ref(), &key).await?;
        match rows.len() {
            0 => Ok(Lookup::NotFound),
            1 => Ok(Lookup::Found(codec::decode(rows.pop().map(|r| r.config)))),
            n => Err(StoreError::Ambiguous { key, rows: n }),
        }
    }

    #[instrument(skip(self, descriptor, config), fields(descriptor = %descriptor))]
    pub async fn try_save_config(&self, descriptor: &Descriptor, config: &Value) -> Result<SaveOutcome, StoreError> {
        let key = self.resolver.resolve(descriptor);
        let Some(document) = codec::encode(config)? else {
            debug!(%key, "nothing to write");
            return Ok(SaveOutcome::Skipped);
        };
        let db = self.connection().await?;
        module::upsert(db.as_ref(), &key, &document).await?;
        debug!(%key, bytes = document.len(), "configuration saved");
        Ok(SaveOutcome::Written)
    }

    /// Stored document, or `{}` when nothing is stored or the lookup failed.
    pub async fn load_config(&self, descriptor: &Descriptor) -> Value {
        match self.try_load_config(descriptor).await {
            Ok(found) => found.into_document(),
            Err(e @ StoreError::Ambiguous { .. }) => {
                error!(%descriptor, error = %e, "configuration key is not unique; using empty document");
                codec::empty_document()
            }
            Err(e) => {
                warn!(%descriptor, error = %e, connectivity = e.is_connectivity(), "configuration load failed; using empty document");
                codec::empty_document()
            }
        }
    }

    /// Persist the document; failures are logged and otherwise ignored.
    pub async fn save_config(&self, descriptor: &Descriptor, config: &Value) {
        if let Err(e) = self.try_save_config(descriptor, config).await {
            warn!(%descriptor, error = %e, connectivity = e.is_connectivity(), "configuration save failed");
        }
    }
}

#[async_trait]
impl ConfigBackend for ConfigStore {
    async fn load_config(&self, descriptor: &Descriptor) -> Value {
        ConfigStore::load_config(self, descriptor).await
    }

    async fn save_config(&self, descriptor: &Descriptor, config: &Value) {
        ConfigStore::save_config(self, descriptor, config).await
    }
}
