use models::errors::ModelError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pool closed: the store is not loaded")]
    PoolClosed,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("connection error: {0}")]
    Connect(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("codec error: {0}")]
    Codec(String),
    /// More than one row under a primary key; the table is not what we created.
    #[error("{rows} rows stored under key {key:?}, expected at most one")]
    Ambiguous { key: String, rows: usize },
}

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => Self::Config(m),
            ModelError::PoolClosed => Self::PoolClosed,
            ModelError::Connection(m) => Self::Connect(m),
            ModelError::Db(m) => Self::Query(m),
        }
    }
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self { ModelError::from(e).into() }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self { Self::Codec(e.to_string()) }
}

impl StoreError {
    /// Whether the failure came from reaching the database rather than from a statement.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::PoolClosed | Self::Connect(_))
    }
}
