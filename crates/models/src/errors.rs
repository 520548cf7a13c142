use sea_orm::{ConnAcquireErr, DbErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("pool closed")]
    PoolClosed,
    /// No connection could be obtained from the pool, or it broke mid-use.
    #[error("connection error: {0}")]
    Connection(String),
    #[error("database error: {0}")]
    Db(String),
}

impl From<DbErr> for ModelError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::ConnectionAcquire(ConnAcquireErr::ConnectionClosed) => Self::PoolClosed,
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => Self::Connection(e.to_string()),
            other => Self::Db(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_failures_are_connection_errors() {
        assert!(matches!(ModelError::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)), ModelError::Connection(_)));
        assert!(matches!(ModelError::from(DbErr::ConnectionAcquire(ConnAcquireErr::ConnectionClosed)), ModelError::PoolClosed));
        assert!(matches!(ModelError::from(DbErr::Custom("syntax".into())), ModelError::Db(_)));
    }
}
