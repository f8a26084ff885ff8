//! Error types for the weather generator binary.
//!
//! [`GeneratorError`] is the top-level error type that wraps every fatal
//! failure mode during startup. Once the tick loop is running, persistence
//! failures are logged and counted rather than propagated.

use weather_db::DbError;

use crate::startup::StartupError;

/// Top-level error for the weather generator binary.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The database never became reachable.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: StartupError,
    },

    /// A database operation outside the tick loop failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying database error.
        #[from]
        source: DbError,
    },
}
