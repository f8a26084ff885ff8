//! `PostgreSQL` persistence for the weather station generator.
//!
//! Each generator tick appends one row to `weather_readings`. The database
//! assigns the row id and the `created_at` timestamp; the generator supplies
//! the four measured values.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, liveness ping, and
//!   schema migrations
//! - [`reading_store`] -- Appending and querying weather readings
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod reading_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use reading_store::{ReadingStore, WeatherReading};
