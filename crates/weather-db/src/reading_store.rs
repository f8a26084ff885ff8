//! Append-only store for weather readings.
//!
//! One reading is written per generator tick. The insert is a single
//! `INSERT ... RETURNING` statement, so the four values of a reading become
//! visible together or not at all. Rows are never updated or deleted here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use weather_model::WeatherState;

use crate::error::DbError;

/// Operations on the `weather_readings` table.
pub struct ReadingStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ReadingStore<'a> {
    /// Create a new reading store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one reading and return it as stored.
    ///
    /// The database assigns `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, state: &WeatherState) -> Result<WeatherReading, DbError> {
        let reading = sqlx::query_as::<_, WeatherReading>(
            r"INSERT INTO weather_readings (temperature_c, humidity_percent, pressure_hpa, wind_speed_mps)
              VALUES ($1, $2, $3, $4)
              RETURNING id, created_at, temperature_c, humidity_percent, pressure_hpa, wind_speed_mps",
        )
        .bind(state.temperature_c)
        .bind(state.humidity_percent)
        .bind(state.pressure_hpa)
        .bind(state.wind_speed_mps)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(id = reading.id, "Inserted weather reading");
        Ok(reading)
    }

    /// Most recent readings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn latest(&self, limit: u32) -> Result<Vec<WeatherReading>, DbError> {
        let rows = sqlx::query_as::<_, WeatherReading>(
            r"SELECT id, created_at, temperature_c, humidity_percent, pressure_hpa, wind_speed_mps
              FROM weather_readings
              ORDER BY created_at DESC, id DESC
              LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Total number of stored readings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM weather_readings")
            .fetch_one(self.pool)
            .await?;
        Ok(row.0)
    }
}

/// A row from the `weather_readings` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WeatherReading {
    /// Database-assigned identifier. Unique, not necessarily gap-free.
    pub id: i64,
    /// Database-assigned insertion time.
    pub created_at: DateTime<Utc>,
    /// Air temperature in °C.
    pub temperature_c: f64,
    /// Relative humidity in %.
    pub humidity_percent: f64,
    /// Air pressure in hPa.
    pub pressure_hpa: f64,
    /// Wind speed in m/s.
    pub wind_speed_mps: f64,
}

impl WeatherReading {
    /// The measured values without the database metadata.
    pub const fn state(&self) -> WeatherState {
        WeatherState::new(
            self.temperature_c,
            self.humidity_percent,
            self.pressure_hpa,
            self.wind_speed_mps,
        )
    }
}
