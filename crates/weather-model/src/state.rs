//! The weather state value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A snapshot of the four simulated quantities.
///
/// States are plain values: a tick never mutates the current state, it
/// produces the next one (see [`WeatherState::step`]). Field names match the
/// persisted column names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    /// Air temperature in °C.
    pub temperature_c: f64,
    /// Relative humidity in %.
    pub humidity_percent: f64,
    /// Air pressure in hPa.
    pub pressure_hpa: f64,
    /// Wind speed in m/s.
    pub wind_speed_mps: f64,
}

impl WeatherState {
    /// Build a state from raw field values. No clamping or rounding is applied.
    pub const fn new(
        temperature_c: f64,
        humidity_percent: f64,
        pressure_hpa: f64,
        wind_speed_mps: f64,
    ) -> Self {
        Self {
            temperature_c,
            humidity_percent,
            pressure_hpa,
            wind_speed_mps,
        }
    }

    /// Return a copy with every field rounded to one decimal place.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            temperature_c: round_tenth(self.temperature_c),
            humidity_percent: round_tenth(self.humidity_percent),
            pressure_hpa: round_tenth(self.pressure_hpa),
            wind_speed_mps: round_tenth(self.wind_speed_mps),
        }
    }
}

impl fmt::Display for WeatherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temp={:.1}°C, hum={:.1}%, press={:.1}hPa, wind={:.1}m/s",
            self.temperature_c, self.humidity_percent, self.pressure_hpa, self.wind_speed_mps
        )
    }
}

/// Round to one decimal place from the exact binary value, ties to even.
///
/// Scaling by ten first would round twice and turn values such as 0.15
/// (stored just below 0.15) into 0.2. Fixed-precision formatting rounds the
/// exact value, so the text is parsed back instead.
pub(crate) fn round_tenth(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
