//! Weather state model for the weather station generator.
//!
//! The model is a bounded, correlated random walk over four quantities:
//! temperature, humidity, pressure, and wind speed. Temperature and pressure
//! wander freely; wind and humidity are pulled toward targets derived from
//! the values computed earlier in the same tick, which gives the series
//! instantaneous (not lagged) correlation.
//!
//! Nothing in this crate performs I/O. Randomness is always supplied by the
//! caller through [`NoiseSource`], so a fixed noise sequence yields a fixed
//! state sequence.
//!
//! # Modules
//!
//! - [`bounds`] -- Hard clamp ranges and initial sampling sub-ranges.
//! - [`evolution`] -- Initial sampling and the per-tick transition.
//! - [`noise`] -- [`NoiseSource`] trait and the [`RandomNoise`] adapter.
//! - [`state`] -- The immutable [`WeatherState`] value.
//!
//! [`NoiseSource`]: noise::NoiseSource
//! [`RandomNoise`]: noise::RandomNoise
//! [`WeatherState`]: state::WeatherState

pub mod bounds;
pub mod evolution;
pub mod noise;
pub mod state;

pub use bounds::{FieldRange, HARD_LIMITS, START_RANGES, StateBounds};
pub use evolution::{humidity_target, humidity_wind_suppression, low_pressure_factor, wind_target};
pub use noise::{NoiseSource, RandomNoise};
pub use state::WeatherState;
