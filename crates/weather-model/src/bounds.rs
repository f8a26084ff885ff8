//! Physical bounds for the weather state.
//!
//! Every produced state is saturated to [`HARD_LIMITS`]. The first state of a
//! run is drawn from the narrower [`START_RANGES`], a plausible mid-latitude
//! starting point.
//!
//! | Field       | Hard limit      | Start range    | Unit |
//! |-------------|-----------------|----------------|------|
//! | temperature | -25.0 .. 40.0   | -2.0 .. 25.0   | °C   |
//! | humidity    | 15.0 .. 100.0   | 35.0 .. 90.0   | %    |
//! | pressure    | 970.0 .. 1045.0 | 990.0 .. 1030.0| hPa  |
//! | wind speed  | 0.0 .. 30.0     | 0.5 .. 8.0     | m/s  |

use crate::state::WeatherState;

/// A closed interval `[min, max]` for a single state field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl FieldRange {
    /// Create a range. `min` must not exceed `max`.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Saturate `value` at the range bounds.
    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether `value` lies inside the range (bounds included).
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Map a unit draw in `[0, 1)` linearly onto the range.
    ///
    /// Draws outside `[0, 1]` are saturated first, so the result is always
    /// inside the range.
    pub fn sample(self, unit: f64) -> f64 {
        let t = if unit.is_finite() { unit.clamp(0.0, 1.0) } else { 0.0 };
        self.clamp(self.min + t * (self.max - self.min))
    }
}

/// One [`FieldRange`] per state field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateBounds {
    /// Temperature range in °C.
    pub temperature: FieldRange,
    /// Relative humidity range in %.
    pub humidity: FieldRange,
    /// Air pressure range in hPa.
    pub pressure: FieldRange,
    /// Wind speed range in m/s.
    pub wind_speed: FieldRange,
}

impl StateBounds {
    /// Whether every field of `state` lies inside its range.
    pub fn contains(&self, state: &WeatherState) -> bool {
        self.temperature.contains(state.temperature_c)
            && self.humidity.contains(state.humidity_percent)
            && self.pressure.contains(state.pressure_hpa)
            && self.wind_speed.contains(state.wind_speed_mps)
    }
}

/// Ranges every produced state is clamped to.
pub const HARD_LIMITS: StateBounds = StateBounds {
    temperature: FieldRange::new(-25.0, 40.0),
    humidity: FieldRange::new(15.0, 100.0),
    pressure: FieldRange::new(970.0, 1045.0),
    wind_speed: FieldRange::new(0.0, 30.0),
};

/// Ranges the initial state is sampled from.
pub const START_RANGES: StateBounds = StateBounds {
    temperature: FieldRange::new(-2.0, 25.0),
    humidity: FieldRange::new(35.0, 90.0),
    pressure: FieldRange::new(990.0, 1030.0),
    wind_speed: FieldRange::new(0.5, 8.0),
};

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn start_ranges_sit_inside_hard_limits() {
        let pairs = [
            (START_RANGES.temperature, HARD_LIMITS.temperature),
            (START_RANGES.humidity, HARD_LIMITS.humidity),
            (START_RANGES.pressure, HARD_LIMITS.pressure),
            (START_RANGES.wind_speed, HARD_LIMITS.wind_speed),
        ];
        for (start, hard) in pairs {
            assert!(hard.contains(start.min), "{start:?} escapes {hard:?}");
            assert!(hard.contains(start.max), "{start:?} escapes {hard:?}");
        }
    }

    #[test]
    fn clamp_saturates_at_both_ends() {
        let range = FieldRange::new(0.0, 30.0);
        assert_eq!(range.clamp(-4.2), 0.0);
        assert_eq!(range.clamp(31.0), 30.0);
        assert_eq!(range.clamp(12.5), 12.5);
        assert_eq!(range.clamp(f64::INFINITY), 30.0);
    }

    #[test]
    fn sample_maps_unit_interval_onto_range() {
        let range = FieldRange::new(990.0, 1030.0);
        assert_eq!(range.sample(0.0), 990.0);
        assert_eq!(range.sample(0.5), 1010.0);
        assert_eq!(range.sample(1.0), 1030.0);
    }

    #[test]
    fn sample_saturates_out_of_range_draws() {
        let range = FieldRange::new(-2.0, 25.0);
        assert_eq!(range.sample(-3.0), -2.0);
        assert_eq!(range.sample(7.0), 25.0);
        assert_eq!(range.sample(f64::NAN), -2.0);
    }
}
