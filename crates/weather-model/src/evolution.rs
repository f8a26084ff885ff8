//! Initial sampling and the per-tick state transition.
//!
//! # Transition order
//!
//! Within one tick the fields are computed in a fixed order, and each later
//! field reads the values already produced for this tick:
//!
//! ```text
//! temperature = clamp(prev + N(0, 0.25))
//! pressure    = clamp(prev + N(0, 0.35))
//! wind        = clamp(prev + 0.25 * (wind_target(pressure) - prev) + N(0, 0.45))
//! humidity    = clamp(prev + 0.18 * (humidity_target(temperature) - prev) + N(0, 1.8)
//!                     - 0.10 * max(0, wind - 10))
//! ```
//!
//! Temperature and pressure are the primary random walks. Wind is smoothed
//! toward a target that rises as pressure falls below 1018 hPa, and humidity
//! is smoothed toward a target that falls as temperature rises, with an extra
//! drying term once wind exceeds 10 m/s. All four outputs are rounded to one
//! decimal place.
//!
//! Noise is drawn in the same order the fields are computed, so a scripted
//! [`NoiseSource`] fully determines the outcome.

use crate::bounds::{HARD_LIMITS, START_RANGES};
use crate::noise::NoiseSource;
use crate::state::WeatherState;

/// Per-tick temperature noise (°C).
const TEMPERATURE_STD_DEV: f64 = 0.25;
/// Per-tick pressure noise (hPa).
const PRESSURE_STD_DEV: f64 = 0.35;
/// Per-tick wind noise (m/s).
const WIND_STD_DEV: f64 = 0.45;
/// Per-tick humidity noise (%).
const HUMIDITY_STD_DEV: f64 = 1.8;

/// Pressure at which the wind target is at its calm baseline.
const NEUTRAL_PRESSURE_HPA: f64 = 1018.0;
/// Pressure drop that saturates the low-pressure factor.
const PRESSURE_SPAN_HPA: f64 = 25.0;
/// Wind target under neutral or high pressure.
const CALM_WIND_MPS: f64 = 3.0;
/// Extra wind target at full low-pressure factor.
const LOW_PRESSURE_WIND_GAIN_MPS: f64 = 6.0;
/// Fraction of the gap to the wind target closed per tick.
const WIND_SMOOTHING: f64 = 0.25;

/// Humidity target at the reference temperature.
const BASELINE_HUMIDITY_PERCENT: f64 = 70.0;
/// Temperature at which the humidity target equals the baseline.
const REFERENCE_TEMPERATURE_C: f64 = 10.0;
/// Humidity target change per degree of temperature.
const HUMIDITY_PER_DEGREE: f64 = 1.2;
/// Fraction of the gap to the humidity target closed per tick.
const HUMIDITY_SMOOTHING: f64 = 0.18;
/// Wind speed above which humidity is suppressed further.
const GUST_THRESHOLD_MPS: f64 = 10.0;
/// Humidity removed per m/s of wind above the gust threshold.
const GUST_DRYING_PER_MPS: f64 = 0.10;

impl WeatherState {
    /// Sample a starting state.
    ///
    /// Each field is drawn independently and uniformly from its
    /// [`START_RANGES`] entry, then rounded to one decimal place. No
    /// correlation is applied.
    pub fn initial(noise: &mut impl NoiseSource) -> Self {
        Self {
            temperature_c: START_RANGES.temperature.sample(noise.unit()),
            humidity_percent: START_RANGES.humidity.sample(noise.unit()),
            pressure_hpa: START_RANGES.pressure.sample(noise.unit()),
            wind_speed_mps: START_RANGES.wind_speed.sample(noise.unit()),
        }
        .rounded()
    }

    /// Advance the state by one tick.
    ///
    /// Total over any finite state: every output field is clamped to
    /// [`HARD_LIMITS`] and rounded, whatever the noise. Non-finite draws are
    /// treated as zero.
    #[must_use]
    pub fn step(&self, noise: &mut impl NoiseSource) -> Self {
        let temperature = HARD_LIMITS
            .temperature
            .clamp(self.temperature_c + draw(noise, TEMPERATURE_STD_DEV));

        let pressure = HARD_LIMITS
            .pressure
            .clamp(self.pressure_hpa + draw(noise, PRESSURE_STD_DEV));

        let wind = HARD_LIMITS.wind_speed.clamp(wind_drift(
            self.wind_speed_mps,
            pressure,
            draw(noise, WIND_STD_DEV),
        ));

        let humidity = HARD_LIMITS.humidity.clamp(humidity_drift(
            self.humidity_percent,
            temperature,
            wind,
            draw(noise, HUMIDITY_STD_DEV),
        ));

        Self {
            temperature_c: temperature,
            humidity_percent: humidity,
            pressure_hpa: pressure,
            wind_speed_mps: wind,
        }
        .rounded()
    }
}

/// How far pressure sits below neutral, scaled to `[-1, 1]`.
///
/// Positive below 1018 hPa, saturating at 1.0 for 993 hPa and lower.
pub fn low_pressure_factor(pressure_hpa: f64) -> f64 {
    ((NEUTRAL_PRESSURE_HPA - pressure_hpa) / PRESSURE_SPAN_HPA).clamp(-1.0, 1.0)
}

/// Wind speed the wind field is pulled toward for a given pressure.
///
/// 3 m/s at or above 1018 hPa, rising linearly to 9 m/s at 993 hPa.
pub fn wind_target(pressure_hpa: f64) -> f64 {
    CALM_WIND_MPS + LOW_PRESSURE_WIND_GAIN_MPS * low_pressure_factor(pressure_hpa).max(0.0)
}

/// Humidity the humidity field is pulled toward for a given temperature.
pub fn humidity_target(temperature_c: f64) -> f64 {
    BASELINE_HUMIDITY_PERCENT - HUMIDITY_PER_DEGREE * (temperature_c - REFERENCE_TEMPERATURE_C)
}

/// Humidity removed by wind above the gust threshold.
pub fn humidity_wind_suppression(wind_speed_mps: f64) -> f64 {
    GUST_DRYING_PER_MPS * (wind_speed_mps - GUST_THRESHOLD_MPS).max(0.0)
}

fn draw(noise: &mut impl NoiseSource, std_dev: f64) -> f64 {
    let value = noise.gaussian(std_dev);
    if value.is_finite() { value } else { 0.0 }
}

/// Unclamped wind update.
fn wind_drift(previous: f64, pressure_hpa: f64, noise: f64) -> f64 {
    previous + WIND_SMOOTHING * (wind_target(pressure_hpa) - previous) + noise
}

/// Unclamped humidity update.
fn humidity_drift(previous: f64, temperature_c: f64, wind_speed_mps: f64, noise: f64) -> f64 {
    previous + HUMIDITY_SMOOTHING * (humidity_target(temperature_c) - previous) + noise
        - humidity_wind_suppression(wind_speed_mps)
}

#[cfg(test)]
#[allow(
    clippy::float_cmp,
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::collections::VecDeque;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::noise::RandomNoise;

    /// Replays fixed draws; falls back to 0.0 normals and 0.5 units when empty.
    struct ScriptedNoise {
        normals: VecDeque<f64>,
        units: VecDeque<f64>,
    }

    impl ScriptedNoise {
        fn normals(values: &[f64]) -> Self {
            Self {
                normals: values.iter().copied().collect(),
                units: VecDeque::new(),
            }
        }

        fn units(values: &[f64]) -> Self {
            Self {
                normals: VecDeque::new(),
                units: values.iter().copied().collect(),
            }
        }

        fn zero() -> Self {
            Self::normals(&[])
        }
    }

    impl NoiseSource for ScriptedNoise {
        fn standard_normal(&mut self) -> f64 {
            self.normals.pop_front().unwrap_or(0.0)
        }

        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.5)
        }
    }

    /// Every draw returns the same standard-normal value.
    struct ConstantNoise(f64);

    impl NoiseSource for ConstantNoise {
        fn standard_normal(&mut self) -> f64 {
            self.0
        }

        fn unit(&mut self) -> f64 {
            0.5
        }
    }

    fn has_at_most_one_decimal(value: f64) -> bool {
        let text = value.to_string();
        text.split('.').nth(1).is_none_or(|digits| digits.len() <= 1)
    }

    fn assert_rounded(state: &WeatherState) {
        for value in [
            state.temperature_c,
            state.humidity_percent,
            state.pressure_hpa,
            state.wind_speed_mps,
        ] {
            assert!(has_at_most_one_decimal(value), "{value} has more than one decimal in {state:?}");
        }
    }

    #[test]
    fn zero_noise_reference_point_is_fixed() {
        let start = WeatherState::new(10.0, 70.0, 1018.0, 3.0);
        let next = start.step(&mut ScriptedNoise::zero());
        assert_eq!(next, start);
    }

    #[test]
    fn later_fields_use_values_from_the_same_tick() {
        // temperature +1.0, pressure -3.5, wind and humidity noise zero.
        let start = WeatherState::new(10.0, 70.0, 1018.0, 3.0);
        let mut noise = ScriptedNoise::normals(&[4.0, -10.0, 0.0, 0.0]);
        let next = start.step(&mut noise);

        assert_eq!(next.temperature_c, 11.0);
        assert_eq!(next.pressure_hpa, 1014.5);
        // Target from the new pressure: 3 + 6 * 0.14 = 3.84; 3 + 0.25 * 0.84 = 3.21.
        assert_eq!(next.wind_speed_mps, 3.2);
        // Target from the new temperature: 68.8; 70 + 0.18 * -1.2 = 69.784.
        assert_eq!(next.humidity_percent, 69.8);
    }

    #[test]
    fn wind_relaxes_toward_calm_under_high_pressure() {
        let start = WeatherState::new(10.0, 70.0, 1030.0, 11.0);
        let next = start.step(&mut ScriptedNoise::zero());
        // 11 + 0.25 * (3 - 11) = 9.0
        assert_eq!(next.wind_speed_mps, 9.0);
    }

    #[test]
    fn strong_wind_dries_the_air() {
        let calm = WeatherState::new(10.0, 70.0, 1018.0, 3.0).step(&mut ScriptedNoise::zero());
        // Wind 30 pulls toward 3: 30 - 6.75 = 23.25, an exact tie stored as 23.2.
        // Humidity loses 0.1 * 13.25 = 1.325 to drying.
        let gale = WeatherState::new(10.0, 70.0, 1018.0, 30.0).step(&mut ScriptedNoise::zero());
        assert_eq!(gale.wind_speed_mps, 23.2);
        assert!(gale.humidity_percent < calm.humidity_percent);
        assert!(
            (gale.humidity_percent - 68.675).abs() <= 0.05 + 1e-9,
            "humidity {} not within rounding of 68.675",
            gale.humidity_percent
        );
    }

    #[test]
    fn outputs_stay_in_range_from_every_corner() {
        let t = HARD_LIMITS.temperature;
        let h = HARD_LIMITS.humidity;
        let p = HARD_LIMITS.pressure;
        let w = HARD_LIMITS.wind_speed;
        let draws = [0.0, 1.0, -1.0, 50.0, -50.0, 1.0e6, -1.0e6, f64::MAX, f64::MIN, f64::NAN];

        for temperature in [t.min, t.max] {
            for humidity in [h.min, h.max] {
                for pressure in [p.min, p.max] {
                    for wind in [w.min, w.max] {
                        let start = WeatherState::new(temperature, humidity, pressure, wind);
                        for z in draws {
                            let next = start.step(&mut ConstantNoise(z));
                            assert!(
                                HARD_LIMITS.contains(&next),
                                "{next:?} out of range from {start:?} with draw {z}"
                            );
                            assert_rounded(&next);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn long_random_walk_respects_bounds_and_rounding() {
        let mut noise = RandomNoise::new(SmallRng::seed_from_u64(2024));
        let mut state = WeatherState::initial(&mut noise);
        for _ in 0..20_000 {
            state = state.step(&mut noise);
            assert!(HARD_LIMITS.contains(&state), "{state:?} out of range");
            assert_rounded(&state);
        }
    }

    #[test]
    fn fixed_draws_reproduce_the_same_series() {
        let mut a = RandomNoise::new(SmallRng::seed_from_u64(99));
        let mut b = RandomNoise::new(SmallRng::seed_from_u64(99));
        let mut state_a = WeatherState::initial(&mut a);
        let mut state_b = WeatherState::initial(&mut b);
        assert_eq!(state_a, state_b);
        for _ in 0..500 {
            state_a = state_a.step(&mut a);
            state_b = state_b.step(&mut b);
            assert_eq!(state_a, state_b);
        }
    }

    #[test]
    fn wind_target_never_falls_as_pressure_falls() {
        let mut previous = wind_target(1018.0);
        assert_eq!(previous, 3.0);
        // 1018.0 down to 993.0 in 0.1 hPa steps.
        for i in 1..=250 {
            let pressure = 1018.0 - f64::from(i) * 0.1;
            let target = wind_target(pressure);
            assert!(target >= previous, "target fell from {previous} to {target} at {pressure}");
            previous = target;
        }
        assert!((previous - 9.0).abs() < 1e-9);
    }

    #[test]
    fn wind_target_saturates_outside_the_span() {
        assert_eq!(wind_target(1045.0), 3.0);
        assert_eq!(wind_target(970.0), 9.0);
        assert_eq!(low_pressure_factor(1043.0), -1.0);
        assert_eq!(low_pressure_factor(993.0), 1.0);
    }

    #[test]
    fn wind_above_threshold_lowers_humidity_by_a_tenth_per_mps() {
        let base = 12.0;
        for delta in [0.5, 1.0, 3.0, 10.0] {
            let slower = humidity_drift(60.0, 15.0, base, 0.0);
            let faster = humidity_drift(60.0, 15.0, base + delta, 0.0);
            let drop = slower - faster;
            assert!((drop - 0.10 * delta).abs() < 1e-9, "drop {drop} for delta {delta}");
        }
    }

    #[test]
    fn wind_at_or_below_threshold_does_not_dry() {
        assert_eq!(humidity_wind_suppression(0.0), 0.0);
        assert_eq!(humidity_wind_suppression(10.0), 0.0);
        assert!((humidity_wind_suppression(14.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn humidity_target_falls_as_temperature_rises() {
        assert_eq!(humidity_target(10.0), 70.0);
        assert!(humidity_target(25.0) < humidity_target(5.0));
    }

    #[test]
    fn initial_state_lies_in_start_ranges() {
        for unit in [0.0, 0.25, 0.5, 0.999_999] {
            let state = WeatherState::initial(&mut ScriptedNoise::units(&[unit, unit, unit, unit]));
            assert!(START_RANGES.contains(&state), "{state:?} outside start ranges");
            assert_rounded(&state);
        }
    }

    #[test]
    fn initial_state_uses_independent_draws() {
        let mut noise = ScriptedNoise::units(&[0.0, 1.0, 0.5, 0.0]);
        let state = WeatherState::initial(&mut noise);
        assert_eq!(state, WeatherState::new(-2.0, 90.0, 1010.0, 0.5));
    }

    #[test]
    fn initial_state_from_rng_is_in_start_ranges() {
        let mut noise = RandomNoise::new(SmallRng::seed_from_u64(5));
        for _ in 0..1_000 {
            let state = WeatherState::initial(&mut noise);
            assert!(START_RANGES.contains(&state), "{state:?} outside start ranges");
        }
    }
}
