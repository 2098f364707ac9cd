//! Pure time-of-day curve functions shared by the engine and live adapter.
//!
//! All functions take the hour index `t` of the projection horizon; the
//! daily shape repeats every 24 hours.

use std::f64::consts::PI;

use crate::city::{CityParams, DistrictId};

/// Fraction of the day elapsed at hour `t`, in `[0, 1)`.
pub fn day_frac(t: usize) -> f64 {
    (t % 24) as f64 / 24.0
}

/// Gaussian bump centred on 18:00 with unit height.
///
/// ```
/// use citygrid_twin::sim::curves::evening_peak;
///
/// assert!((evening_peak(18) - 1.0).abs() < 1e-12);
/// assert!(evening_peak(3) < 1e-6);
/// ```
pub fn evening_peak(t: usize) -> f64 {
    let d = day_frac(t);
    (-(d - 0.75).powi(2) / (2.0 * 0.06_f64.powi(2))).exp()
}

/// Ambient temperature factor, clamped to `0.95..=1.3`.
pub fn temperature_factor(t: usize, params: &CityParams) -> f64 {
    let d = day_frac(t);
    let mut factor = 1.0 + 0.1 * (2.0 * PI * (d - 0.25)).sin();
    if params.heatwave_enabled {
        factor *= 1.12;
        factor += 0.06 * (-(d - 0.65).powi(2) / (2.0 * 0.08_f64.powi(2))).exp();
    }
    clamp(factor, 0.95, 1.3)
}

/// Normalized solar irradiance, zero at night, damped under storm.
pub fn solar_shape(t: usize, params: &CityParams) -> f64 {
    let mut s = (PI * day_frac(t)).sin().max(0.0).powf(1.5);
    if params.storm_enabled {
        s *= 0.55;
    }
    clamp(s, 0.0, 1.0)
}

/// Diurnal base-load multiplier.
pub fn base_shape(t: usize) -> f64 {
    0.92 + 0.1 * (2.0 * PI * (day_frac(t) - 0.2)).sin() + 0.06 * evening_peak(t)
}

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Deterministic per-(district, hour) noise in `[0, 1]`.
///
/// FNV-1a (32-bit) over the bytes of `"{id}:{t}"`, divided by `u32::MAX`.
pub fn jitter(id: DistrictId, t: usize) -> f64 {
    let key = format!("{}:{}", id.as_str(), t);
    let hash = key
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME));
    f64::from(hash) / f64::from(u32::MAX)
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `min(hi, max(lo, v))`. Unlike [`f64::clamp`] this never panics when the
/// bounds are inverted.
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Rounds `v` to `digits` decimal places.
pub fn round_to(v: f64, digits: i32) -> f64 {
    let scale = 10_f64.powi(digits);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_frac_wraps_daily() {
        assert_eq!(day_frac(0), 0.0);
        assert_eq!(day_frac(6), 0.25);
        assert_eq!(day_frac(30), day_frac(6));
        assert_eq!(day_frac(72), 0.0);
    }

    #[test]
    fn temperature_factor_bounds() {
        let calm = CityParams::default();
        let hot = CityParams {
            heatwave_enabled: true,
            ..calm
        };
        for t in 0..=72 {
            for p in [&calm, &hot] {
                let f = temperature_factor(t, p);
                assert!((0.95..=1.3).contains(&f), "t={t} f={f}");
            }
            assert!(temperature_factor(t, &hot) >= temperature_factor(t, &calm));
        }
    }

    #[test]
    fn solar_shape_zero_at_night_and_damped_by_storm() {
        let calm = CityParams::default();
        let storm = CityParams {
            storm_enabled: true,
            ..calm
        };
        assert_eq!(solar_shape(0, &calm), 0.0);
        assert!((solar_shape(12, &calm) - 1.0).abs() < 1e-12);
        assert!((solar_shape(12, &storm) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn jitter_known_value() {
        // FNV-1a("downtown:0") = 0x01ff4af7
        let expected = f64::from(0x01ff_4af7_u32) / f64::from(u32::MAX);
        let j = jitter(DistrictId::Downtown, 0);
        assert_eq!(j, expected);
        assert_ne!(j, jitter(DistrictId::Downtown, 1));
    }

    #[test]
    fn round_to_digits() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.04, 1), -0.0);
        assert_eq!(round_to(12.0, 0), 12.0);
    }
}
