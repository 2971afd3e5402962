//! Slope effect multipliers
//!
//! Regressions of armor resistance against obliquity for each projectile
//! family, as a function of the plate's thickness/diameter ratio.

use crate::foundation::math::{utils, FP_ERROR};

use super::AmmoType;

/// Euler's number as used by the regressions
const E: f32 = 2.71828;

/// Constant added to the AP and APC family regressions
const SLOPE_ADDFIX: f32 = 0.06;

/// Weight of the shell diameter correction
const SLOPE_DIAFIX_MULTIPLIER: f32 = 0.7;

fn quadratic(a: f32, b: f32, c: f32, x: f32) -> f32 {
    a * x * x + b * x + c
}

/// Uncapped family: AP, APBC, API, HE
fn uncapped(angle: f32) -> (f32, f32) {
    if angle <= 40.0 + FP_ERROR {
        (
            0.95 * E.powf(0.000_053_9 * angle.powf(2.5)),
            0.044_33 * E.powf(0.048_67 * angle),
        )
    } else if angle <= 55.0 + FP_ERROR {
        (0.047_54 * angle.powf(0.953), 0.020_471_64 * angle.powf(0.464_71))
    } else if angle <= 65.0 + FP_ERROR {
        (0.000_167_5 * angle.powf(2.3655), 0.020_471_64 * angle.powf(0.464_71))
    } else {
        (
            quadratic(0.067_087, -8.669_801, 286.520_25, angle),
            quadratic(0.000_222_571_4, -0.015_215, 0.970_922, angle),
        )
    }
}

/// Capped family: APC, APCBC, HESH
fn capped(angle: f32) -> (f32, f32) {
    if angle <= 55.0 + FP_ERROR {
        (
            E.powf(0.000_040_8 * angle.powf(2.5)),
            0.0101 * E.powf(0.1313 * angle.powf(0.8)),
        )
    } else if angle <= 60.0 + FP_ERROR {
        (-3.434 + 0.108_56 * angle, 0.2174 + 0.000_46 * angle)
    } else if angle <= 70.0 + FP_ERROR {
        (0.000_005_18 * angle.powf(3.25), 0.000_021_23 * angle.powf(2.295))
    } else if angle <= 85.0 + FP_ERROR {
        (0.0678 * 1.0634_f32.powf(angle), 0.1017 * 1.0178_f32.powf(angle))
    } else {
        (
            quadratic(0.017_201, -2.147_96, 71.020_794, angle),
            quadratic(0.000_153_428_6, -0.016_924, 0.785_494, angle),
        )
    }
}

/// Slope effect multiplier for a plate struck at `angle` degrees.
///
/// With `diameter_fix`, the AP and APC families get a calibre-dependent
/// correction. Plates thicker than half a calibre never resist less than
/// their nominal thickness.
pub fn slope_effect(ammo: AmmoType, diameter_mm: f32, td_ratio: f32, angle: f32, diameter_fix: bool) -> f32 {
    let family = match ammo {
        AmmoType::Ap | AmmoType::Apbc | AmmoType::Api | AmmoType::He => Some(uncapped(angle)),
        AmmoType::Apc | AmmoType::Apcbc | AmmoType::Hesh => Some(capped(angle)),
        AmmoType::Apcr | AmmoType::Heat | AmmoType::Smoke => None,
    };

    let mut multiplier = match (family, ammo) {
        (Some((f, g)), _) => {
            let mut m = f * td_ratio.powf(g) + SLOPE_ADDFIX;
            if diameter_fix {
                let d = diameter_mm;
                let correction = -0.000_000_894_825_8 * d * d * d + 0.000_268_420_3 * d * d - 0.027_234 * d + 0.933_153;
                m += ((m - 1.0) * SLOPE_DIAFIX_MULTIPLIER * correction).abs();
            }
            m
        }
        (None, AmmoType::Apcr) => {
            if angle <= 25.0 + FP_ERROR {
                E.powf(0.000_172_7 * angle.powf(2.2))
            } else {
                0.7277 * E.powf(0.003_787 * angle.powf(1.5))
            }
        }
        (None, AmmoType::Heat) => 1.0 / utils::deg_to_rad(angle).cos(),
        (None, _) => 1.0,
    };

    if multiplier < 1.0 && td_ratio > 0.5 + FP_ERROR {
        multiplier = 1.0;
    }
    multiplier
}
