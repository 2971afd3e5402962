//! Penetration probability against the penetration/resistance ratio

use rand::Rng;

use crate::foundation::math::FP_ERROR;

/// Probability that a round penetrates, given its P/R ratio.
///
/// Piecewise fit through 0 at 0.88, 0.5 at 1.0 and 1 at 1.12.
pub fn penetration_probability(pr: f32) -> f32 {
    if pr <= 0.88 + FP_ERROR {
        0.0
    } else if pr < 0.92 - FP_ERROR {
        (40.0 * pr - 35.0) / 100.0
    } else if pr < 1.0 - FP_ERROR {
        (6082.251_082 * pr * pr - 11_077.922_078 * pr + 5045.792_208) / 100.0
    } else if pr <= 1.0 + FP_ERROR {
        0.5
    } else if pr < 1.09 - FP_ERROR {
        (-5946.969_697 * pr * pr + 12_971.590_909 * pr - 6974.666_667) / 100.0
    } else if pr < 1.12 - FP_ERROR {
        (40.0 * pr + 55.0) / 100.0
    } else {
        1.0
    }
}

/// Bernoulli trial: certain at 1 or above, impossible at 0 or below
pub fn roll<R: Rng + ?Sized>(chance: f32, rng: &mut R) -> bool {
    chance >= 1.0 || (chance > 0.0 && rng.gen::<f32>() <= chance)
}
