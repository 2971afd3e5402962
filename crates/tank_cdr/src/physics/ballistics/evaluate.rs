//! Penetration evaluation for a single impact

use bitflags::bitflags;
use rand::Rng;

use crate::assets::AttributeSource;
use crate::config::{CdrConfig, PenetrationSystem};
use crate::foundation::math::FP_ERROR;
use crate::world::ProjectileState;

use super::armor::{ArmorLayout, ArmorSlab, ArmorType};
use super::penlog::{PenetrationLog, PenetrationRecord};
use super::probability::{penetration_probability, roll};
use super::slope::slope_effect;
use super::{number_attribute, required_number, AmmoModifiers, AmmoType, BallisticsError};

bitflags! {
    /// Outcome of an impact
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResponseModifiers: u32 {
        /// Complete penetration
        const FULL_PEN = 0x1;
        /// Partial penetration
        const PARTIAL_PEN = 0x2;
        /// Either penetration
        const PENETRATION = 0x3;
        /// Major spalling behind the plate
        const MAJOR_SPALLING = 0x4;
        /// Minor spalling behind the plate
        const MINOR_SPALLING = 0x8;
        /// Either spalling
        const SPALLING = 0xC;
        /// Any penetration or spalling
        const PEN_OR_SPALL = 0xF;
        /// Defeated by the armor
        const NO_PENETRATION = 0x10;
        /// Deflected
        const RICOCHET = 0x80;
        /// Detonates at the impact point
        const EXPLODE = 0x100;
        /// Broke up on the armor
        const SHATTER = 0x200;
        /// Vanishes into scenery
        const DISAPPEAR = 0x400;
        /// Burster or incendiary device armed
        const ARM_DEVICE = 0x2000;
    }
}

/// Numbers behind an impact outcome
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionResponseResult {
    /// Outcome flags
    pub modifiers: ResponseModifiers,
    /// Impact angle, degrees
    pub impact_angle: f32,
    /// Striking velocity, m/s
    pub impact_velocity: f32,
    /// Striking kinetic energy
    pub impact_ke: f32,
    /// Armor thickness over shell diameter
    pub td_ratio: f32,
    /// Slope effect multiplier
    pub slope_effect: f32,
    /// Non-slope multipliers (layering, casting)
    pub multipliers: f32,
    /// Effective armor resistance, mm
    pub resistance: f32,
    /// Shell penetration at the striking distance, mm
    pub penetration: f32,
    /// Penetration over resistance
    pub pr_ratio: f32,
    /// Penetration probability
    pub probability: f32,
    /// Velocity after penetrating or glancing off
    pub result_velocity: f32,
    /// Kinetic energy after penetrating or glancing off
    pub result_ke: f32,
    /// Extra flight distance charged to a ricochet
    pub distance_offset: f32,
}

/// How rounds without a worked-out model (HESH and API) resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderPolicy {
    /// Never penetrate; detonate on the surface
    #[default]
    DetonateOnSurface,
    /// Roll them like any other round
    Evaluate,
}

/// Everything known about an impact before the armor is consulted
#[derive(Debug, Clone, Copy)]
pub struct ImpactContext<'a> {
    /// Struck model
    pub target_model: &'a str,
    /// Projectile model
    pub projectile_model: &'a str,
    /// Projectile state at impact
    pub projectile: &'a ProjectileState,
    /// Struck mesh name
    pub slab: &'a str,
    /// Impact angle, degrees
    pub impact_angle: f32,
    /// Simulation time, seconds
    pub sim_time: f64,
}

/// Penetration and velocity decay data for a round against an armor type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenetrationCurve {
    /// Penetration at point blank, mm
    pub pen_at_pb: f32,
    /// Per-metre decay factor
    pub curve: f32,
    /// Muzzle velocity, m/s
    pub muzzle_velocity: f32,
    /// Projectile weight, kg
    pub weight: f32,
}

impl PenetrationCurve {
    /// Read the curve for `model` against `armor`.
    ///
    /// FHS data falls back to the RHA figures, scaled for the round's nose.
    pub fn lookup<A: AttributeSource + ?Sized>(
        attributes: &A,
        model: &str,
        ammo: AmmoType,
        armor: ArmorType,
    ) -> Result<Self, BallisticsError> {
        let rha_curve = number_attribute(attributes, model, "PEN_RHA_CURVE")?;
        let (pen_at_pb, curve) = match armor {
            ArmorType::Rha | ArmorType::Cast => (required_number(attributes, model, "PEN_RHA_AT_PB")?, rha_curve),
            ArmorType::Fhs => {
                let pen_at_pb = match number_attribute(attributes, model, "PEN_FHS_AT_PB")? {
                    Some(pen) => pen,
                    None => {
                        let rha = required_number(attributes, model, "PEN_RHA_AT_PB")?;
                        match ammo {
                            AmmoType::Apc | AmmoType::Apcbc => rha * 1.05,
                            AmmoType::Ap | AmmoType::Apcr | AmmoType::Api => rha * 0.87,
                            _ => rha,
                        }
                    }
                };
                (pen_at_pb, number_attribute(attributes, model, "PEN_FHS_CURVE")?.or(rha_curve))
            }
        };
        let curve = curve.ok_or_else(|| BallisticsError::MissingPenetrationCurve(model.to_string()))?;

        Ok(Self {
            pen_at_pb,
            curve,
            muzzle_velocity: required_number(attributes, model, "VELOCITY")?,
            weight: required_number(attributes, model, "WEIGHT")?,
        })
    }
}

/// Cast armor deficiency relative to RHA, never above 1
fn cast_deficiency(thickness: f32, diameter: f32) -> f32 {
    (0.8063 + thickness * 0.001_238 - diameter * 0.000_262_8 + (thickness / diameter) * 0.027_06).min(1.0)
}

/// Penetration model with its optional log file
#[derive(Debug)]
pub struct PenetrationModel {
    system: PenetrationSystem,
    diameter_fix: bool,
    placeholder: PlaceholderPolicy,
    log_path: String,
    log_enabled: bool,
    log: Option<PenetrationLog>,
}

impl PenetrationModel {
    /// Create a model; the log file is truncated when logging is enabled
    pub fn new(config: &CdrConfig) -> Self {
        let mut model = Self {
            system: config.penetration_system,
            diameter_fix: config.diameter_fix,
            placeholder: PlaceholderPolicy::default(),
            log_path: config.pen_log_path.clone(),
            log_enabled: false,
            log: None,
        };
        model.set_log_enabled(config.pen_log_enabled);
        model
    }

    /// Builder-style placeholder policy override
    pub fn with_placeholder_policy(mut self, policy: PlaceholderPolicy) -> Self {
        self.placeholder = policy;
        self
    }

    /// Turn the penetration log on or off; the file is created on first use
    pub fn set_log_enabled(&mut self, enabled: bool) {
        if enabled && self.log.is_none() {
            match PenetrationLog::create(&self.log_path) {
                Ok(log) => self.log = Some(log),
                Err(err) => {
                    log::warn!("Unable to create penetration log '{}': {}", self.log_path, err);
                    self.log_enabled = false;
                    return;
                }
            }
        }
        self.log_enabled = enabled;
    }

    /// Whether impacts are being logged
    pub fn log_enabled(&self) -> bool {
        self.log_enabled
    }

    /// Penetration probability for a P/R ratio under the configured system
    pub fn probability<R: Rng + ?Sized>(&self, pr: f32, rng: &mut R) -> f32 {
        match self.system {
            PenetrationSystem::Us => penetration_probability(pr),
            PenetrationSystem::Ru => rng.gen::<f32>(),
        }
    }

    /// Evaluate an impact against the struck slab
    pub fn evaluate<A, R>(
        &self,
        attributes: &A,
        rng: &mut R,
        impact: &ImpactContext<'_>,
    ) -> Result<CollisionResponseResult, BallisticsError>
    where
        A: AttributeSource + ?Sized,
        R: Rng + ?Sized,
    {
        let projectile = impact.projectile;
        let ammo = projectile.ammo;
        let slab = ArmorSlab::lookup(attributes, impact.target_model, impact.slab)?;
        let curve = PenetrationCurve::lookup(attributes, impact.projectile_model, ammo, slab.kind)?;
        let diameter = projectile.diameter * 10.0;
        let distance = projectile.travel_distance + projectile.distance_offset;

        let decay = curve.curve.powf(distance);
        let velocity = curve.muzzle_velocity * decay;
        let mut result = CollisionResponseResult {
            impact_angle: impact.impact_angle,
            impact_velocity: velocity,
            impact_ke: 0.5 * curve.weight * velocity * velocity,
            penetration: curve.pen_at_pb * decay,
            slope_effect: 1.0,
            multipliers: 1.0,
            ..Default::default()
        };

        let first_plate = self.resistance(&mut result, slab, ammo, diameter);
        result.pr_ratio = result.penetration / result.resistance;

        self.outcome(&mut result, rng, impact, &curve, first_plate, distance);

        log::trace!(
            "{} vs {}:{} at {:.1} deg: pen {:.1} res {:.1} -> {:?}",
            impact.projectile_model,
            impact.target_model,
            impact.slab,
            impact.impact_angle,
            result.penetration,
            result.resistance,
            result.modifiers
        );

        if let Some(log) = self.log.as_ref().filter(|_| self.log_enabled) {
            if diameter >= 15.0 || result.modifiers.intersects(ResponseModifiers::PEN_OR_SPALL) {
                log.append(&PenetrationRecord {
                    sim_time: impact.sim_time,
                    target_model: impact.target_model,
                    projectile_model: impact.projectile_model,
                    slab: impact.slab,
                    armor_thickness: slab.layout.total(),
                    shell_diameter: diameter,
                    travel_distance: projectile.travel_distance,
                    ammo,
                    result: &result,
                });
            }
        }

        Ok(result)
    }

    /// Fill in resistance, t/d and slope effect. Returns the sloped first
    /// plate for spaced armor.
    fn resistance(
        &self,
        result: &mut CollisionResponseResult,
        slab: ArmorSlab,
        ammo: AmmoType,
        diameter: f32,
    ) -> Option<f32> {
        let angle = result.impact_angle;
        let slope = |td: f32| slope_effect(ammo, diameter, td, angle, self.diameter_fix);

        if let ArmorLayout::Spaced { first, second } = slab.layout {
            let first = first * result.multipliers;
            if slab.kind == ArmorType::Cast {
                result.multipliers *= cast_deficiency(second * result.multipliers, diameter);
            }
            let second = second * result.multipliers;
            result.td_ratio = (first + second) / diameter;

            let first = first * slope(first / diameter);
            let second = second * slope(second / diameter);

            let a: f32 = match (slab.kind, ammo) {
                (ArmorType::Fhs, _) => 1.1,
                (ArmorType::Rha | ArmorType::Cast, AmmoType::Apc | AmmoType::Apcbc) => 1.0,
                _ => 1.05,
            };
            result.resistance = ((1.15 * first).powf(1.4) + a.powf(1.4) * second.powf(1.4)).powf(1.0 / 1.4);
            result.slope_effect = result.resistance / (result.td_ratio * diameter);
            return Some(first);
        }

        let total = slab.layout.total();
        if let ArmorLayout::Layered { first, second } = slab.layout {
            match slab.kind {
                ArmorType::Rha | ArmorType::Cast => {
                    let a = 0.5 * (first + second + (first.powf(1.4) + second.powf(1.4)).powf(1.0 / 1.4)) / total;
                    let b = (0.3129 * (first / second).powf(0.025_27) * first.max(second).powf(0.2439)).clamp(0.3, 0.96);
                    result.multipliers *= (a + b + 0.5 * (0.7 * first + second) / total) / 2.5;
                }
                ArmorType::Fhs => result.multipliers *= 1.118_951_6,
            }
        }

        if slab.kind == ArmorType::Cast {
            result.multipliers *= cast_deficiency(total * result.multipliers, diameter);
        }
        let base = total * result.multipliers;
        result.td_ratio = base / diameter;
        result.slope_effect = slope(result.td_ratio);
        result.resistance = base * result.slope_effect;
        None
    }

    fn outcome<R: Rng + ?Sized>(
        &self,
        result: &mut CollisionResponseResult,
        rng: &mut R,
        impact: &ImpactContext<'_>,
        curve: &PenetrationCurve,
        first_plate: Option<f32>,
        distance: f32,
    ) {
        let ammo = impact.projectile.ammo;
        let placeholder = matches!(ammo, AmmoType::Hesh | AmmoType::Api)
            && self.placeholder == PlaceholderPolicy::DetonateOnSurface;

        if first_plate.is_some() && matches!(ammo, AmmoType::Heat | AmmoType::Hesh) {
            result.modifiers |= ResponseModifiers::NO_PENETRATION | ResponseModifiers::EXPLODE;
            return;
        }
        if ammo == AmmoType::Heat {
            result.modifiers |= if result.penetration >= result.resistance - FP_ERROR {
                ResponseModifiers::FULL_PEN
            } else {
                ResponseModifiers::NO_PENETRATION
            };
            result.modifiers |= ResponseModifiers::EXPLODE;
            return;
        }
        if placeholder {
            result.modifiers |= ResponseModifiers::NO_PENETRATION | ResponseModifiers::EXPLODE;
            return;
        }

        result.probability = self.probability(result.pr_ratio, rng);
        let spalls = ammo.is_spalling();

        let shatter_gap = ammo == AmmoType::Ap
            && !impact.projectile_model.starts_with("DE")
            && result.impact_velocity >= 850.0 - FP_ERROR
            && result.td_ratio >= 0.8 - FP_ERROR
            && result.pr_ratio >= 1.05 - FP_ERROR
            && result.pr_ratio <= 1.25 + FP_ERROR;

        if shatter_gap && roll(0.75, rng) {
            result.modifiers |= ResponseModifiers::NO_PENETRATION | ResponseModifiers::SHATTER;
        } else if roll(result.probability, rng) {
            let partial = roll(-2.5 * result.pr_ratio + 2.75, rng);
            result.modifiers |= match (partial, spalls) {
                (true, true) => ResponseModifiers::MINOR_SPALLING,
                (true, false) => ResponseModifiers::PARTIAL_PEN,
                (false, true) => ResponseModifiers::MAJOR_SPALLING,
                (false, false) => ResponseModifiers::FULL_PEN,
            };
            if ammo.is_explosive() {
                result.modifiers |= ResponseModifiers::EXPLODE;
            }

            let burster = impact.projectile.modifiers.contains(AmmoModifiers::HE_BURSTER)
                && result.resistance >= 7.0 - FP_ERROR;
            let incendiary = ammo == AmmoType::Api && result.resistance >= 5.0 - FP_ERROR;
            if burster || incendiary {
                result.modifiers |= ResponseModifiers::ARM_DEVICE;
            }

            if !spalls {
                let mut retained = 1.0 - (result.resistance * 0.88) / result.penetration;
                if partial {
                    retained *= 0.5;
                }
                let retained = retained.clamp(0.000_102, 0.999_898);
                result.result_ke = retained * result.impact_ke;
                result.result_velocity = (2.0 * result.result_ke / curve.weight).sqrt();
            }
        } else {
            result.modifiers |= ResponseModifiers::NO_PENETRATION;

            if matches!(ammo, AmmoType::He | AmmoType::Heat | AmmoType::Hesh | AmmoType::Api) {
                result.modifiers |= ResponseModifiers::EXPLODE;
            } else if first_plate.is_some_and(|first| roll(self.probability(result.penetration / first, rng), rng)) {
                result.modifiers |= ResponseModifiers::SHATTER;
            } else {
                result.modifiers |= ResponseModifiers::RICOCHET;
                Self::glance(result, curve, distance);
            }
        }
    }

    /// Charge a ricochet's energy loss as extra flight distance
    fn glance(result: &mut CollisionResponseResult, curve: &PenetrationCurve, distance: f32) {
        if curve.curve >= 1.0 - FP_ERROR || curve.curve <= FP_ERROR || curve.pen_at_pb <= FP_ERROR {
            return;
        }
        if result.impact_angle <= FP_ERROR {
            result.distance_offset = 123_456_789.0;
            result.result_velocity = FP_ERROR;
            return;
        }
        result.distance_offset =
            ((result.impact_angle / 90.0) * result.penetration / curve.pen_at_pb).ln() / curve.curve.ln() - distance;
        result.result_velocity = curve.muzzle_velocity * curve.curve.powf(distance + result.distance_offset);
        result.result_ke = 0.5 * curve.weight * result.result_velocity * result.result_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelDatabase;
    use crate::fixtures;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TARGET: &str = "Target";

    fn model() -> PenetrationModel {
        PenetrationModel::new(&CdrConfig::default().with_pen_log(false))
    }

    fn database(thickness: &str, kind: &str) -> ModelDatabase {
        let mut db = fixtures::database();
        db.insert(TARGET, "ARTHCK_PLATE", thickness);
        db.insert(TARGET, "ARTYPE_PLATE", kind);
        db
    }

    fn evaluate_with(
        model: &PenetrationModel,
        db: &ModelDatabase,
        projectile: &ProjectileState,
        angle: f32,
        seed: u64,
    ) -> Result<CollisionResponseResult, BallisticsError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let impact = ImpactContext {
            target_model: TARGET,
            projectile_model: fixtures::SHELL,
            projectile,
            slab: "PLATE",
            impact_angle: angle,
            sim_time: 1.0,
        };
        model.evaluate(db, &mut rng, &impact)
    }

    #[test]
    fn test_point_blank_full_penetration() {
        let db = database("80", "RHA");
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
        let result = evaluate_with(&model(), &db, &shell, 0.0, 1).unwrap();

        assert_relative_eq!(result.penetration, 120.0);
        assert_relative_eq!(result.td_ratio, 80.0 / 75.0, epsilon = 1e-5);
        assert!(result.pr_ratio > 1.12);
        assert_relative_eq!(result.probability, 1.0);
        assert_eq!(result.modifiers, ResponseModifiers::FULL_PEN);

        let retained = 1.0 - 0.88 * result.resistance / result.penetration;
        assert_relative_eq!(result.result_ke, retained * result.impact_ke, max_relative = 1e-4);
        assert_relative_eq!(result.result_velocity, 750.0 * retained.sqrt(), max_relative = 1e-4);
    }

    #[test]
    fn test_penetration_decays_with_distance() {
        let db = database("80", "RHA");
        let mut previous = f32::MAX;
        for distance in [0.0, 250.0, 500.0, 1000.0] {
            let mut shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
            shell.travel_distance = distance;
            let result = evaluate_with(&model(), &db, &shell, 20.0, 3).unwrap();
            assert!(result.penetration < previous);
            assert_relative_eq!(result.penetration, 120.0 * 0.9995_f32.powf(distance), max_relative = 1e-4);
            previous = result.penetration;
        }
    }

    #[test]
    fn test_ricochet_charges_distance() {
        let db = database("200", "RHA");
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
        let result = evaluate_with(&model(), &db, &shell, 30.0, 5).unwrap();

        assert_eq!(result.modifiers, ResponseModifiers::NO_PENETRATION | ResponseModifiers::RICOCHET);
        assert_relative_eq!(result.distance_offset, (1.0_f32 / 3.0).ln() / 0.9995_f32.ln(), max_relative = 1e-3);
        assert_relative_eq!(result.result_velocity, 250.0, max_relative = 1e-3);

        let head_on = evaluate_with(&model(), &db, &shell, 0.0, 5).unwrap();
        assert!(head_on.modifiers.contains(ResponseModifiers::RICOCHET));
        assert_relative_eq!(head_on.distance_offset, 123_456_789.0);
        assert_relative_eq!(head_on.result_velocity, FP_ERROR);
    }

    #[test]
    fn test_heat_and_hesh_rules() {
        let heat = ProjectileState::new(AmmoType::Heat, 7.5, 450.0);
        let hesh = ProjectileState::new(AmmoType::Hesh, 7.5, 450.0);

        let plate = database("100", "RHA");
        let result = evaluate_with(&model(), &plate, &heat, 0.0, 1).unwrap();
        assert_eq!(result.modifiers, ResponseModifiers::FULL_PEN | ResponseModifiers::EXPLODE);
        let result = evaluate_with(&model(), &plate, &heat, 60.0, 1).unwrap();
        assert_eq!(result.modifiers, ResponseModifiers::NO_PENETRATION | ResponseModifiers::EXPLODE);

        let spaced = database("10++20", "RHA");
        for shell in [&heat, &hesh] {
            let result = evaluate_with(&model(), &spaced, shell, 0.0, 1).unwrap();
            assert_eq!(result.modifiers, ResponseModifiers::NO_PENETRATION | ResponseModifiers::EXPLODE);
        }

        let thin = database("10", "RHA");
        let result = evaluate_with(&model(), &thin, &hesh, 0.0, 1).unwrap();
        assert_eq!(result.modifiers, ResponseModifiers::NO_PENETRATION | ResponseModifiers::EXPLODE);

        let evaluating = model().with_placeholder_policy(PlaceholderPolicy::Evaluate);
        let result = evaluate_with(&evaluating, &thin, &hesh, 0.0, 1).unwrap();
        assert_eq!(result.modifiers, ResponseModifiers::MAJOR_SPALLING | ResponseModifiers::EXPLODE);
    }

    #[test]
    fn test_armor_multipliers() {
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);

        let cast = evaluate_with(&model(), &database("100", "CAST"), &shell, 0.0, 1).unwrap();
        assert_relative_eq!(cast.multipliers, cast_deficiency(100.0, 75.0), epsilon = 1e-5);
        assert!(cast.multipliers < 1.0);

        let layered = evaluate_with(&model(), &database("30+30", "FHS"), &shell, 0.0, 1).unwrap();
        assert_relative_eq!(layered.multipliers, 1.118_951_6, epsilon = 1e-5);
        assert_relative_eq!(layered.td_ratio, 60.0 * 1.118_951_6 / 75.0, epsilon = 1e-4);

        let rha_layered = evaluate_with(&model(), &database("30+30", "RHA"), &shell, 0.0, 1).unwrap();
        assert!(rha_layered.multipliers < 1.0);

        let spaced = evaluate_with(&model(), &database("30++20", "RHA"), &shell, 0.0, 1).unwrap();
        assert_relative_eq!(spaced.td_ratio, 50.0 / 75.0, epsilon = 1e-5);
        assert_relative_eq!(spaced.slope_effect, spaced.resistance / 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_fhs_falls_back_to_rha_data() {
        let db = database("50", "FHS");
        let ap = ProjectileState::new(AmmoType::Ap, 7.5, 750.0);
        let apc = ProjectileState::new(AmmoType::Apc, 7.5, 750.0);
        let apbc = ProjectileState::new(AmmoType::Apbc, 7.5, 750.0);
        assert_relative_eq!(evaluate_with(&model(), &db, &ap, 0.0, 1).unwrap().penetration, 120.0 * 0.87);
        assert_relative_eq!(evaluate_with(&model(), &db, &apc, 0.0, 1).unwrap().penetration, 120.0 * 1.05);
        assert_relative_eq!(evaluate_with(&model(), &db, &apbc, 0.0, 1).unwrap().penetration, 120.0);
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let shell = ProjectileState::new(AmmoType::Ap, 7.5, 750.0);
        assert!(matches!(
            evaluate_with(&model(), &database("50", "ERA"), &shell, 0.0, 1),
            Err(BallisticsError::InvalidArmorType { .. })
        ));

        let mut db = database("50", "RHA");
        db.models.get_mut(fixtures::SHELL).unwrap().remove("PEN_RHA_CURVE");
        assert_eq!(
            evaluate_with(&model(), &db, &shell, 0.0, 1),
            Err(BallisticsError::MissingPenetrationCurve(fixtures::SHELL.to_string()))
        );

        let mut db = database("50", "RHA");
        db.models.get_mut(fixtures::SHELL).unwrap().remove("WEIGHT");
        assert!(matches!(
            evaluate_with(&model(), &db, &shell, 0.0, 1),
            Err(BallisticsError::MissingAttribute { key, .. }) if key == "WEIGHT"
        ));
    }

    #[test]
    fn test_shatter_gap() {
        let mut db = database("102", "RHA");
        db.insert(fixtures::SHELL, "VELOCITY", "900");
        let shell = ProjectileState::new(AmmoType::Ap, 7.5, 900.0);
        let model = model();

        let mut rng = StdRng::seed_from_u64(42);
        let mut shattered = 0;
        for _ in 0..200 {
            let impact = ImpactContext {
                target_model: TARGET,
                projectile_model: fixtures::SHELL,
                projectile: &shell,
                slab: "PLATE",
                impact_angle: 0.0,
                sim_time: 0.0,
            };
            let result = model.evaluate(&db, &mut rng, &impact).unwrap();
            assert!((1.05..=1.25).contains(&result.pr_ratio), "pr {}", result.pr_ratio);
            if result.modifiers.contains(ResponseModifiers::SHATTER) {
                assert!(result.modifiers.contains(ResponseModifiers::NO_PENETRATION));
                shattered += 1;
            }
        }
        assert!((120..180).contains(&shattered), "{shattered} shattered");
    }

    #[test]
    fn test_seeded_evaluation_is_repeatable() {
        let db = database("115", "RHA");
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
        for seed in 0..20 {
            let a = evaluate_with(&model(), &db, &shell, 10.0, seed).unwrap();
            let b = evaluate_with(&model(), &db, &shell, 10.0, seed).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_ru_system_draws_uniform_probability() {
        let config = CdrConfig::default()
            .with_pen_log(false)
            .with_penetration_system(PenetrationSystem::Ru);
        let model = PenetrationModel::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        let draws: Vec<f32> = (0..50).map(|_| model.probability(1.0, &mut rng)).collect();
        assert!(draws.iter().all(|p| (0.0..1.0).contains(p)));
        assert!(draws.iter().any(|p| (*p - 0.5).abs() > 0.05));
    }

    #[test]
    fn test_spaced_shatter_follows_penetration_system() {
        let db = database("200++20", "RHA");
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
        let ru = PenetrationModel::new(
            &CdrConfig::default()
                .with_pen_log(false)
                .with_penetration_system(PenetrationSystem::Ru),
        );

        let count_shatters = |model: &PenetrationModel| {
            let mut rng = StdRng::seed_from_u64(17);
            (0..200)
                .filter(|_| {
                    let impact = ImpactContext {
                        target_model: TARGET,
                        projectile_model: fixtures::SHELL,
                        projectile: &shell,
                        slab: "PLATE",
                        impact_angle: 0.0,
                        sim_time: 0.0,
                    };
                    let result = model.evaluate(&db, &mut rng, &impact).unwrap();
                    result.modifiers.contains(ResponseModifiers::SHATTER)
                })
                .count()
        };

        // the first plate alone stops the round under the US curve
        assert_eq!(count_shatters(&model()), 0);
        assert!(count_shatters(&ru) > 0);
    }

    #[test]
    fn test_evaluations_are_logged() {
        let path = std::env::temp_dir().join(format!("tank_cdr_eval_{}.log", std::process::id()));
        let config = CdrConfig::default().with_pen_log_path(path.to_string_lossy());
        let mut model = PenetrationModel::new(&config);
        assert!(model.log_enabled());

        let db = database("80", "RHA");
        let shell = ProjectileState::new(AmmoType::Apcbc, 7.5, 750.0);
        evaluate_with(&model, &db, &shell, 0.0, 1).unwrap();

        // small-calibre bounce is not logged
        let mg = ProjectileState::new(AmmoType::Ap, 0.79, 750.0);
        evaluate_with(&model, &database("200", "RHA"), &mg, 30.0, 1).unwrap();

        model.set_log_enabled(false);
        evaluate_with(&model, &db, &shell, 0.0, 1).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Collision at").count(), 1);
        assert!(text.contains("  Impact Slab............: PLATE"));
        assert!(text.contains("Yes (Full Penetration)"));
        std::fs::remove_file(&path).ok();
    }
}
