//! Turning a due hit into consequences
//!
//! The dispatcher never touches the simulation: everything it decides
//! comes back as a [`ResponseIntent`] for the owner of the objects to apply.

use rand::Rng;

use crate::assets::AttributeSource;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{angle_between, constants, utils, Mat4Ext, Pose, Vec3};
use crate::physics::attachment::{attachment_to_world, Attachment};
use crate::physics::ballistics::{
    CollisionResponseResult, ImpactContext, PenetrationModel, ResponseModifiers,
};
use crate::physics::collision::{DetectionModifiers, MeshLibrary};
use crate::physics::heuristic;
use crate::physics::scheduler::{anticipate, AnticipatedCollision, DeferredSink};
use crate::world::{ObjectKind, SimObject};

/// Shells at or above this diameter (cm) get full-size effects
const LARGE_CALIBRE: f32 = 1.5;

/// Ricochets shallower than this never chain
const CHAIN_MIN_ANGLE_DEG: f32 = 15.0;

/// What the projectile should do next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileCommand {
    /// Continue from the impact point along the reflection
    Ricochet {
        /// World impact point
        position: Vec3,
        /// World reflection direction
        direction: Vec3,
        /// Velocity after the glance
        velocity: f32,
        /// Distance to add to the projectile's flight for energy loss
        distance_offset: f32,
        /// Seconds the projectile has already flown past the impact
        overshoot: f32,
    },
    /// Remove the projectile at the impact point
    Kill {
        /// World impact point
        position: Vec3,
    },
}

/// Visual effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Thrown-up dirt
    Dirt,
    /// Brown smoke puff
    BrownSmoke,
    /// Building debris
    Debris,
    /// White smoke puff
    WhiteSmoke,
    /// Small-arms ground puff
    MgGroundSmoke,
    /// Explosion
    Explosion,
    /// Shrapnel spray
    Shrapnel,
}

/// A visual effect to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectRequest {
    /// Kind of effect
    pub kind: EffectKind,
    /// World position
    pub position: Vec3,
    /// Spray direction, when directional
    pub direction: Option<Vec3>,
    /// Size or particle count
    pub amount: f32,
    /// Velocity inherited from the struck object
    pub velocity: Vec3,
}

/// Sound kinds; variants carry the sample index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// Explosion
    Explosion,
    /// Penetration, variant 0 or 1
    Penetrate(u8),
    /// Dull impact
    ShellThud,
    /// Shell ricochet, variant 0 to 2
    ShellRicochet(u8),
    /// Small-arms ricochet, variant 0 to 2
    MgRicochet(u8),
}

/// Mixing priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SoundPriority {
    /// Droppable
    Mid,
    /// Always audible
    High,
}

/// What a sound's volume scales with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundScale {
    /// Fixed volume
    None,
    /// Shell diameter, cm
    Calibre(f32),
    /// Explosive charge
    Explosive(f32),
}

/// A one-shot sound to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    /// Sample
    pub kind: SoundKind,
    /// Priority
    pub priority: SoundPriority,
    /// World position
    pub position: Vec3,
    /// Distance rolloff factor
    pub rolloff: f32,
    /// Volume scaling
    pub scale: SoundScale,
}

/// Request to rebuild a projectile's collision test list after it bounced
/// clear of its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestListRebuild {
    /// Search cone half-angle, degrees
    pub angle: f32,
    /// Search range
    pub range: f32,
    /// Object to leave out
    pub exclude: ObjectId,
}

/// Everything that follows from one resolved hit
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseIntent {
    /// Projectile
    pub striker: ObjectId,
    /// Struck object
    pub target: ObjectId,
    /// Struck mesh
    pub slab: String,
    /// Ballistic outcome
    pub response: CollisionResponseResult,
    /// Projectile follow-up
    pub projectile: ProjectileCommand,
    /// Arm the projectile's burster or incendiary
    pub arm_device: bool,
    /// Motor life to remove
    pub motor_damage: Option<f32>,
    /// Health to remove, per crewman index
    pub crew_damage: Vec<(usize, f32)>,
    /// Effects to spawn
    pub effects: Vec<EffectRequest>,
    /// Sounds to play
    pub sounds: Vec<SoundRequest>,
    /// Ricochet hits resolved in the same pass
    pub chained: Vec<ResponseIntent>,
    /// Collision test list to rebuild
    pub rebuild_test_list: Option<TestListRebuild>,
}

/// Resolves due hits for projectile strikers
pub struct ResponseDispatcher<'a, L: ?Sized, A: ?Sized> {
    meshes: &'a L,
    attributes: &'a A,
    model: &'a PenetrationModel,
    velocity_multiplier: f32,
    chain_limit: u32,
    sim_time: f64,
}

impl<'a, L, A> ResponseDispatcher<'a, L, A>
where
    L: MeshLibrary + ?Sized,
    A: AttributeSource + ?Sized,
{
    /// Bundle the data a resolution needs
    pub fn new(
        meshes: &'a L,
        attributes: &'a A,
        model: &'a PenetrationModel,
        velocity_multiplier: f32,
        chain_limit: u32,
        sim_time: f64,
    ) -> Self {
        Self {
            meshes,
            attributes,
            model,
            velocity_multiplier,
            chain_limit,
            sim_time,
        }
    }

    /// Resolve `acn`. Ricochets that strike the target again are resolved
    /// in place when already due and handed to `deferred` otherwise.
    pub fn dispatch<R, S>(
        &self,
        rng: &mut R,
        acn: &AnticipatedCollision,
        striker: &SimObject,
        target: &SimObject,
        deferred: &mut S,
    ) -> Option<ResponseIntent>
    where
        R: Rng + ?Sized,
        S: DeferredSink + ?Sized,
    {
        let Some(projectile) = striker.projectile() else {
            log::debug!("Striker '{}' is not a projectile; no response", striker.model);
            return None;
        };
        let detection = &acn.detection;
        let to_world = attachment_to_world(target, detection.attachment)?;

        let impact_pos = to_world.apply_point(&detection.impact_point);
        let reflect_dir = (to_world.apply_point(&(detection.impact_point + detection.reflection)) - impact_pos)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -striker.pose.forward());
        let impact_dir = striker.pose.forward();
        let diameter = projectile.diameter;

        let mut effects = Vec::new();
        let response = if let ObjectKind::Static = target.kind {
            self.scenery_outcome(projectile.explosive, target, diameter, impact_pos, reflect_dir, &mut effects)
        } else {
            let impact = ImpactContext {
                target_model: &target.model,
                projectile_model: &striker.model,
                projectile,
                slab: &detection.mesh_name,
                impact_angle: utils::rad_to_deg(detection.impact_angle),
                sim_time: self.sim_time,
            };
            match self.model.evaluate(self.attributes, rng, &impact) {
                Ok(response) => response,
                Err(err) => {
                    log::error!("No response for {} hitting {}: {}", striker.model, target.model, err);
                    return None;
                }
            }
        };
        let outcome = response.modifiers;

        let projectile_command = if outcome.contains(ResponseModifiers::RICOCHET) {
            ProjectileCommand::Ricochet {
                position: impact_pos,
                direction: reflect_dir,
                velocity: response.result_velocity,
                distance_offset: response.distance_offset.abs(),
                overshoot: acn.time_to_collision,
            }
        } else {
            ProjectileCommand::Kill { position: impact_pos }
        };

        let mut intent = ResponseIntent {
            striker: striker.id,
            target: target.id,
            slab: detection.mesh_name.clone(),
            projectile: projectile_command,
            arm_device: outcome.contains(ResponseModifiers::ARM_DEVICE),
            motor_damage: None,
            crew_damage: Vec::new(),
            effects,
            sounds: Vec::new(),
            chained: Vec::new(),
            rebuild_test_list: None,
            response,
        };

        Self::apply_damage(&mut intent, target, detection.modifiers, impact_pos, &impact_dir);
        Self::add_effects(&mut intent, rng, projectile.explosive, target, diameter, impact_pos, reflect_dir);

        let chain_eligible = outcome.contains(ResponseModifiers::RICOCHET)
            && (diameter >= LARGE_CALIBRE || projectile.modifiers.has_tracer());
        if chain_eligible {
            let chained = if utils::rad_to_deg(detection.impact_angle) >= CHAIN_MIN_ANGLE_DEG
                && acn.chain_depth < self.chain_limit
            {
                self.chain(rng, acn, striker, target, &mut intent, deferred)
            } else {
                false
            };
            if !chained {
                intent.rebuild_test_list = Some(TestListRebuild {
                    angle: CHAIN_MIN_ANGLE_DEG,
                    range: 20.0,
                    exclude: target.id,
                });
            }
        }

        Some(intent)
    }

    /// Synthetic outcome for scenery, keyed on its `TAG`
    fn scenery_outcome(
        &self,
        explosive: f32,
        target: &SimObject,
        diameter: f32,
        position: Vec3,
        direction: Vec3,
        effects: &mut Vec<EffectRequest>,
    ) -> CollisionResponseResult {
        let mut modifiers = ResponseModifiers::empty();
        if explosive > 0.0 {
            modifiers |= ResponseModifiers::EXPLODE;
        }
        let effect = |kind, direction, amount| EffectRequest {
            kind,
            position,
            direction,
            amount,
            velocity: Vec3::zeros(),
        };

        match self.attributes.query(&target.model, "TAG") {
            Some("VEHC") => modifiers |= ResponseModifiers::FULL_PEN,
            Some("TREE") => {
                modifiers |= ResponseModifiers::DISAPPEAR;
                if diameter >= LARGE_CALIBRE {
                    effects.push(effect(EffectKind::Dirt, Some(direction), 5.0 * diameter));
                    effects.push(effect(EffectKind::BrownSmoke, Some(direction), 2.5 * diameter));
                } else {
                    effects.push(effect(EffectKind::MgGroundSmoke, None, 1.0));
                }
            }
            _ => {
                modifiers |= ResponseModifiers::DISAPPEAR;
                if diameter >= LARGE_CALIBRE {
                    effects.push(effect(EffectKind::Debris, Some(direction), diameter));
                    effects.push(effect(EffectKind::WhiteSmoke, None, 2.5 * diameter));
                } else {
                    effects.push(effect(EffectKind::MgGroundSmoke, None, 1.0));
                }
            }
        }

        CollisionResponseResult {
            modifiers,
            slope_effect: 1.0,
            multipliers: 1.0,
            ..Default::default()
        }
    }

    fn apply_damage(
        intent: &mut ResponseIntent,
        target: &SimObject,
        detected: DetectionModifiers,
        impact_pos: Vec3,
        impact_dir: &Vec3,
    ) {
        let outcome = intent.response.modifiers;
        if !outcome.intersects(ResponseModifiers::PEN_OR_SPALL) {
            return;
        }
        let energy = 2.0 * (2.758_621e-6 * intent.response.result_ke - 0.020_69).max(0.0);
        let to_world = |attachment: Attachment, point: &Vec3| {
            attachment_to_world(target, attachment).map(|m| m.apply_point(point))
        };

        let crew = match &target.kind {
            ObjectKind::Tank(tank) => {
                if let Some(motor) = to_world(Attachment::Hull, &tank.motor_position) {
                    let offset = motor - impact_pos;
                    if detected.contains(DetectionModifiers::EXT_ENGINE)
                        || angle_between(&offset, impact_dir) <= utils::deg_to_rad(10.0)
                    {
                        let reach = 1.034_483e-5 * intent.response.result_ke + 0.172_414;
                        let amount = energy * (offset.magnitude() / reach).clamp(0.0, 1.0);
                        if amount > 0.0 {
                            intent.motor_damage = Some(amount);
                        }
                    }
                }
                &tank.crew
            }
            ObjectKind::AntiTankGun(emplacement) => &emplacement.crew,
            _ => return,
        };

        for (index, crewman) in crew.iter().enumerate() {
            let Some(position) = to_world(crewman.attachment, &crewman.position) else {
                continue;
            };
            let offset = position - impact_pos;
            let amount = energy
                * (-0.514_286 * offset.magnitude() + 1.128_571).max(0.0)
                * (-0.047_746_5 * angle_between(&offset, impact_dir).abs() + 1.0).max(0.0);
            if amount > 0.0 {
                intent.crew_damage.push((index, amount));
            }
        }
    }

    fn add_effects<R: Rng + ?Sized>(
        intent: &mut ResponseIntent,
        rng: &mut R,
        explosive: f32,
        target: &SimObject,
        diameter: f32,
        position: Vec3,
        direction: Vec3,
    ) {
        let outcome = intent.response.modifiers;
        let velocity = target.velocity();
        let sound = |kind, priority, rolloff, scale| SoundRequest {
            kind,
            priority,
            position,
            rolloff,
            scale,
        };

        if outcome.contains(ResponseModifiers::EXPLODE) {
            intent.effects.push(EffectRequest {
                kind: EffectKind::Explosion,
                position,
                direction: Some(direction),
                amount: explosive,
                velocity,
            });
            intent.sounds.push(sound(
                SoundKind::Explosion,
                SoundPriority::High,
                0.01,
                SoundScale::Explosive(explosive),
            ));
        }

        if outcome.contains(ResponseModifiers::DISAPPEAR) {
            intent
                .sounds
                .push(sound(SoundKind::ShellThud, SoundPriority::Mid, 0.05, SoundScale::Calibre(diameter)));
            return;
        }

        let base = -10.0 + 10.0 * diameter;
        if base >= 1.0 {
            let factor = if outcome.contains(ResponseModifiers::FULL_PEN) {
                1.2
            } else if outcome.contains(ResponseModifiers::PARTIAL_PEN) {
                0.9
            } else if outcome.contains(ResponseModifiers::MAJOR_SPALLING) {
                2.0
            } else if outcome.contains(ResponseModifiers::MINOR_SPALLING) {
                1.4
            } else if outcome.contains(ResponseModifiers::NO_PENETRATION) {
                0.5 * (1.0 - utils::deg_to_rad(intent.response.impact_angle) / constants::HALF_PI)
            } else {
                0.0
            };
            let amount = base * factor;
            if amount >= 1.0 {
                intent.effects.push(EffectRequest {
                    kind: EffectKind::Shrapnel,
                    position,
                    direction: Some(direction),
                    amount,
                    velocity,
                });
            }
        }

        if outcome.intersects(ResponseModifiers::PENETRATION) {
            intent.sounds.push(sound(
                SoundKind::Penetrate(rng.gen_range(0..2)),
                SoundPriority::High,
                0.02,
                SoundScale::Calibre(diameter),
            ));
        } else if outcome.intersects(ResponseModifiers::SPALLING) {
            intent
                .sounds
                .push(sound(SoundKind::ShellThud, SoundPriority::High, 0.02, SoundScale::Calibre(diameter)));
        } else if outcome.contains(ResponseModifiers::RICOCHET) {
            let sample = sound(
                if diameter >= LARGE_CALIBRE {
                    SoundKind::ShellRicochet(rng.gen_range(0..3))
                } else {
                    SoundKind::MgRicochet(rng.gen_range(0..3))
                },
                if diameter >= LARGE_CALIBRE { SoundPriority::High } else { SoundPriority::Mid },
                if diameter >= LARGE_CALIBRE { 0.02 } else { 0.10 },
                if diameter >= LARGE_CALIBRE { SoundScale::Calibre(diameter) } else { SoundScale::None },
            );
            intent.sounds.push(sample);
        }
    }

    /// Trace the ricochet back into the target. Returns whether a follow-up
    /// hit was found.
    fn chain<R, S>(
        &self,
        rng: &mut R,
        acn: &AnticipatedCollision,
        striker: &SimObject,
        target: &SimObject,
        intent: &mut ResponseIntent,
        deferred: &mut S,
    ) -> bool
    where
        R: Rng + ?Sized,
        S: DeferredSink + ?Sized,
    {
        let ProjectileCommand::Ricochet {
            position,
            direction,
            velocity,
            distance_offset,
            ..
        } = intent.projectile
        else {
            return false;
        };

        let overshoot = acn.time_to_collision.abs() * velocity * self.velocity_multiplier;
        let mut rebound = striker.clone();
        rebound.pose = Pose::facing(position + direction * overshoot, &direction);
        if let ObjectKind::Projectile(state) = &mut rebound.kind {
            state.velocity = velocity;
            state.distance_offset = distance_offset;
        }

        let Some(detection) = heuristic::detect(
            self.meshes,
            self.attributes,
            &rebound,
            target,
            overshoot,
            Some(acn.detection.mesh),
        ) else {
            return false;
        };

        let next = anticipate(&rebound, target, detection, acn.chain_depth + 1, self.velocity_multiplier);
        log::trace!(
            "Ricochet off '{}' strikes '{}' (depth {})",
            acn.detection.mesh_name,
            next.detection.mesh_name,
            next.chain_depth
        );
        if next.time_to_collision > 0.0 {
            deferred.defer(next);
        } else if let Some(chained) = self.dispatch(rng, &next, &rebound, target, deferred) {
            intent.chained.push(chained);
        }
        true
    }
}
