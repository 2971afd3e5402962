//! The collision module facade
//!
//! Owns the tuning, the penetration model, the scheduler and the random
//! source. The simulation owner hands it a read-only [`ObjectProvider`]
//! and applies the returned intents itself.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::AttributeSource;
use crate::config::{CdrConfig, ConfigError};
use crate::foundation::collections::ObjectId;
use crate::physics::avoidance::{self, AvoidanceIntent};
use crate::physics::ballistics::PenetrationModel;
use crate::physics::collision::{MeshId, MeshLibrary};
use crate::physics::heuristic;
use crate::physics::response::{ResponseDispatcher, ResponseIntent};
use crate::physics::scheduler::{AcnHandle, Admission, CollisionScheduler};
use crate::world::{ObjectProvider, SimObject};

/// Result of [`CollisionModule::detect_and_schedule`]
#[derive(Debug, Clone, PartialEq)]
pub enum Scheduled {
    /// The hit was already due and has been resolved
    Resolved(Option<ResponseIntent>),
    /// The hit waits on the active list
    Deferred(AcnHandle),
}

/// Collision detection and response for one simulation
pub struct CollisionModule<L, A> {
    config: CdrConfig,
    meshes: L,
    attributes: A,
    model: PenetrationModel,
    scheduler: CollisionScheduler,
    rng: StdRng,
    sim_time: f64,
}

impl<L, A> CollisionModule<L, A>
where
    L: MeshLibrary,
    A: AttributeSource,
{
    /// Create the module. A configured seed makes every outcome repeatable.
    pub fn new(config: CdrConfig, meshes: L, attributes: A) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;
        log::info!(
            "Collision module: {:?} penetration, chain limit {}, log {}",
            config.penetration_system,
            config.ricochet_chain_limit,
            if config.pen_log_enabled { config.pen_log_path.as_str() } else { "off" }
        );

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            model: PenetrationModel::new(&config),
            scheduler: CollisionScheduler::new(config.velocity_multiplier),
            config,
            meshes,
            attributes,
            rng,
            sim_time: 0.0,
        })
    }

    /// Active settings
    pub fn config(&self) -> &CdrConfig {
        &self.config
    }

    /// Collision geometry
    pub fn meshes(&self) -> &L {
        &self.meshes
    }

    /// Attribute database
    pub fn attributes(&self) -> &A {
        &self.attributes
    }

    /// Pending hits
    pub fn scheduler(&self) -> &CollisionScheduler {
        &self.scheduler
    }

    /// Seconds ticked so far
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Find where `striker` hits `target` and either resolve it at once or
    /// queue it. `None` when either id is unknown or nothing is hit.
    pub fn detect_and_schedule<W: ObjectProvider + ?Sized>(
        &mut self,
        world: &W,
        striker: ObjectId,
        target: ObjectId,
        move_back: f32,
        exclude: Option<MeshId>,
    ) -> Option<Scheduled> {
        let (striker, target) = lookup(world, striker, target)?;
        let detection = heuristic::detect(&self.meshes, &self.attributes, striker, target, move_back, exclude)?;
        let node = self.scheduler.anticipate(striker, target, detection, 0);

        match self.scheduler.schedule(node) {
            Admission::Deferred(handle) => Some(Scheduled::Deferred(handle)),
            Admission::Due(node) => {
                let dispatcher = ResponseDispatcher::new(
                    &self.meshes,
                    &self.attributes,
                    &self.model,
                    self.config.velocity_multiplier,
                    self.config.ricochet_chain_limit,
                    self.sim_time,
                );
                let mut deferred = Vec::new();
                let intent = dispatcher.dispatch(&mut self.rng, &node, striker, target, &mut deferred);
                for next in deferred {
                    self.scheduler.queue(next);
                }
                Some(Scheduled::Resolved(intent))
            }
        }
    }

    /// Advance the clock and resolve every hit that has come due
    pub fn tick<W: ObjectProvider + ?Sized>(&mut self, world: &W, dt: f32) -> Vec<ResponseIntent> {
        self.sim_time += f64::from(dt);
        let dispatcher = ResponseDispatcher::new(
            &self.meshes,
            &self.attributes,
            &self.model,
            self.config.velocity_multiplier,
            self.config.ricochet_chain_limit,
            self.sim_time,
        );
        let rng = &mut self.rng;

        let mut intents = Vec::new();
        self.scheduler.tick(dt, |node, sink| {
            let Some((striker, target)) = lookup(world, node.striker, node.target) else {
                return;
            };
            if let Some(intent) = dispatcher.dispatch(&mut *rng, &node, striker, target, sink) {
                intents.push(intent);
            }
        });
        intents
    }

    /// Two objects are touching: decide how the units among them separate
    pub fn resolve_immediate<W: ObjectProvider + ?Sized>(
        &self,
        world: &W,
        a: ObjectId,
        b: ObjectId,
    ) -> Option<AvoidanceIntent> {
        let (a, b) = lookup(world, a, b)?;
        avoidance::resolve(a, b)
    }

    /// Turn the penetration log on or off
    pub fn set_pen_log(&mut self, enabled: bool) {
        self.model.set_log_enabled(enabled);
        self.config.pen_log_enabled = self.model.log_enabled();
    }

    /// Whether impacts are being logged
    pub fn pen_log_enabled(&self) -> bool {
        self.model.log_enabled()
    }

    /// Scheduled hits pinning `id`
    pub fn in_flight(&self, id: ObjectId) -> u32 {
        self.scheduler.in_flight(id)
    }

    /// Whether `id` may be destroyed
    pub fn can_release(&self, id: ObjectId) -> bool {
        self.scheduler.can_release(id)
    }
}

fn lookup<W: ObjectProvider + ?Sized>(world: &W, a: ObjectId, b: ObjectId) -> Option<(&SimObject, &SimObject)> {
    match (world.object(a), world.object(b)) {
        (Some(a), Some(b)) => Some((a, b)),
        (a_found, _) => {
            let missing = if a_found.is_none() { a } else { b };
            log::warn!("Object {:?} is not in the world", missing);
            None
        }
    }
}
