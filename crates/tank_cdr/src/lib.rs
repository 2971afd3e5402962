//! # Tank CDR
//!
//! Collision detection and response for a tank combat simulator.
//!
//! ## Features
//!
//! - **Hit Location**: per-slab ray tests in the frame of the hull, turret
//!   or gun that carries each mesh
//! - **Anticipated Collisions**: hits resolve when the shell would really
//!   have arrived, with ricochets traced back into the target
//! - **Armor Penetration**: slope effects, armor types and a probabilistic
//!   outcome, optionally written to a penetration log
//! - **Unit Avoidance**: stop-and-detour decisions for units that touch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tank_cdr::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CdrConfig::load_validated("cdr.toml")?;
//!     let meshes = GeometrySet::load_from_file("models.ron")?.build_library();
//!     let attributes = ModelDatabase::load_from_file("models_db.ron")?;
//!     let mut cdr = CollisionModule::new(config, meshes, attributes)?;
//!
//!     let world = ObjectStore::new();
//!     for intent in cdr.tick(&world, 1.0 / 60.0) {
//!         println!("{} -> {:?}", intent.slab, intent.response.modifiers);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod physics;
pub mod world;

mod cdr;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cdr::{CollisionModule, Scheduled};

/// Common imports for module users
pub mod prelude {
    pub use crate::{
        assets::{AttributeSource, GeometrySet, ModelDatabase},
        config::{CdrConfig, Config, ConfigError, PenetrationSystem},
        foundation::{
            collections::ObjectId,
            math::{Pose, Vec3},
        },
        physics::{
            avoidance::{AvoidanceIntent, UnitAdjustment},
            ballistics::{AmmoModifiers, AmmoType, ResponseModifiers},
            collision::{CollisionMesh, MeshLibrary, ModelLibrary, ModelMeshes},
            response::{EffectKind, ProjectileCommand, ResponseIntent, SoundKind},
        },
        world::{Mobility, ObjectKind, ObjectProvider, ObjectStore, ProjectileState, SimObject, TankState, Waypoint},
        CollisionModule, Scheduled,
    };
}
