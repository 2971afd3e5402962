//! Collision detection and response
//!
//! Detection finds where a striker's ray meets a target's meshes, the
//! scheduler holds the hit until the projectile would really be there, and
//! the dispatcher turns it into a [`response::ResponseIntent`].

pub mod attachment;
pub mod avoidance;
pub mod ballistics;
pub mod collision;
pub mod heuristic;
pub mod response;
pub mod scheduler;

pub use attachment::{attachment_to_world, build_local_transform, world_to_attachment, Attachment};
pub use avoidance::{AvoidanceIntent, UnitAdjustment};
pub use response::{ResponseDispatcher, ResponseIntent};
pub use scheduler::{AcnHandle, Admission, AnticipatedCollision, CollisionScheduler};
