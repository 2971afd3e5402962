//! Movement state of units and the waypoint path they follow

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

bitflags! {
    /// Waypoint behaviour flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WaypointFlags: u32 {
        /// Drive forward toward the waypoint
        const FORWARD = 0x1;
        /// Back up toward the waypoint
        const REVERSE = 0x2;
        /// Already sent to the unit
        const TRANSMITTED = 0x1000;
        /// Placed by the pathfinder
        const PF_ASSIGNED = 0x4000;
        /// Placed by collision response
        const CR_ASSIGNED = 0x8000;
    }
}

/// A point on a unit's path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target position; height is resolved by the path owner
    pub position: Vec3,
    /// Behaviour flags
    pub flags: WaypointFlags,
    /// Pathfinding job working on this waypoint, if any
    pub job: Option<u32>,
}

impl Waypoint {
    /// Waypoint without an attached job
    pub fn new(position: Vec3, flags: WaypointFlags) -> Self {
        Self { position, flags, job: None }
    }
}

/// Movement state shared by tanks and vehicles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mobility {
    /// Remaining path, head first
    pub path: Vec<Waypoint>,
    /// Throttle setting
    pub throttle: f32,
    /// Drive-train output speed
    pub output_speed: f32,
    /// Current linear velocity
    pub linear_velocity: Vec3,
}

impl Mobility {
    /// Head of the path
    pub fn head(&self) -> Option<&Waypoint> {
        self.path.first()
    }

    /// Whether the unit has somewhere to go
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}
