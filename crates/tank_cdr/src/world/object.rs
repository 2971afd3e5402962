//! Simulation objects as seen by the collision core
//!
//! The core only ever reads these; consequences flow back to the owner as
//! intent values.

use serde::{Deserialize, Serialize};

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Pose, Vec3};
use crate::physics::attachment::Attachment;
use crate::physics::ballistics::{AmmoModifiers, AmmoType};
use crate::physics::collision::ModelId;

use super::mobility::Mobility;

/// A rotating turret
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Turret {
    /// Rotation around the hull's +Y axis
    pub rotation: f32,
    /// Pivot in the hull frame
    pub pivot: Vec3,
}

/// Where a gun is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GunMountPoint {
    /// Fixed in the hull; the gun traverses in its own mount
    Hull,
    /// Carried by the indexed turret
    Turret(u8),
}

impl GunMountPoint {
    /// Attachment frame the mount lives in
    pub fn attachment(self) -> Attachment {
        match self {
            Self::Hull => Attachment::Hull,
            Self::Turret(i) => Attachment::Turret(i),
        }
    }
}

/// A gun barrel and its mount state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gun {
    /// Elevation as a pitch from +Y (HALF_PI = level)
    pub elevation: f32,
    /// Traverse within the mount
    pub traverse: f32,
    /// Current recoil travel
    pub recoil: f32,
    /// Pivot in the mount's parent frame
    pub pivot: Vec3,
    /// Mount location
    pub mount: GunMountPoint,
}

impl Default for Gun {
    fn default() -> Self {
        Self {
            elevation: crate::foundation::math::constants::HALF_PI,
            traverse: 0.0,
            recoil: 0.0,
            pivot: Vec3::zeros(),
            mount: GunMountPoint::Hull,
        }
    }
}

/// A crewman exposed to spalling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    /// Position in the attachment frame
    pub position: Vec3,
    /// Frame the crewman rides in
    pub attachment: Attachment,
}

/// Tank-specific state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TankState {
    /// Turrets, in index order
    pub turrets: Vec<Turret>,
    /// Guns, in index order
    pub guns: Vec<Gun>,
    /// Frame carrying the cupola mesh
    pub cupola: Option<Attachment>,
    /// Frame carrying the exposed crew box
    pub ext_crew: Option<Attachment>,
    /// Frame carrying the exposed ammunition box
    pub ext_ammo: Option<Attachment>,
    /// Engine position in the hull frame
    pub motor_position: Vec3,
    /// Crew positions
    pub crew: Vec<CrewMember>,
    /// Movement state
    pub mobility: Mobility,
}

/// Anti-tank gun emplacement state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GunEmplacement {
    /// The single gun
    pub gun: Gun,
    /// Gun crew
    pub crew: Vec<CrewMember>,
    /// Exposed crew box sits on the carriage
    pub ext_crew: bool,
    /// Exposed ammunition box sits on the carriage
    pub ext_ammo: bool,
}

/// A shell or bullet in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Ammunition type
    pub ammo: AmmoType,
    /// Calibre in centimetres
    pub diameter: f32,
    /// Speed in m/s
    pub velocity: f32,
    /// Explosive filler
    pub explosive: f32,
    /// Fuzing and tracer modifiers
    pub modifiers: AmmoModifiers,
    /// Distance flown so far, in metres
    pub travel_distance: f32,
    /// Extra distance charged to decay after a ricochet
    pub distance_offset: f32,
    /// Still in flight
    pub alive: bool,
}

impl ProjectileState {
    /// Fresh projectile leaving the muzzle
    pub fn new(ammo: AmmoType, diameter: f32, velocity: f32) -> Self {
        Self {
            ammo,
            diameter,
            velocity,
            explosive: 0.0,
            modifiers: AmmoModifiers::empty(),
            travel_distance: 0.0,
            distance_offset: 0.0,
            alive: true,
        }
    }
}

/// Closed set of object kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Armoured fighting vehicle with turrets and guns
    Tank(TankState),
    /// Towed or emplaced anti-tank gun
    AntiTankGun(GunEmplacement),
    /// Unarmoured vehicle
    Vehicle(Mobility),
    /// Scenery: trees, buildings, wrecks
    Static,
    /// Shell or bullet
    Projectile(ProjectileState),
}

/// A placed object
#[derive(Debug, Clone, PartialEq)]
pub struct SimObject {
    /// Store handle
    pub id: ObjectId,
    /// Model name, key into the attribute database
    pub model: String,
    /// Collision geometry
    pub model_id: ModelId,
    /// World placement
    pub pose: Pose,
    /// Bounding radius
    pub radius: f32,
    /// Kind-specific state
    pub kind: ObjectKind,
}

impl SimObject {
    /// New object; the id is assigned when inserted into a store
    pub fn new(model: impl Into<String>, model_id: ModelId, pose: Pose, radius: f32, kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::default(),
            model: model.into(),
            model_id,
            pose,
            radius,
            kind,
        }
    }

    /// Projectile state, if this is a projectile
    pub fn projectile(&self) -> Option<&ProjectileState> {
        match &self.kind {
            ObjectKind::Projectile(p) => Some(p),
            _ => None,
        }
    }

    /// Movement state, for units
    pub fn mobility(&self) -> Option<&Mobility> {
        match &self.kind {
            ObjectKind::Tank(tank) => Some(&tank.mobility),
            ObjectKind::Vehicle(mobility) => Some(mobility),
            _ => None,
        }
    }

    /// Mutable movement state
    pub fn mobility_mut(&mut self) -> Option<&mut Mobility> {
        match &mut self.kind {
            ObjectKind::Tank(tank) => Some(&mut tank.mobility),
            ObjectKind::Vehicle(mobility) => Some(mobility),
            _ => None,
        }
    }

    /// Tanks and vehicles
    pub fn is_unit(&self) -> bool {
        self.mobility().is_some()
    }

    /// World velocity carried by explosion effects
    pub fn velocity(&self) -> Vec3 {
        self.mobility().map_or_else(Vec3::zeros, |m| m.linear_velocity)
    }
}
