//! Object model consumed by collision detection and response

mod mobility;
mod object;

pub use mobility::{Mobility, Waypoint, WaypointFlags};
pub use object::{
    CrewMember, Gun, GunEmplacement, GunMountPoint, ObjectKind, ProjectileState, SimObject, TankState, Turret,
};

use crate::foundation::collections::{HandleMap, ObjectId};

/// Read access to placed objects
pub trait ObjectProvider {
    /// Look up an object by id
    fn object(&self, id: ObjectId) -> Option<&SimObject>;
}

/// Slot-map backed [`ObjectProvider`]
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HandleMap<ObjectId, SimObject>,
}

impl ObjectStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, stamping and returning its id
    pub fn insert(&mut self, object: SimObject) -> ObjectId {
        self.objects.insert_with_key(|id| SimObject { id, ..object })
    }

    /// Remove an object
    pub fn remove(&mut self, id: ObjectId) -> Option<SimObject> {
        self.objects.remove(id)
    }

    /// Mutable access for the simulation owner
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.objects.get_mut(id)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects
    pub fn iter(&self) -> impl Iterator<Item = &SimObject> {
        self.objects.values()
    }
}

impl ObjectProvider for ObjectStore {
    fn object(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(id)
    }
}
