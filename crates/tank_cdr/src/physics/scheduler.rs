//! Anticipated collisions
//!
//! A detected hit is not resolved until the projectile would actually have
//! travelled the distance to it. Nodes live in a slot-map arena; the active
//! list is only ever extended after a full scan, so nodes produced while
//! resolving (ricochet chains) wait for the next tick.

use crate::foundation::collections::{new_key_type, HandleMap, ObjectId, RefCounts};
use crate::physics::collision::CollisionDetectionResult;
use crate::world::SimObject;

new_key_type! {
    /// Handle to a scheduled collision
    pub struct AcnHandle;
}

/// A detected hit waiting for its time to come
#[derive(Debug, Clone, PartialEq)]
pub struct AnticipatedCollision {
    /// Striking object
    pub striker: ObjectId,
    /// Struck object
    pub target: ObjectId,
    /// Whether the target is itself a projectile and so is pinned too
    pub target_is_projectile: bool,
    /// The hit
    pub detection: CollisionDetectionResult,
    /// Seconds until the hit happens
    pub time_to_collision: f32,
    /// Ricochets preceding this hit
    pub chain_depth: u32,
}

/// Wrap a detection into a node. Projectiles are due once they have flown
/// `t` at `velocity * velocity_multiplier`; anything else is due at once.
pub fn anticipate(
    striker: &SimObject,
    target: &SimObject,
    detection: CollisionDetectionResult,
    chain_depth: u32,
    velocity_multiplier: f32,
) -> AnticipatedCollision {
    let time_to_collision = match striker.projectile() {
        Some(projectile) if projectile.velocity * velocity_multiplier > 0.0 => {
            detection.t / (projectile.velocity * velocity_multiplier)
        }
        _ => 0.0,
    };
    AnticipatedCollision {
        striker: striker.id,
        target: target.id,
        target_is_projectile: target.projectile().is_some(),
        detection,
        time_to_collision,
        chain_depth,
    }
}

/// Receiver for nodes that are not yet due
pub trait DeferredSink {
    /// Take a node for later scheduling
    fn defer(&mut self, node: AnticipatedCollision);
}

impl DeferredSink for Vec<AnticipatedCollision> {
    fn defer(&mut self, node: AnticipatedCollision) {
        self.push(node);
    }
}

/// Outcome of [`CollisionScheduler::schedule`]
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Already due; resolve it now
    Due(AnticipatedCollision),
    /// Queued on the active list
    Deferred(AcnHandle),
}

/// Collector for nodes produced while a tick is resolving
#[derive(Debug)]
pub struct PendingSink<'a> {
    nodes: &'a mut Vec<AnticipatedCollision>,
}

impl DeferredSink for PendingSink<'_> {
    fn defer(&mut self, node: AnticipatedCollision) {
        self.push(node);
    }
}

impl PendingSink<'_> {
    /// Queue a node for admission once the current scan is over
    pub fn push(&mut self, node: AnticipatedCollision) {
        self.nodes.push(node);
    }

    /// Nodes queued during this scan so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been queued yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Active and pending anticipated collisions plus per-object pins
#[derive(Debug)]
pub struct CollisionScheduler {
    nodes: HandleMap<AcnHandle, AnticipatedCollision>,
    active: Vec<AcnHandle>,
    pending: Vec<AnticipatedCollision>,
    in_flight: RefCounts<ObjectId>,
    velocity_multiplier: f32,
}

impl CollisionScheduler {
    /// Empty scheduler; `velocity_multiplier` scales projectile speed into
    /// ray units per second
    pub fn new(velocity_multiplier: f32) -> Self {
        Self {
            nodes: HandleMap::with_key(),
            active: Vec::new(),
            pending: Vec::new(),
            in_flight: RefCounts::new(),
            velocity_multiplier,
        }
    }

    /// Wrap a detection into a node, computing its countdown
    pub fn anticipate(
        &self,
        striker: &SimObject,
        target: &SimObject,
        detection: CollisionDetectionResult,
        chain_depth: u32,
    ) -> AnticipatedCollision {
        anticipate(striker, target, detection, chain_depth, self.velocity_multiplier)
    }

    /// Speed scale applied by [`CollisionScheduler::anticipate`]
    pub fn velocity_multiplier(&self) -> f32 {
        self.velocity_multiplier
    }

    /// Hand back a node that is already due, or queue it
    pub fn schedule(&mut self, node: AnticipatedCollision) -> Admission {
        if node.time_to_collision <= 0.0 {
            return Admission::Due(node);
        }
        Admission::Deferred(self.admit(node))
    }

    /// Queue a node whatever its countdown. One that is already due fires
    /// on the next tick, like nodes produced during a scan.
    pub fn queue(&mut self, node: AnticipatedCollision) -> AcnHandle {
        self.admit(node)
    }

    fn admit(&mut self, node: AnticipatedCollision) -> AcnHandle {
        self.in_flight.acquire(node.striker);
        if node.target_is_projectile {
            self.in_flight.acquire(node.target);
        }
        log::trace!(
            "Scheduled hit on '{}' in {:.4}s (depth {})",
            node.detection.mesh_name,
            node.time_to_collision,
            node.chain_depth
        );
        let handle = self.nodes.insert(node);
        self.active.push(handle);
        handle
    }

    /// Advance every active node by `dt` and hand the due ones to
    /// `dispatch`. Returns how many were resolved.
    pub fn tick<F>(&mut self, dt: f32, mut dispatch: F) -> usize
    where
        F: FnMut(AnticipatedCollision, &mut PendingSink<'_>),
    {
        let mut pending = std::mem::take(&mut self.pending);
        let scanned = std::mem::take(&mut self.active);
        let mut resolved = 0;

        for handle in scanned {
            let due = match self.nodes.get_mut(handle) {
                Some(node) => {
                    node.time_to_collision -= dt;
                    node.time_to_collision <= 0.0
                }
                None => continue,
            };
            if !due {
                self.active.push(handle);
                continue;
            }
            let Some(node) = self.nodes.remove(handle) else {
                continue;
            };
            let (striker, target) = (node.striker, node.target_is_projectile.then_some(node.target));
            dispatch(node, &mut PendingSink { nodes: &mut pending });
            self.in_flight.release(striker);
            if let Some(target) = target {
                self.in_flight.release(target);
            }
            resolved += 1;
        }

        for node in pending.drain(..) {
            self.admit(node);
        }
        self.pending = pending;
        resolved
    }

    /// Scheduled hits pinning `id`
    pub fn in_flight(&self, id: ObjectId) -> u32 {
        self.in_flight.get(id)
    }

    /// Whether `id` may be destroyed
    pub fn can_release(&self, id: ObjectId) -> bool {
        self.in_flight(id) == 0
    }

    /// Nodes on the active list
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Nodes waiting to be admitted
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Look at a queued node
    pub fn get(&self, handle: AcnHandle) -> Option<&AnticipatedCollision> {
        self.nodes.get(handle)
    }
}
