//! Units bumping into each other or into scenery
//!
//! Decisions are taken against the positions both objects had when they
//! touched; nothing is applied until the owner calls
//! [`UnitAdjustment::apply`].

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{angle_between, constants, utils, Spherical, Vec3};
use crate::world::{Mobility, SimObject, Waypoint, WaypointFlags};

/// Units within this angle of their next waypoint are driving into the other
const FACING_LIMIT_DEG: f32 = 60.0;

/// Distance a stopped unit is backed away per contact
const NUDGE: f32 = 0.005;

/// Sideways detour distance
const DETOUR_SIDE: f32 = 6.0;

/// Reverse distance before a detour
const DETOUR_REVERSE: f32 = 10.0;

/// What happens to one unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitAdjustment {
    /// Affected unit
    pub unit: ObjectId,
    /// Added to the unit's position
    pub nudge: Vec3,
    /// The job on the current path head is to be cancelled
    pub cancel_head_job: bool,
    /// Waypoints to put in front of the path, head first. Heights are left
    /// for the owner to resolve against the terrain.
    pub detour: Vec<Waypoint>,
}

impl UnitAdjustment {
    fn stop(unit: &SimObject, other: &SimObject) -> Self {
        let away = (other.pose.position - unit.pose.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros);
        Self {
            unit: unit.id,
            nudge: away * -NUDGE,
            cancel_head_job: false,
            detour: Vec::new(),
        }
    }

    fn stop_and_go_around(unit: &SimObject, other: &SimObject) -> Self {
        let mut adjustment = Self::stop(unit, other);
        let Some(mobility) = unit.mobility() else {
            return adjustment;
        };
        if mobility.head().is_some_and(|head| head.flags.contains(WaypointFlags::CR_ASSIGNED)) {
            return adjustment;
        }

        let pose = &unit.pose;
        let bearing = Spherical::from_cartesian(&(other.pose.position - pose.position)).yaw;
        let offset = utils::wrap_angle(bearing - pose.yaw);
        let turn = if offset >= 0.0 { -constants::HALF_PI } else { constants::HALF_PI };

        let side = pose.position + Spherical::new(DETOUR_SIDE, pose.pitch, pose.yaw + turn).to_cartesian();
        let back = pose.position - pose.forward() * DETOUR_REVERSE;
        let assigned = WaypointFlags::TRANSMITTED | WaypointFlags::CR_ASSIGNED;

        adjustment.cancel_head_job = mobility.head().is_some_and(|head| head.job.is_some());
        adjustment.detour = vec![
            Waypoint::new(back, WaypointFlags::REVERSE | assigned),
            Waypoint::new(side, WaypointFlags::FORWARD | assigned),
        ];
        adjustment
    }

    /// Apply to the unit it was computed for. Returns the cancelled job.
    pub fn apply(&self, unit: &mut SimObject) -> Option<u32> {
        unit.pose.position += self.nudge;
        let mobility = unit.mobility_mut()?;
        mobility.throttle = 0.0;
        mobility.output_speed = 0.0;
        mobility.linear_velocity = Vec3::zeros();

        let cancelled = if self.cancel_head_job {
            mobility.path.first_mut().and_then(|head| head.job.take())
        } else {
            None
        };
        mobility.path.splice(0..0, self.detour.iter().cloned());
        cancelled
    }
}

/// Outcome of two objects touching
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AvoidanceIntent {
    /// One entry per affected unit
    pub adjustments: Vec<UnitAdjustment>,
}

impl AvoidanceIntent {
    /// Adjustment for `unit`, if it is affected
    pub fn for_unit(&self, unit: ObjectId) -> Option<&UnitAdjustment> {
        self.adjustments.iter().find(|a| a.unit == unit)
    }
}

/// Whether `unit` is driving toward `other`
fn facing(unit: &SimObject, mobility: &Mobility, other: &SimObject) -> bool {
    mobility.head().is_some_and(|head| {
        let heading = head.position - unit.pose.position;
        let toward = other.pose.position - unit.pose.position;
        angle_between(&heading, &toward) <= utils::deg_to_rad(FACING_LIMIT_DEG)
    })
}

/// Decide how two touching objects separate. `None` unless at least one
/// of them is a unit.
pub fn resolve(a: &SimObject, b: &SimObject) -> Option<AvoidanceIntent> {
    let both_ways = |a: &SimObject, b: &SimObject| {
        vec![UnitAdjustment::stop_and_go_around(a, b), UnitAdjustment::stop_and_go_around(b, a)]
    };

    let adjustments = match (a.mobility(), b.mobility()) {
        (Some(ma), Some(mb)) => match (ma.has_path(), mb.has_path()) {
            (true, true) => match (facing(a, ma, b), facing(b, mb, a)) {
                (true, false) => vec![UnitAdjustment::stop(a, b)],
                (false, true) => vec![UnitAdjustment::stop(b, a)],
                _ => both_ways(a, b),
            },
            (true, false) => vec![UnitAdjustment::stop_and_go_around(a, b)],
            (false, true) => vec![UnitAdjustment::stop_and_go_around(b, a)],
            (false, false) => vec![UnitAdjustment::stop(a, b), UnitAdjustment::stop(b, a)],
        },
        (Some(_), None) => vec![UnitAdjustment::stop_and_go_around(a, b)],
        (None, Some(_)) => vec![UnitAdjustment::stop_and_go_around(b, a)],
        (None, None) => return None,
    };
    log::debug!("'{}' touched '{}': adjusting {} unit(s)", a.model, b.model, adjustments.len());
    Some(AvoidanceIntent { adjustments })
}
