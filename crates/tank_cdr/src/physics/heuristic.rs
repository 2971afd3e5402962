//! Hit-location heuristic
//!
//! Decides which meshes of a target a projectile is tested against, and in
//! which order, from the direction the shot arrives. Tanks get the full
//! treatment (guns, turrets, tiered hull plates, exposed-component flags);
//! anti-tank guns a fixed list; everything else a brute-force pass over all
//! meshes.

use crate::assets::AttributeSource;
use crate::foundation::math::{Mat4Ext, Spherical, Vec3, FP_ERROR};
use crate::world::{ObjectKind, SimObject, TankState};

use super::attachment::{attachment_to_world, build_local_transform, Attachment};
use super::collision::{CollisionDetectionResult, DetectionModifiers, HitSearch, MeshId, MeshLibrary, Ray, CD_T_START};

/// Far end of the projectile's detection ray, in its own frame
pub const CD_T_OFFSET: f32 = 32.0;

/// Rays flatter than this also test the top plates
const TOP_PLATE_DIR_Y: f32 = 0.1;

/// Side of a hull or turret a shot arrives from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// Yaw below 45° or above 315°
    Front,
    /// Yaw strictly between 135° and 225°
    Rear,
    /// Yaw in [45°, 135°]
    Left,
    /// Everything else
    Right,
}

impl Quadrant {
    /// Classify a local yaw in degrees
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        if !(45.0..=315.0).contains(&yaw) {
            Self::Front
        } else if yaw > 135.0 && yaw < 225.0 {
            Self::Rear
        } else if yaw <= 225.0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    fn turret_meshes(self) -> (&'static str, [&'static str; 2]) {
        match self {
            Self::Front => ("FR", ["LF", "RG"]),
            Self::Rear => ("RR", ["LF", "RG"]),
            Self::Left => ("LF", ["FR", "RR"]),
            Self::Right => ("RG", ["FR", "RR"]),
        }
    }

    fn turret_flag(self) -> DetectionModifiers {
        match self {
            Self::Front => DetectionModifiers::TURRET_FRONT,
            Self::Rear => DetectionModifiers::TURRET_REAR,
            Self::Left => DetectionModifiers::TURRET_LEFT,
            Self::Right => DetectionModifiers::TURRET_RIGHT,
        }
    }

    fn hull_flag(self) -> DetectionModifiers {
        match self {
            Self::Front => DetectionModifiers::HULL_FRONT,
            Self::Rear => DetectionModifiers::HULL_REAR,
            Self::Left => DetectionModifiers::HULL_LEFT,
            Self::Right => DetectionModifiers::HULL_RIGHT,
        }
    }
}

const FRONT_FACE: &[&str] = &["FR_UP_HULL", "GLACIS", "FR_HL_NOSE", "FR_LW_HULL"];
const REAR_FACE: &[&str] = &["RR_UP_HULL", "RR_LW_HULL"];

type Tiers = &'static [&'static [&'static str]];

const FRONT_UPPER: Tiers = &[
    &["FR_UP_HULL"],
    &["GLACIS", "FR_HL_NOSE", "FR_LW_HULL"],
    &["TRACK_L", "TRACK_R", "LF_UP_HULL", "RG_UP_HULL", "LF_LW_HULL", "RG_LW_HULL"],
];
const FRONT_LOWER: Tiers = &[
    &["FR_LW_HULL"],
    &["FR_HL_NOSE", "GLACIS", "FR_UP_HULL"],
    &["TRACK_L", "TRACK_R", "LF_LW_HULL", "RG_LW_HULL", "LF_UP_HULL", "RG_UP_HULL"],
];
const REAR_UPPER: Tiers = &[
    &["RR_UP_HULL"],
    &["RR_LW_HULL"],
    &["LF_UP_HULL", "RG_UP_HULL"],
    &["TRACK_L", "TRACK_R", "LF_LW_HULL", "RG_LW_HULL"],
];
const REAR_LOWER: Tiers = &[
    &["RR_LW_HULL"],
    &["RR_UP_HULL"],
    &["TRACK_L", "TRACK_R", "LF_LW_HULL", "RG_LW_HULL"],
    &["LF_UP_HULL", "RG_UP_HULL"],
];
const LEFT_UPPER: Tiers = &[&["LF_UP_HULL"], &["LF_LW_HULL"]];
const LEFT_LOWER: Tiers = &[&["LF_LW_HULL"], &["LF_UP_HULL"]];
const RIGHT_UPPER: Tiers = &[&["RG_UP_HULL"], &["RG_LW_HULL"]];
const RIGHT_LOWER: Tiers = &[&["RG_LW_HULL"], &["RG_UP_HULL"]];

/// Hull plate tiers for an approach; a tier is only tested when every
/// earlier tier came up empty. Side approaches end on whichever end face
/// the reference point lies toward.
fn hull_tiers(quadrant: Quadrant, upper: bool, front_half: bool) -> Vec<&'static [&'static str]> {
    let ends = if front_half { FRONT_FACE } else { REAR_FACE };
    let (tiers, ends) = match (quadrant, upper) {
        (Quadrant::Front, true) => (FRONT_UPPER, None),
        (Quadrant::Front, false) => (FRONT_LOWER, None),
        (Quadrant::Rear, true) => (REAR_UPPER, None),
        (Quadrant::Rear, false) => (REAR_LOWER, None),
        (Quadrant::Left, true) => (LEFT_UPPER, Some(ends)),
        (Quadrant::Left, false) => (LEFT_LOWER, Some(ends)),
        (Quadrant::Right, true) => (RIGHT_UPPER, Some(ends)),
        (Quadrant::Right, false) => (RIGHT_LOWER, Some(ends)),
    };
    tiers.iter().copied().chain(ends).collect()
}

/// The striker's detection ray expressed in a target attachment frame
pub fn striker_ray(striker: &SimObject, target: &SimObject, attachment: Attachment, move_back: f32) -> Option<Ray> {
    let m = build_local_transform(striker, target, attachment)?;
    let origin = m.apply_point(&Vec3::new(0.0, 0.0, -move_back));
    let end = m.apply_point(&Vec3::new(0.0, 0.0, CD_T_OFFSET));
    Some(Ray::between(origin, end))
}

fn attribute_f32<A: AttributeSource + ?Sized>(attributes: &A, model: &str, key: &str) -> Option<f32> {
    let raw = attributes.query(model, key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Model '{}': {} = '{}' is not a number", model, key, raw);
            None
        }
    }
}

/// Find where `striker` hits `target`.
///
/// `move_back` pulls the ray origin behind the striker so a shot that has
/// already crossed a surface this tick still finds it; the returned `t` is
/// measured from the striker itself. `exclude` skips one mesh, used when
/// tracing a ricochet off that mesh.
pub fn detect<L, A>(
    meshes: &L,
    attributes: &A,
    striker: &SimObject,
    target: &SimObject,
    move_back: f32,
    exclude: Option<MeshId>,
) -> Option<CollisionDetectionResult>
where
    L: MeshLibrary + ?Sized,
    A: AttributeSource + ?Sized,
{
    if striker.projectile().is_none() {
        log::debug!("Striker '{}' is not a projectile; nothing to detect", striker.model);
        return None;
    }

    let mut search = HitSearch::new(meshes, target.model_id, exclude);
    let searched = match &target.kind {
        ObjectKind::Tank(tank) => TankPass {
            striker,
            target,
            tank,
            move_back,
            uphull_base: attribute_f32(attributes, &target.model, "CDH_UP_HULL").unwrap_or(0.0),
            turret_base: attribute_f32(attributes, &target.model, "CDH_TURRET").filter(|b| *b != 0.0),
        }
        .run(&mut search),
        ObjectKind::AntiTankGun(emplacement) => {
            search_emplacement(&mut search, striker, target, move_back, emplacement.ext_crew, emplacement.ext_ammo)
        }
        ObjectKind::Vehicle(_) | ObjectKind::Static | ObjectKind::Projectile(_) => {
            brute_force(&mut search, meshes, striker, target, move_back)
        }
    };
    if searched.is_none() {
        log::warn!("Could not build attachment frames for '{}'", target.model);
        return None;
    }

    let mut best = search.finish()?;
    if let Some(to_world) = attachment_to_world(target, best.attachment) {
        best.world_point = to_world.apply_point(&best.impact_point);
    }
    best.t -= move_back;
    log::trace!(
        "'{}' hits '{}' on {} at t = {:.4}, modifiers {:?}",
        striker.model, target.model, best.mesh_name, best.t, best.modifiers
    );
    Some(best)
}

struct TankPass<'a> {
    striker: &'a SimObject,
    target: &'a SimObject,
    tank: &'a TankState,
    move_back: f32,
    uphull_base: f32,
    turret_base: Option<f32>,
}

impl TankPass<'_> {
    fn ray(&self, attachment: Attachment) -> Option<Ray> {
        striker_ray(self.striker, self.target, attachment, self.move_back)
    }

    fn run<L: MeshLibrary + ?Sized>(&self, search: &mut HitSearch<'_, L>) -> Option<()> {
        let hull = self.ray(Attachment::Hull)?;
        let (o, d) = (hull.origin, hull.direction);
        let (incoming_pitch, incoming_yaw) = Spherical::from_cartesian(&o).degrees();
        let quadrant = Quadrant::from_yaw_degrees(incoming_yaw);

        let mut t_ref = if incoming_pitch < 45.0 {
            (self.uphull_base - o.y) / d.y
        } else if matches!(quadrant, Quadrant::Front | Quadrant::Rear) {
            -o.z / d.z
        } else {
            -o.x / d.x
        };
        if !t_ref.is_finite() {
            t_ref = -o.dot(&d);
        }
        let p_ref = hull.point_at(t_ref);
        let p_ext = [
            hull.point_at(t_ref - self.target.radius),
            hull.point_at(t_ref + self.target.radius),
        ];

        for i in 0..self.tank.guns.len() {
            let Ok(index) = u8::try_from(i) else { break };
            let mount = Attachment::GunMount(index);
            search.test_named(&self.ray(mount)?, &format!("GUN_MANT{}", i + 1), mount);
            let gun = Attachment::Gun(index);
            search.test_named(&self.ray(gun)?, &format!("GUN{}", i + 1), gun);
        }

        let has_turrets = !self.tank.turrets.is_empty();
        let mut turrets_checked = false;
        if let Some(base) = self.turret_base {
            if has_turrets && p_ref.y >= base - FP_ERROR {
                turrets_checked = true;
                self.turret_pass(search)?;
            }
        }

        let below_turret = |base: f32| p_ref.y < base || p_ext.iter().any(|p| p.y < base);
        if !has_turrets || self.turret_base.map_or(true, below_turret) {
            self.hull_pass(search, &hull, quadrant, &p_ref);
        }

        if has_turrets && !turrets_checked {
            let reaches_turret = self
                .turret_base
                .map_or(true, |base| p_ext.iter().any(|p| p.y >= base - FP_ERROR));
            if reaches_turret {
                self.turret_pass(search)?;
            }
        }

        if self.tank.ext_crew == Some(Attachment::Hull) {
            search.flag_box(&hull, "EXT_CREW", search.best_t(), DetectionModifiers::EXT_CREW);
        }
        if self.tank.ext_ammo == Some(Attachment::Hull) {
            search.flag_box(&hull, "EXT_AMMO", search.best_t(), DetectionModifiers::EXT_AMMO);
        }
        search.flag_box(&hull, "EXT_ENGINE", CD_T_START, DetectionModifiers::EXT_ENGINE);
        search.flag_box(&hull, "EXT_FUEL", CD_T_START, DetectionModifiers::EXT_FUEL);
        Some(())
    }

    fn turret_pass<L: MeshLibrary + ?Sized>(&self, search: &mut HitSearch<'_, L>) -> Option<()> {
        for i in 0..self.tank.turrets.len() {
            let Ok(index) = u8::try_from(i) else { break };
            let attachment = Attachment::Turret(index);
            let ray = self.ray(attachment)?;
            let (_, yaw) = Spherical::from_cartesian(&ray.origin).degrees();
            let quadrant = Quadrant::from_yaw_degrees(yaw);
            search.mark(quadrant.turret_flag());

            let (primary, secondary) = quadrant.turret_meshes();
            let n = i + 1;
            if !search.test_named(&ray, &format!("{primary}_TURRET{n}"), attachment) {
                for side in secondary {
                    search.test_named(&ray, &format!("{side}_TURRET{n}"), attachment);
                }
            }

            if ray.direction.y < TOP_PLATE_DIR_Y {
                search.test_named(&ray, &format!("TP_TURRET{n}"), attachment);
            }
            if self.tank.cupola == Some(attachment) {
                search.test_named(&ray, "CUPOLA", attachment);
            }
            if self.tank.ext_crew == Some(attachment) {
                search.flag_box(&ray, "EXT_CREW", search.best_t(), DetectionModifiers::EXT_CREW);
            }
            if self.tank.ext_ammo == Some(attachment) {
                search.flag_box(&ray, "EXT_AMMO", search.best_t(), DetectionModifiers::EXT_AMMO);
            }
        }
        Some(())
    }

    fn hull_pass<L: MeshLibrary + ?Sized>(&self, search: &mut HitSearch<'_, L>, hull: &Ray, quadrant: Quadrant, p_ref: &Vec3) {
        search.mark(quadrant.hull_flag());
        let upper = p_ref.y >= self.uphull_base - FP_ERROR;
        let front_half = p_ref.z >= -FP_ERROR;

        let mut hits = 0;
        for tier in hull_tiers(quadrant, upper, front_half) {
            if hits > 0 {
                break;
            }
            hits += search.test_each(hull, tier, Attachment::Hull);
        }

        if hull.direction.y < TOP_PLATE_DIR_Y {
            search.test_named(hull, "TP_HULL", Attachment::Hull);
        }
        if self.tank.cupola == Some(Attachment::Hull) {
            search.test_named(hull, "CUPOLA", Attachment::Hull);
        }
    }
}

fn search_emplacement<L: MeshLibrary + ?Sized>(
    search: &mut HitSearch<'_, L>,
    striker: &SimObject,
    target: &SimObject,
    move_back: f32,
    ext_crew: bool,
    ext_ammo: bool,
) -> Option<()> {
    let hull = striker_ray(striker, target, Attachment::Hull, move_back)?;
    search.test_each(&hull, &["WHEEL_L1", "WHEEL_R1"], Attachment::Hull);

    let gun = Attachment::Gun(0);
    search.test_named(&striker_ray(striker, target, gun, move_back)?, "GUN1", gun);
    let mount = Attachment::GunMount(0);
    search.test_named(&striker_ray(striker, target, mount, move_back)?, "GUN_MANT1", mount);

    search.test_each(&hull, &["GUN_SHIELD", "HULL"], Attachment::Hull);

    if ext_crew {
        search.flag_box(&hull, "EXT_CREW", search.best_t(), DetectionModifiers::EXT_CREW);
    }
    if ext_ammo {
        search.flag_box(&hull, "EXT_AMMO", search.best_t(), DetectionModifiers::EXT_AMMO);
    }
    Some(())
}

fn brute_force<L: MeshLibrary + ?Sized>(
    search: &mut HitSearch<'_, L>,
    meshes: &L,
    striker: &SimObject,
    target: &SimObject,
    move_back: f32,
) -> Option<()> {
    let hull = striker_ray(striker, target, Attachment::Hull, move_back)?;
    for i in (0..meshes.mesh_count(target.model_id)).rev() {
        search.test_mesh(&hull, MeshId(i), Attachment::Hull);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::foundation::math::{constants, Pose};
    use crate::physics::ballistics::AmmoType;
    use approx::assert_relative_eq;

    fn shot_from(position: Vec3, direction: Vec3) -> SimObject {
        fixtures::shell(Pose::facing(position, &direction), AmmoType::Apcbc, 7.5, 750.0)
    }

    #[test]
    fn test_quadrants() {
        assert_eq!(Quadrant::from_yaw_degrees(0.0), Quadrant::Front);
        assert_eq!(Quadrant::from_yaw_degrees(44.9), Quadrant::Front);
        assert_eq!(Quadrant::from_yaw_degrees(315.1), Quadrant::Front);
        assert_eq!(Quadrant::from_yaw_degrees(45.0), Quadrant::Left);
        assert_eq!(Quadrant::from_yaw_degrees(135.0), Quadrant::Left);
        assert_eq!(Quadrant::from_yaw_degrees(135.1), Quadrant::Rear);
        assert_eq!(Quadrant::from_yaw_degrees(224.9), Quadrant::Rear);
        assert_eq!(Quadrant::from_yaw_degrees(225.0), Quadrant::Left);
        assert_eq!(Quadrant::from_yaw_degrees(270.0), Quadrant::Right);
        assert_eq!(Quadrant::from_yaw_degrees(315.0), Quadrant::Right);
    }

    #[test]
    fn test_striker_ray_in_hull_frame() {
        let library = fixtures::library();
        let target = fixtures::tank(&library, Pose::default());
        let shot = shot_from(Vec3::new(0.5, 1.3, 20.0), Vec3::new(0.0, 0.0, -1.0));
        let ray = striker_ray(&shot, &target, Attachment::Hull, 2.0).unwrap();
        assert_relative_eq!(ray.origin, Vec3::new(0.5, 1.3, 22.0), epsilon = 1e-4);
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_frontal_upper_hull_hit() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let target = fixtures::tank(&library, Pose::default());
        let shot = shot_from(Vec3::new(0.5, 1.3, 20.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = detect(&library, &db, &shot, &target, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "FR_UP_HULL");
        assert_eq!(hit.attachment, Attachment::Hull);
        assert_relative_eq!(hit.t, 17.0, epsilon = 1e-3);
        assert_relative_eq!(hit.impact_angle, 0.0, epsilon = 1e-3);
        assert_relative_eq!(hit.world_point, Vec3::new(0.5, 1.3, 3.0), epsilon = 1e-3);
        assert!(hit.modifiers.contains(DetectionModifiers::HULL_FRONT));
        assert!(hit.modifiers.contains(DetectionModifiers::EXT_ENGINE));
        assert!(!hit.modifiers.intersects(DetectionModifiers::TURRET_FRONT));
    }

    #[test]
    fn test_move_back_is_subtracted() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let target = fixtures::tank(&library, Pose::default());
        // Shell already 1 unit inside the front plate
        let shot = shot_from(Vec3::new(0.5, 1.3, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(detect(&library, &db, &shot, &target, 0.0, None).map_or(true, |h| h.mesh_name != "FR_UP_HULL"));

        let hit = detect(&library, &db, &shot, &target, 3.0, None).unwrap();
        assert_eq!(hit.mesh_name, "FR_UP_HULL");
        assert_relative_eq!(hit.t, -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_high_shot_hits_mantlet_before_turret() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let target = fixtures::tank(&library, Pose::default());
        let shot = shot_from(Vec3::new(0.3, 2.0, 20.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = detect(&library, &db, &shot, &target, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "GUN_MANT1");
        assert_eq!(hit.attachment, Attachment::GunMount(0));
        assert_relative_eq!(hit.t, 20.0 - 1.35, epsilon = 1e-3);
        assert!(hit.modifiers.contains(DetectionModifiers::TURRET_FRONT));
        // Shot passes above the hull line, so the hull pass never runs
        assert!(!hit.modifiers.contains(DetectionModifiers::HULL_FRONT));
    }

    #[test]
    fn test_turret_quadrant_uses_turret_frame() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let mut target = fixtures::tank(&library, Pose::default());
        if let ObjectKind::Tank(tank) = &mut target.kind {
            tank.turrets[0].rotation = constants::HALF_PI;
        }
        // Arrives from hull-left, which the rotated turret sees head on
        let shot = shot_from(Vec3::new(20.0, 2.0, 0.6), Vec3::new(-1.0, 0.0, 0.0));
        let hit = detect(&library, &db, &shot, &target, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "FR_TURRET1");
        assert_eq!(hit.attachment, Attachment::Turret(0));
        assert!(hit.modifiers.contains(DetectionModifiers::TURRET_FRONT));
        assert_relative_eq!(hit.world_point.x, 1.2, epsilon = 1e-3);
    }

    #[test]
    fn test_side_shot_tiers() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let target = fixtures::tank(&library, Pose::default());
        let shot = shot_from(Vec3::new(-20.0, 0.7, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = detect(&library, &db, &shot, &target, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "RG_LW_HULL");
        assert!(hit.modifiers.contains(DetectionModifiers::HULL_RIGHT));
        assert_relative_eq!(hit.t, 18.5, epsilon = 1e-3);
    }

    #[test]
    fn test_excluded_mesh_is_skipped() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let target = fixtures::tank(&library, Pose::default());
        let shot = shot_from(Vec3::new(0.5, 1.3, 20.0), Vec3::new(0.0, 0.0, -1.0));
        let plate = library.mesh_id(target.model_id, "FR_UP_HULL");
        assert!(detect(&library, &db, &shot, &target, 0.0, plate).is_none());
    }

    #[test]
    fn test_static_brute_force_and_non_projectile() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let wall = fixtures::wall(&library, Pose::default());
        let shot = shot_from(Vec3::new(0.0, 1.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = detect(&library, &db, &shot, &wall, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "NEAR_WALL");
        assert_relative_eq!(hit.t, 9.0, epsilon = 1e-3);

        let tank = fixtures::tank(&library, Pose::default());
        assert!(detect(&library, &db, &tank, &wall, 0.0, None).is_none());
    }

    #[test]
    fn test_emplacement_shield_and_crew_flag() {
        let (library, db) = (fixtures::library(), fixtures::database());
        let gun = fixtures::anti_tank_gun(&library, Pose::default());

        // Crew shelter behind the shield
        let front = shot_from(Vec3::new(0.6, 0.8, 20.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = detect(&library, &db, &front, &gun, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "GUN_SHIELD");
        assert_relative_eq!(hit.t, 19.45, epsilon = 1e-3);
        assert!(!hit.modifiers.contains(DetectionModifiers::EXT_CREW));

        let rear = shot_from(Vec3::new(0.6, 0.8, -20.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = detect(&library, &db, &rear, &gun, 0.0, None).unwrap();
        assert_eq!(hit.mesh_name, "GUN_SHIELD");
        assert!(hit.modifiers.contains(DetectionModifiers::EXT_CREW));
        assert!(!hit.modifiers.contains(DetectionModifiers::EXT_AMMO));
    }
}
