//! Attachment frames and the transforms between them
//!
//! Meshes are authored in the local frame of the part they move with.
//! A striker is brought into that frame by composing, outermost first:
//! gun recoil, gun mount elevation/traverse, turret rotation, then the
//! target hull's world-to-local matrix, and finally the striker's own
//! local-to-world matrix.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3};
use crate::world::{Gun, GunMountPoint, ObjectKind, SimObject, TankState};

/// Frame a mesh is authored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attachment {
    /// World space
    World,
    /// Object hull
    Hull,
    /// Indexed turret
    Turret(u8),
    /// Indexed gun mount (mantlet)
    GunMount(u8),
    /// Indexed gun barrel
    Gun(u8),
}

fn gun_mount_rotation(gun: &Gun) -> Mat4 {
    Mat4::rotation_x(-(gun.elevation - constants::HALF_PI))
}

fn tank_chain(tank: &TankState, attachment: Attachment) -> Option<Mat4> {
    match attachment {
        Attachment::World | Attachment::Hull => Some(Mat4::identity()),
        Attachment::Turret(i) => {
            let turret = tank.turrets.get(usize::from(i))?;
            Some(Mat4::rotation_y(-turret.rotation) * Mat4::translation(&-turret.pivot))
        }
        Attachment::GunMount(i) => {
            let gun = tank.guns.get(usize::from(i))?;
            let mut m = gun_mount_rotation(gun);
            if gun.mount == GunMountPoint::Hull {
                m *= Mat4::rotation_y(-gun.traverse);
            }
            m *= Mat4::translation(&-gun.pivot);
            Some(m * tank_chain(tank, gun.mount.attachment())?)
        }
        Attachment::Gun(i) => {
            let gun = tank.guns.get(usize::from(i))?;
            Some(Mat4::translation(&Vec3::new(0.0, 0.0, gun.recoil)) * tank_chain(tank, Attachment::GunMount(i))?)
        }
    }
}

fn emplacement_chain(gun: &Gun, attachment: Attachment) -> Option<Mat4> {
    let mount = || {
        Mat4::translation(&Vec3::new(0.0, 0.0, 0.5 * gun.recoil))
            * gun_mount_rotation(gun)
            * Mat4::rotation_y(-gun.traverse)
            * Mat4::translation(&-gun.pivot)
    };
    match attachment {
        Attachment::World | Attachment::Hull => Some(Mat4::identity()),
        Attachment::GunMount(0) => Some(mount()),
        Attachment::Gun(0) => Some(Mat4::translation(&Vec3::new(0.0, 0.0, gun.recoil)) * mount()),
        Attachment::Turret(_) | Attachment::GunMount(_) | Attachment::Gun(_) => None,
    }
}

/// World-to-attachment matrix of `target`.
///
/// Returns `None` when the attachment does not exist on the target.
pub fn world_to_attachment(target: &SimObject, attachment: Attachment) -> Option<Mat4> {
    if attachment == Attachment::World {
        return Some(Mat4::identity());
    }
    let hull = target.pose.inverse_matrix();
    let chain = match &target.kind {
        ObjectKind::Tank(tank) => tank_chain(tank, attachment),
        ObjectKind::AntiTankGun(emplacement) => emplacement_chain(&emplacement.gun, attachment),
        ObjectKind::Vehicle(_) | ObjectKind::Static | ObjectKind::Projectile(_) => Some(Mat4::identity()),
    };
    match chain {
        Some(chain) => Some(chain * hull),
        None => {
            log::warn!("Object '{}' has no {:?} attachment", target.model, attachment);
            None
        }
    }
}

/// Striker-local to target-attachment matrix
pub fn build_local_transform(striker: &SimObject, target: &SimObject, attachment: Attachment) -> Option<Mat4> {
    Some(world_to_attachment(target, attachment)? * striker.pose.to_matrix())
}

/// Attachment-to-world matrix of `target`
pub fn attachment_to_world(target: &SimObject, attachment: Attachment) -> Option<Mat4> {
    world_to_attachment(target, attachment)?.try_inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Pose;
    use crate::physics::collision::ModelId;
    use crate::world::{GunEmplacement, Turret};
    use approx::assert_relative_eq;

    fn tank_at(pose: Pose) -> SimObject {
        let tank = TankState {
            turrets: vec![Turret { rotation: constants::HALF_PI, pivot: Vec3::new(0.0, 1.5, 0.2) }],
            guns: vec![
                Gun {
                    elevation: constants::HALF_PI - 0.1,
                    recoil: -0.3,
                    pivot: Vec3::new(0.0, 1.8, 1.2),
                    mount: GunMountPoint::Turret(0),
                    ..Default::default()
                },
                Gun {
                    traverse: 0.2,
                    pivot: Vec3::new(0.4, 1.0, 2.5),
                    mount: GunMountPoint::Hull,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        SimObject::new("PzIVH", ModelId(0), pose, 4.0, ObjectKind::Tank(tank))
    }

    #[test]
    fn test_hull_transform_maps_striker_origin() {
        let target = tank_at(Pose::new(Vec3::new(10.0, 0.0, 5.0), constants::HALF_PI));
        let striker = SimObject::new(
            "shell",
            ModelId(1),
            Pose::new(Vec3::new(10.0, 1.0, -5.0), 0.0),
            0.1,
            ObjectKind::Static,
        );
        let m = build_local_transform(&striker, &target, Attachment::Hull).unwrap();
        // Striker sits 10 units behind in world -Z; target faces +X so that is local +X
        assert_relative_eq!(m.apply_point(&Vec3::zeros()), Vec3::new(10.0, 1.0, 0.0), epsilon = 1e-4);
        // Striker forward (+Z) is target-local -X
        assert_relative_eq!(m.apply_vector(&Vec3::new(0.0, 0.0, 1.0)), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_world_attachment_is_striker_only() {
        let target = tank_at(Pose::new(Vec3::new(3.0, 0.0, 0.0), 1.0));
        let striker = SimObject::new("shell", ModelId(1), Pose::new(Vec3::new(1.0, 2.0, 3.0), 0.5), 0.1, ObjectKind::Static);
        let m = build_local_transform(&striker, &target, Attachment::World).unwrap();
        assert_relative_eq!(m, striker.pose.to_matrix(), epsilon = 1e-6);
    }

    #[test]
    fn test_turret_and_gun_chain() {
        let target = tank_at(Pose::default());
        let turret = world_to_attachment(&target, Attachment::Turret(0)).unwrap();
        let expected = Mat4::rotation_y(-constants::HALF_PI) * Mat4::translation(&-Vec3::new(0.0, 1.5, 0.2));
        assert_relative_eq!(turret, expected, epsilon = 1e-6);

        let mount = world_to_attachment(&target, Attachment::GunMount(0)).unwrap();
        let expected_mount = Mat4::rotation_x(0.1) * Mat4::translation(&-Vec3::new(0.0, 1.8, 1.2)) * expected;
        assert_relative_eq!(mount, expected_mount, epsilon = 1e-6);

        let gun = world_to_attachment(&target, Attachment::Gun(0)).unwrap();
        assert_relative_eq!(gun, Mat4::translation(&Vec3::new(0.0, 0.0, -0.3)) * expected_mount, epsilon = 1e-6);
    }

    #[test]
    fn test_hull_mounted_gun_traverses() {
        let target = tank_at(Pose::default());
        let mount = world_to_attachment(&target, Attachment::GunMount(1)).unwrap();
        let expected = Mat4::rotation_y(-0.2) * Mat4::translation(&-Vec3::new(0.4, 1.0, 2.5));
        assert_relative_eq!(mount, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_emplacement_mount_includes_half_recoil() {
        let gun = Gun { recoil: 0.4, traverse: 0.3, pivot: Vec3::new(0.0, 0.8, 0.0), ..Default::default() };
        let target = SimObject::new(
            "PaK40",
            ModelId(2),
            Pose::default(),
            2.0,
            ObjectKind::AntiTankGun(GunEmplacement { gun, ..Default::default() }),
        );
        let mount = world_to_attachment(&target, Attachment::GunMount(0)).unwrap();
        let expected = Mat4::translation(&Vec3::new(0.0, 0.0, 0.2))
            * Mat4::rotation_y(-0.3)
            * Mat4::translation(&-Vec3::new(0.0, 0.8, 0.0));
        assert_relative_eq!(mount, expected, epsilon = 1e-6);
        assert!(world_to_attachment(&target, Attachment::Turret(0)).is_none());
    }

    #[test]
    fn test_attachment_round_trip() {
        let target = tank_at(Pose {
            position: Vec3::new(-4.0, 0.5, 12.0),
            pitch: 1.5,
            yaw: 0.7,
            roll: 0.02,
        });
        for attachment in [Attachment::Hull, Attachment::Turret(0), Attachment::GunMount(0), Attachment::Gun(1)] {
            let to_local = world_to_attachment(&target, attachment).unwrap();
            let to_world = attachment_to_world(&target, attachment).unwrap();
            let p = Vec3::new(1.0, 2.0, 3.0);
            assert_relative_eq!(to_world.apply_point(&to_local.apply_point(&p)), p, epsilon = 1e-4);
        }
        assert!(world_to_attachment(&target, Attachment::Gun(5)).is_none());
    }
}
