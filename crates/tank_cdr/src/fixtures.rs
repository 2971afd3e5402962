//! Shared test scenery: a one-turret tank, an anti-tank gun, a wall and a shell

use crate::assets::ModelDatabase;
use crate::foundation::math::{constants, Pose, Vec3};
use crate::physics::attachment::Attachment;
use crate::physics::ballistics::AmmoType;
use crate::physics::collision::{CollisionMesh, ModelId, ModelLibrary, ModelMeshes};
use crate::world::{
    CrewMember, Gun, GunEmplacement, GunMountPoint, ObjectKind, ProjectileState, SimObject, TankState, Turret,
};

pub const TANK: &str = "TestTank";
pub const WALL: &str = "Wall";
pub const AT_GUN: &str = "AtGun";
pub const SHELL: &str = "TestShell";

fn cuboid(name: &str, min: [f32; 3], max: [f32; 3]) -> CollisionMesh {
    CollisionMesh::cuboid(name, Vec3::from(min), Vec3::from(max))
}

pub fn library() -> ModelLibrary {
    let mut library = ModelLibrary::new();
    library.register(
        ModelMeshes::new(TANK)
            .with_mesh(cuboid("FR_UP_HULL", [-1.5, 1.0, 2.9], [1.5, 1.6, 3.0]))
            .with_mesh(cuboid("FR_LW_HULL", [-1.5, 0.4, 2.9], [1.5, 1.0, 3.0]))
            .with_mesh(cuboid("RR_UP_HULL", [-1.5, 1.0, -3.0], [1.5, 1.6, -2.9]))
            .with_mesh(cuboid("RR_LW_HULL", [-1.5, 0.4, -3.0], [1.5, 1.0, -2.9]))
            .with_mesh(cuboid("LF_UP_HULL", [1.4, 1.0, -2.9], [1.5, 1.6, 2.9]))
            .with_mesh(cuboid("LF_LW_HULL", [1.4, 0.4, -2.9], [1.5, 1.0, 2.9]))
            .with_mesh(cuboid("RG_UP_HULL", [-1.5, 1.0, -2.9], [-1.4, 1.6, 2.9]))
            .with_mesh(cuboid("RG_LW_HULL", [-1.5, 0.4, -2.9], [-1.4, 1.0, 2.9]))
            .with_mesh(cuboid("TP_HULL", [-1.4, 1.5, -2.9], [1.4, 1.6, 2.9]))
            .with_mesh(cuboid("EXT_ENGINE", [-1.0, 0.5, -2.8], [1.0, 1.4, -1.5]))
            .with_mesh(cuboid("FR_TURRET1", [-1.0, 0.0, 1.1], [1.0, 0.8, 1.2]))
            .with_mesh(cuboid("RR_TURRET1", [-1.0, 0.0, -1.2], [1.0, 0.8, -1.1]))
            .with_mesh(cuboid("LF_TURRET1", [1.1, 0.0, -1.1], [1.2, 0.8, 1.1]))
            .with_mesh(cuboid("RG_TURRET1", [-1.2, 0.0, -1.1], [-1.1, 0.8, 1.1]))
            .with_mesh(cuboid("TP_TURRET1", [-1.1, 0.7, -1.1], [1.1, 0.8, 1.1]))
            .with_mesh(cuboid("CUPOLA", [0.3, 0.8, -0.6], [0.7, 1.1, -0.2]))
            .with_mesh(cuboid("GUN_MANT1", [-0.4, -0.3, 0.0], [0.4, 0.3, 0.15]))
            .with_mesh(cuboid("GUN1", [-0.08, -0.08, 0.15], [0.08, 0.08, 3.5])),
    );
    library.register(
        ModelMeshes::new(WALL)
            .with_mesh(cuboid("FAR_WALL", [-3.0, 0.0, 5.0], [3.0, 3.0, 6.0]))
            .with_mesh(cuboid("NEAR_WALL", [-3.0, 0.0, -1.0], [3.0, 3.0, 0.0])),
    );
    library.register(
        ModelMeshes::new(AT_GUN)
            .with_mesh(cuboid("WHEEL_L1", [0.9, 0.0, -0.4], [1.1, 0.8, 0.4]))
            .with_mesh(cuboid("WHEEL_R1", [-1.1, 0.0, -0.4], [-0.9, 0.8, 0.4]))
            .with_mesh(cuboid("GUN_SHIELD", [-1.0, 0.3, 0.5], [1.0, 1.5, 0.55]))
            .with_mesh(cuboid("HULL", [-0.3, 0.2, -2.0], [0.3, 0.6, 0.5]))
            .with_mesh(cuboid("GUN_MANT1", [-0.2, -0.2, -0.1], [0.2, 0.2, 0.1]))
            .with_mesh(cuboid("GUN1", [-0.06, -0.06, 0.0], [0.06, 0.06, 2.5]))
            .with_mesh(cuboid("EXT_CREW", [-1.0, 0.0, -1.5], [1.0, 1.4, -0.5])),
    );
    library.register(ModelMeshes::new(SHELL));
    library
}

pub fn database() -> ModelDatabase {
    let mut db = ModelDatabase::new()
        .with(TANK, "TAG", "VEHC")
        .with(TANK, "CDH_UP_HULL", "1.0")
        .with(TANK, "CDH_TURRET", "1.6")
        .with(WALL, "TAG", "BLDG")
        .with(AT_GUN, "TAG", "VEHC")
        .with(SHELL, "PEN_RHA_AT_PB", "120")
        .with(SHELL, "PEN_RHA_CURVE", "0.9995")
        .with(SHELL, "VELOCITY", "750")
        .with(SHELL, "WEIGHT", "6.8");

    let tank_armor = [
        ("FR_UP_HULL", "80", "RHA"),
        ("FR_LW_HULL", "50", "RHA"),
        ("RR_UP_HULL", "20", "RHA"),
        ("RR_LW_HULL", "20", "RHA"),
        ("LF_UP_HULL", "30", "RHA"),
        ("LF_LW_HULL", "30", "RHA"),
        ("RG_UP_HULL", "30", "RHA"),
        ("RG_LW_HULL", "30", "RHA"),
        ("TP_HULL", "12", "RHA"),
        ("FR_TURRET1", "50", "CAST"),
        ("RR_TURRET1", "30", "RHA"),
        ("LF_TURRET1", "30", "RHA"),
        ("RG_TURRET1", "30", "RHA"),
        ("TP_TURRET1", "10", "RHA"),
        ("CUPOLA", "80", "cast"),
        ("GUN_MANT1", "50+30", "RHA"),
        ("GUN1", "15", "RHA"),
    ];
    for (slab, thickness, kind) in tank_armor {
        db.insert(TANK, format!("ARTHCK_{slab}"), thickness);
        db.insert(TANK, format!("ARTYPE_{slab}"), kind);
    }
    for (slab, thickness) in [("GUN_SHIELD", "10"), ("HULL", "8"), ("WHEEL_L1", "5"), ("WHEEL_R1", "5")] {
        db.insert(AT_GUN, format!("ARTHCK_{slab}"), thickness);
        db.insert(AT_GUN, format!("ARTYPE_{slab}"), "RHA");
    }
    db
}

fn model(library: &ModelLibrary, name: &str) -> ModelId {
    library.model_id(name).unwrap()
}

pub fn tank_state() -> TankState {
    TankState {
        turrets: vec![Turret { rotation: 0.0, pivot: Vec3::new(0.0, 1.6, 0.0) }],
        guns: vec![Gun {
            elevation: constants::HALF_PI,
            pivot: Vec3::new(0.0, 0.4, 1.2),
            mount: GunMountPoint::Turret(0),
            ..Default::default()
        }],
        cupola: Some(Attachment::Turret(0)),
        motor_position: Vec3::new(0.0, 1.0, -2.0),
        crew: vec![
            CrewMember { position: Vec3::new(0.6, 1.1, 2.2), attachment: Attachment::Hull },
            CrewMember { position: Vec3::new(0.0, 0.6, -0.4), attachment: Attachment::Turret(0) },
        ],
        ..Default::default()
    }
}

pub fn tank(library: &ModelLibrary, pose: Pose) -> SimObject {
    SimObject::new(TANK, model(library, TANK), pose, 3.5, ObjectKind::Tank(tank_state()))
}

pub fn wall(library: &ModelLibrary, pose: Pose) -> SimObject {
    SimObject::new(WALL, model(library, WALL), pose, 4.5, ObjectKind::Static)
}

pub fn anti_tank_gun(library: &ModelLibrary, pose: Pose) -> SimObject {
    let emplacement = GunEmplacement {
        gun: Gun { pivot: Vec3::new(0.0, 0.9, 0.3), ..Default::default() },
        crew: vec![
            CrewMember { position: Vec3::new(-0.5, 0.0, -1.0), attachment: Attachment::Hull },
            CrewMember { position: Vec3::new(0.5, 0.0, -1.2), attachment: Attachment::Hull },
        ],
        ext_crew: true,
        ext_ammo: false,
    };
    SimObject::new(AT_GUN, model(library, AT_GUN), pose, 2.5, ObjectKind::AntiTankGun(emplacement))
}

pub fn shell(pose: Pose, ammo: AmmoType, diameter: f32, velocity: f32) -> SimObject {
    SimObject::new(
        SHELL,
        ModelId(3),
        pose,
        0.1,
        ObjectKind::Projectile(ProjectileState::new(ammo, diameter, velocity)),
    )
}
