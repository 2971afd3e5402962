//! Firing range demo
//!
//! Places a Panzer IV, a Pak 40 and a farmhouse, fires a handful of rounds
//! at them and logs what the collision module decides. Pass a `.toml` or
//! `.ron` collision config as the first argument to override the defaults.

use rand::Rng;
use tank_cdr::foundation::logging;
use tank_cdr::physics::Attachment;
use tank_cdr::prelude::*;
use tank_cdr::world::{CrewMember, Gun, GunEmplacement, GunMountPoint, Turret};

type Module = CollisionModule<ModelLibrary, ModelDatabase>;

const GEOMETRY: &str = include_str!("../data/range_geometry.ron");
const MODELS: &str = include_str!("../data/range_models.ron");

const DT: f32 = 1.0 / 60.0;
const MAX_TICKS: u32 = 240;

/// One round to fire
struct Shot {
    label: &'static str,
    origin: Vec3,
    aim: Vec3,
    ammo: AmmoType,
    diameter: f32,
    tracer: bool,
}

struct FiringRange {
    cdr: Module,
    world: ObjectStore,
    targets: Vec<ObjectId>,
    shells: Vec<ObjectId>,
}

impl FiringRange {
    fn new(config: CdrConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let meshes = GeometrySet::from_str_with_format(GEOMETRY, "range_geometry.ron")?.build_library();
        let attributes = ModelDatabase::from_str_with_format(MODELS, "range_models.ron")?;
        log::info!("Loaded {} models with attributes", attributes.model_count());

        let cdr = CollisionModule::new(config, meshes, attributes)?;
        let mut range = Self {
            cdr,
            world: ObjectStore::new(),
            targets: Vec::new(),
            shells: Vec::new(),
        };
        range.place_targets()?;
        Ok(range)
    }

    fn model(&self, name: &str) -> Result<tank_cdr::physics::collision::ModelId, Box<dyn std::error::Error>> {
        Ok(self.cdr.meshes().model_id(name).ok_or(format!("model '{name}' is not loaded"))?)
    }

    fn place_targets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let panzer = TankState {
            turrets: vec![Turret { rotation: 0.3, pivot: Vec3::new(0.0, 1.7, 0.2) }],
            guns: vec![Gun {
                elevation: 1.52,
                pivot: Vec3::new(0.0, 0.4, 1.1),
                mount: GunMountPoint::Turret(0),
                ..Default::default()
            }],
            cupola: Some(Attachment::Turret(0)),
            motor_position: Vec3::new(0.0, 1.0, -2.0),
            crew: vec![
                CrewMember { position: Vec3::new(0.6, 1.1, 2.0), attachment: Attachment::Hull },
                CrewMember { position: Vec3::new(-0.6, 1.1, 2.0), attachment: Attachment::Hull },
                CrewMember { position: Vec3::new(0.0, 0.5, -0.6), attachment: Attachment::Turret(0) },
                CrewMember { position: Vec3::new(0.5, 0.5, 0.2), attachment: Attachment::Turret(0) },
                CrewMember { position: Vec3::new(-0.5, 0.5, 0.2), attachment: Attachment::Turret(0) },
            ],
            ..Default::default()
        };
        let tank = SimObject::new(
            "PzIVH",
            self.model("PzIVH")?,
            Pose::new(Vec3::zeros(), 0.5),
            3.5,
            ObjectKind::Tank(panzer),
        );

        let pak = GunEmplacement {
            gun: Gun { pivot: Vec3::new(0.0, 0.9, 0.3), ..Default::default() },
            crew: vec![
                CrewMember { position: Vec3::new(-0.5, 0.0, -1.0), attachment: Attachment::Hull },
                CrewMember { position: Vec3::new(0.5, 0.0, -1.2), attachment: Attachment::Hull },
            ],
            ext_crew: true,
            ext_ammo: false,
        };
        let gun = SimObject::new(
            "Pak40",
            self.model("Pak40")?,
            Pose::new(Vec3::new(-15.0, 0.0, 10.0), 3.0),
            2.5,
            ObjectKind::AntiTankGun(pak),
        );
        let house = SimObject::new(
            "Farmhouse",
            self.model("Farmhouse")?,
            Pose::new(Vec3::new(12.0, 0.0, -8.0), 0.0),
            5.0,
            ObjectKind::Static,
        );

        for object in [tank, gun, house] {
            let id = self.world.insert(object);
            self.targets.push(id);
        }
        Ok(())
    }

    fn fire(&mut self, shot: &Shot, target: ObjectId) -> Result<(), Box<dyn std::error::Error>> {
        let direction = (shot.aim - shot.origin).normalize();
        let mut state = ProjectileState::new(shot.ammo, shot.diameter, 0.0);
        if shot.tracer {
            state.modifiers |= AmmoModifiers::RED_TRACER;
        }
        state.velocity = self
            .cdr
            .attributes()
            .query("Shell", "VELOCITY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(750.0);
        if shot.ammo == AmmoType::He {
            state.explosive = 0.68;
        }

        let shell = SimObject::new(
            "Shell",
            self.model("Shell")?,
            Pose::facing(shot.origin, &direction),
            0.1,
            ObjectKind::Projectile(state),
        );
        let shell = self.world.insert(shell);
        self.shells.push(shell);
        log::info!("Firing {}", shot.label);

        match self.cdr.detect_and_schedule(&self.world, shell, target, 0.0, None) {
            Some(Scheduled::Resolved(Some(intent))) => self.apply(&intent),
            Some(Scheduled::Resolved(None)) => log::warn!("{}: hit had no response", shot.label),
            Some(Scheduled::Deferred(_)) => {}
            None => log::info!("{}: clean miss", shot.label),
        }
        Ok(())
    }

    fn apply(&mut self, intent: &ResponseIntent) {
        report(intent, 0);
        if let Some(shell) = self.world.get_mut(intent.striker) {
            if let ObjectKind::Projectile(state) = &mut shell.kind {
                match intent.projectile {
                    ProjectileCommand::Ricochet { position, direction, velocity, distance_offset, .. } => {
                        shell.pose = Pose::facing(position, &direction);
                        state.velocity = velocity;
                        state.distance_offset += distance_offset;
                    }
                    ProjectileCommand::Kill { .. } => state.alive = false,
                }
            }
        }

        if let Some(rebuild) = intent.rebuild_test_list {
            let others: Vec<ObjectId> = self.targets.iter().copied().filter(|t| *t != rebuild.exclude).collect();
            for other in others {
                if let Some(Scheduled::Resolved(Some(next))) =
                    self.cdr.detect_and_schedule(&self.world, intent.striker, other, 0.0, None)
                {
                    self.apply(&next);
                }
            }
        }
    }

    fn advance(&mut self, dt: f32) {
        let multiplier = self.cdr.config().velocity_multiplier;
        for id in &self.shells {
            let Some(shell) = self.world.get_mut(*id) else {
                continue;
            };
            let forward = shell.pose.forward();
            if let ObjectKind::Projectile(state) = &mut shell.kind {
                if state.alive {
                    shell.pose.position += forward * state.velocity * multiplier * dt;
                    state.travel_distance += state.velocity * dt;
                }
            }
        }

        // spent shells go once nothing still refers to them
        let (world, cdr) = (&mut self.world, &self.cdr);
        self.shells.retain(|id| {
            let spent = world.object(*id).and_then(SimObject::projectile).map_or(true, |p| !p.alive);
            if spent && cdr.can_release(*id) {
                world.remove(*id);
                return false;
            }
            true
        });
    }

    fn run(&mut self) {
        for tick in 0..MAX_TICKS {
            let intents = self.cdr.tick(&self.world, DT);
            for intent in &intents {
                self.apply(intent);
            }
            self.advance(DT);
            if self.shells.is_empty() {
                log::info!("Range clear after {} ticks ({:.2}s)", tick + 1, self.cdr.sim_time());
                return;
            }
        }
        log::info!("{} shell(s) still downrange", self.shells.len());
    }

    fn bump(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(&tank) = self.targets.first() else {
            return Ok(());
        };
        let truck = SimObject::new(
            "Opel",
            self.model("Farmhouse")?,
            Pose::new(Vec3::new(0.0, 0.0, 6.0), 3.0),
            2.0,
            ObjectKind::Vehicle(Mobility {
                path: vec![Waypoint::new(Vec3::new(0.0, 0.0, -40.0), Default::default())],
                throttle: 0.6,
                output_speed: 9.0,
                linear_velocity: Vec3::new(0.0, 0.0, -4.0),
            }),
        );
        let truck = self.world.insert(truck);

        if let Some(intent) = self.cdr.resolve_immediate(&self.world, truck, tank) {
            for adjustment in &intent.adjustments {
                if let Some(unit) = self.world.get_mut(adjustment.unit) {
                    let cancelled = adjustment.apply(unit);
                    log::info!(
                        "{} stops, {} detour waypoint(s), cancelled job {:?}",
                        unit.model,
                        adjustment.detour.len(),
                        cancelled
                    );
                }
            }
        }
        Ok(())
    }
}

fn report(intent: &ResponseIntent, depth: usize) {
    let indent = "  ".repeat(depth);
    log::info!(
        "{}{} [{:.1} deg]: {:?}, P/R {:.3}",
        indent,
        intent.slab,
        intent.response.impact_angle,
        intent.response.modifiers,
        intent.response.pr_ratio
    );
    if let Some(motor) = intent.motor_damage {
        log::info!("{indent}  engine damage {motor:.3}");
    }
    for (crewman, amount) in &intent.crew_damage {
        log::info!("{indent}  crewman {crewman} wounded {amount:.3}");
    }
    for effect in &intent.effects {
        log::debug!("{indent}  effect {:?} x{:.1}", effect.kind, effect.amount);
    }
    for sound in &intent.sounds {
        log::debug!("{indent}  sound {:?}", sound.kind);
    }
    for chained in &intent.chained {
        report(chained, depth + 1);
    }
}

fn volley(rng: &mut impl Rng) -> Vec<(Shot, usize)> {
    let mut jitter = |v: Vec3| v + Vec3::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), 0.0);
    vec![
        (
            Shot {
                label: "75mm APCBC at the glacis",
                origin: Vec3::new(15.0, 1.4, 40.0),
                aim: jitter(Vec3::new(1.3, 1.3, 2.6)),
                ammo: AmmoType::Apcbc,
                diameter: 7.5,
                tracer: true,
            },
            0,
        ),
        (
            Shot {
                label: "75mm APCBC at the turret side",
                origin: Vec3::new(40.0, 2.2, 5.0),
                aim: jitter(Vec3::new(0.3, 2.1, 0.4)),
                ammo: AmmoType::Apcbc,
                diameter: 7.5,
                tracer: false,
            },
            0,
        ),
        (
            Shot {
                label: "37mm AP skimming the deck",
                origin: Vec3::new(2.0, 6.0, 25.0),
                aim: Vec3::new(0.8, 1.7, 2.0),
                ammo: AmmoType::Ap,
                diameter: 3.7,
                tracer: true,
            },
            0,
        ),
        (
            Shot {
                label: "75mm HE at the Pak",
                origin: Vec3::new(-15.0, 1.2, -20.0),
                aim: jitter(Vec3::new(-15.0, 0.9, 10.5)),
                ammo: AmmoType::He,
                diameter: 7.5,
                tracer: false,
            },
            1,
        ),
        (
            Shot {
                label: "7.92mm ball at the farmhouse",
                origin: Vec3::new(12.0, 1.5, 20.0),
                aim: Vec3::new(12.0, 1.5, -8.0),
                ammo: AmmoType::Ap,
                diameter: 0.792,
                tracer: false,
            },
            2,
        ),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(logging::LevelFilter::Info);

    log::info!("Starting firing range");

    let config = match std::env::args().nth(1) {
        Some(path) => CdrConfig::load_validated(&path)?,
        None => CdrConfig::default().with_seed(1944),
    };
    let mut range = FiringRange::new(config)?;

    let mut rng = rand::thread_rng();
    for (shot, target) in volley(&mut rng) {
        let Some(&target) = range.targets.get(target) else {
            continue;
        };
        range.fire(&shot, target)?;
    }
    range.run();
    range.bump()?;

    log::info!("Firing range finished");
    Ok(())
}
