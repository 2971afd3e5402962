//! Narrow-phase ray tests against collision meshes
//!
//! [`test_bounding_box`] and [`test_polygons`] are pure functions over a
//! single mesh. [`HitSearch`] keeps the running best candidate while the
//! hit-location heuristic offers meshes one at a time.

use bitflags::bitflags;

use crate::foundation::math::{constants, Vec3, FP_ERROR};
use crate::physics::attachment::Attachment;

use super::mesh::{CollisionMesh, MeshId, MeshLibrary, ModelId};
use super::primitives::Ray;

/// Initial "no hit yet" ray parameter
pub const CD_T_START: f32 = 12345.0;

bitflags! {
    /// Situational flags collected while searching a target
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DetectionModifiers: u32 {
        /// Ray crosses the exposed crew box
        const EXT_CREW = 0x1;
        /// Ray crosses the exposed ammunition box
        const EXT_AMMO = 0x2;
        /// Ray crosses the engine box
        const EXT_ENGINE = 0x4;
        /// Ray crosses the fuel box
        const EXT_FUEL = 0x8;
        /// Hull front approach tested
        const HULL_FRONT = 0x10;
        /// Hull left approach tested
        const HULL_LEFT = 0x20;
        /// Hull right approach tested
        const HULL_RIGHT = 0x40;
        /// Hull rear approach tested
        const HULL_REAR = 0x80;
        /// Turret front approach tested
        const TURRET_FRONT = 0x100;
        /// Turret left approach tested
        const TURRET_LEFT = 0x200;
        /// Turret right approach tested
        const TURRET_RIGHT = 0x400;
        /// Turret rear approach tested
        const TURRET_REAR = 0x800;
    }
}

/// Best polygon hit on a single mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonHit {
    /// Ray parameter
    pub t: f32,
    /// Index of the struck triangle
    pub triangle: usize,
    /// Intersection point in the mesh frame
    pub point: Vec3,
    /// Normal of the struck triangle
    pub normal: Vec3,
    /// Angle from the surface normal, in [0, PI/2]
    pub impact_angle: f32,
    /// Mirror reflection of the ray direction
    pub reflection: Vec3,
}

/// A narrow-phase hit on a target
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionDetectionResult {
    /// Ray in the attachment frame
    pub ray: Ray,
    /// Struck model
    pub model: ModelId,
    /// Struck mesh
    pub mesh: MeshId,
    /// Struck mesh name (the armor slab)
    pub mesh_name: String,
    /// Attachment frame the mesh lives in
    pub attachment: Attachment,
    /// Flags gathered during the search
    pub modifiers: DetectionModifiers,
    /// Ray parameter of the hit
    pub t: f32,
    /// Impact point in the attachment frame
    pub impact_point: Vec3,
    /// Impact point in world space at detection time
    pub world_point: Vec3,
    /// Angle between the ray and the surface normal, in [0, PI/2]
    pub impact_angle: f32,
    /// Reflection direction in the attachment frame
    pub reflection: Vec3,
}

/// Ray versus the mesh's bounding box, restricted to `(t_min, t_max)`
pub fn test_bounding_box(ray: &Ray, mesh: &CollisionMesh, t_min: f32, t_max: f32) -> bool {
    mesh.bounds.intersects_ray(ray, t_min, t_max)
}

/// Ray versus every triangle of the mesh, keeping the nearest inside hit
pub fn test_polygons(ray: &Ray, mesh: &CollisionMesh, t_min: f32, t_max: f32) -> Option<PolygonHit> {
    let mut best_t = CD_T_START;
    let mut best: Option<(usize, Vec3)> = None;

    for (index, triangle) in mesh.triangles.iter().enumerate() {
        let Some(t) = triangle.plane_intersection(ray) else {
            continue;
        };
        if !(t < best_t && t > t_min && t < t_max) {
            continue;
        }
        let point = ray.point_at(t);
        if triangle.contains_point(&point) {
            best_t = t;
            best = Some((index, point));
        }
    }

    let (index, point) = best?;
    let normal = mesh.triangles[index].normal;
    let cos = normal.dot(&ray.direction).clamp(-1.0, 1.0);

    let mut impact_angle = (constants::PI - cos.acos().abs()).abs();
    if impact_angle > constants::HALF_PI {
        impact_angle = constants::PI - impact_angle;
    }
    if !impact_angle.is_finite() || impact_angle > constants::HALF_PI {
        log::debug!(
            "Discarding hit on '{}' triangle {}: impact angle {} out of range",
            mesh.name, index, impact_angle
        );
        return None;
    }

    Some(PolygonHit {
        t: best_t,
        triangle: index,
        point,
        normal,
        impact_angle,
        reflection: ray.direction - normal * (2.0 * ray.direction.dot(&normal)),
    })
}

/// Running best-candidate search over the meshes of one target model
pub struct HitSearch<'a, L: MeshLibrary + ?Sized> {
    library: &'a L,
    model: ModelId,
    exclude: Option<MeshId>,
    best: Option<CollisionDetectionResult>,
    modifiers: DetectionModifiers,
}

impl<'a, L: MeshLibrary + ?Sized> HitSearch<'a, L> {
    /// Start a search on `model`, never testing `exclude`
    pub fn new(library: &'a L, model: ModelId, exclude: Option<MeshId>) -> Self {
        Self {
            library,
            model,
            exclude,
            best: None,
            modifiers: DetectionModifiers::empty(),
        }
    }

    /// Ray parameter of the current best hit, or [`CD_T_START`]
    pub fn best_t(&self) -> f32 {
        self.best.as_ref().map_or(CD_T_START, |b| b.t)
    }

    /// Current best hit
    pub fn best(&self) -> Option<&CollisionDetectionResult> {
        self.best.as_ref()
    }

    /// Flags collected so far
    pub fn modifiers(&self) -> DetectionModifiers {
        self.modifiers
    }

    /// Record a flag
    pub fn mark(&mut self, flag: DetectionModifiers) {
        self.modifiers |= flag;
    }

    fn resolve(&self, name: &str) -> Option<MeshId> {
        self.library
            .mesh_id(self.model, name)
            .filter(|id| Some(*id) != self.exclude)
    }

    /// Box then polygon test of one mesh.
    ///
    /// Returns `true` when the mesh produced a strictly nearer hit, which
    /// then replaces the previous best.
    pub fn test_mesh(&mut self, ray: &Ray, mesh_id: MeshId, attachment: Attachment) -> bool {
        if Some(mesh_id) == self.exclude {
            return false;
        }
        let Some(mesh) = self.library.mesh(self.model, mesh_id) else {
            return false;
        };
        let t_max = self.best_t();
        if !test_bounding_box(ray, mesh, FP_ERROR, t_max) {
            return false;
        }
        let Some(hit) = test_polygons(ray, mesh, FP_ERROR, t_max) else {
            return false;
        };
        if hit.t >= t_max {
            return false;
        }

        log::trace!("Hit '{}' at t = {:.4} ({:?})", mesh.name, hit.t, attachment);
        self.best = Some(CollisionDetectionResult {
            ray: *ray,
            model: self.model,
            mesh: mesh_id,
            mesh_name: mesh.name.clone(),
            attachment,
            modifiers: DetectionModifiers::empty(),
            t: hit.t,
            impact_point: hit.point,
            world_point: hit.point,
            impact_angle: hit.impact_angle,
            reflection: hit.reflection,
        });
        true
    }

    /// [`HitSearch::test_mesh`] by mesh name; absent meshes report no hit
    pub fn test_named(&mut self, ray: &Ray, name: &str, attachment: Attachment) -> bool {
        match self.resolve(name) {
            Some(id) => self.test_mesh(ray, id, attachment),
            None => false,
        }
    }

    /// Test every named mesh, returning how many improved the best hit
    pub fn test_each(&mut self, ray: &Ray, names: &[&str], attachment: Attachment) -> usize {
        names
            .iter()
            .filter(|name| self.test_named(ray, name, attachment))
            .count()
    }

    /// Bounding-box-only test that raises `flag` without touching the best hit
    pub fn flag_box(&mut self, ray: &Ray, name: &str, t_max: f32, flag: DetectionModifiers) {
        let Some(id) = self.resolve(name) else {
            return;
        };
        if let Some(mesh) = self.library.mesh(self.model, id) {
            if test_bounding_box(ray, mesh, FP_ERROR, t_max) {
                self.modifiers |= flag;
            }
        }
    }

    /// Finish the search, attaching the collected flags to the best hit
    pub fn finish(self) -> Option<CollisionDetectionResult> {
        let modifiers = self.modifiers;
        self.best.map(|mut best| {
            best.modifiers = modifiers;
            best
        })
    }
}
