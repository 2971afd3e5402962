//! Primitive collision shapes and intersection algorithms
//!
//! Provides the ray, axis-aligned box and plane-carrying triangle used by
//! the narrow phase. All shapes live in the local frame of the mesh they
//! belong to.

use crate::foundation::math::{constants, Vec3, FP_ERROR};

/// A ray for narrow-phase testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray from `from` toward `to`
    pub fn between(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box from explicit corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut min = Vec3::repeat(f32::MAX);
        let mut max = Vec3::repeat(f32::MIN);
        let mut any = false;
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
            any = true;
        }
        if any {
            Self { min, max }
        } else {
            Self { min: Vec3::zeros(), max: Vec3::zeros() }
        }
    }

    /// Whether `p` lies inside the box on the two axes other than `skip`
    fn contains_on_plane(&self, p: &Vec3, skip: usize) -> bool {
        (0..3).filter(|&axis| axis != skip).all(|axis| {
            p[axis] >= self.min[axis] - FP_ERROR && p[axis] <= self.max[axis] + FP_ERROR
        })
    }

    /// Face-crossing test.
    ///
    /// Each of the six faces (+Z, +X, +Y, -Z, -X, -Y) is intersected in
    /// turn; the box is hit when any crossing lies strictly inside
    /// `(t_min, t_max)` and within the face's extents.
    pub fn intersects_ray(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        const FACES: [(usize, bool); 6] = [
            (2, true),
            (0, true),
            (1, true),
            (2, false),
            (0, false),
            (1, false),
        ];

        FACES.iter().any(|&(axis, positive)| {
            let dir = ray.direction[axis];
            if dir.abs() <= FP_ERROR {
                return false;
            }
            let plane = if positive { self.max[axis] } else { self.min[axis] };
            let t = (plane - ray.origin[axis]) / dir;
            t > t_min && t < t_max && self.contains_on_plane(&ray.point_at(t), axis)
        })
    }
}

/// A triangle carrying its plane equation `n·p + distance = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Triangle vertices, counter-clockwise seen from the front
    pub vertices: [Vec3; 3],
    /// Unit plane normal (right-hand rule)
    pub normal: Vec3,
    /// Signed plane distance
    pub distance: f32,
}

impl Triangle {
    /// Creates a new triangle, precomputing its plane
    ///
    /// Degenerate triangles keep a zero normal and are never hit.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let cross = (v1 - v0).cross(&(v2 - v0));
        let normal = cross.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
        Self {
            vertices: [v0, v1, v2],
            normal,
            distance: -normal.dot(&v0),
        }
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    /// Ray parameter where the ray meets this triangle's plane.
    ///
    /// Returns `None` when the ray is parallel to the plane within
    /// `FP_ERROR`.
    pub fn plane_intersection(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(&ray.direction);
        if denom.abs() <= FP_ERROR {
            return None;
        }
        Some(-(self.normal.dot(&ray.origin) + self.distance) / denom)
    }

    /// Sum of the angles subtended at `p` by the three edges.
    ///
    /// Equals 2π for points inside the triangle (in its plane) and less
    /// for points outside. `None` when `p` coincides with a vertex.
    pub fn subtended_angle_sum(&self, p: &Vec3) -> Option<f64> {
        let mut units = [nalgebra::Vector3::<f64>::zeros(); 3];
        for (unit, vertex) in units.iter_mut().zip(self.vertices.iter()) {
            let v = (vertex - p).cast::<f64>();
            let len = v.norm();
            if len <= f64::from(FP_ERROR) * 0.01 {
                return None;
            }
            *unit = v / len;
        }
        Some(
            (0..3)
                .map(|i| units[i].dot(&units[(i + 1) % 3]).clamp(-1.0, 1.0).acos())
                .sum(),
        )
    }

    /// Angle-sum point-in-triangle classification
    pub fn contains_point(&self, p: &Vec3) -> bool {
        match self.subtended_angle_sum(p) {
            Some(sum) => (f64::from(constants::TAU) - sum).abs() <= f64::from(FP_ERROR),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Classic slab test used as a reference for the face-crossing test
    fn slab_reference(aabb: &Aabb, ray: &Ray, t_min: f32, t_max: f32) -> Option<(f32, f32)> {
        let mut near = f32::MIN;
        let mut far = f32::MAX;
        for axis in 0..3 {
            let d = ray.direction[axis];
            let o = ray.origin[axis];
            if d.abs() <= 1e-9 {
                if o < aabb.min[axis] || o > aabb.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (aabb.min[axis] - o) / d;
            let t2 = (aabb.max[axis] - o) / d;
            near = near.max(t1.min(t2));
            far = far.min(t1.max(t2));
        }
        if near > far {
            return None;
        }
        let entry_ok = near > t_min && near < t_max;
        let exit_ok = far > t_min && far < t_max;
        (entry_ok || exit_ok).then_some((near, far))
    }

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(ray.direction.magnitude(), 1.0);
        assert_relative_eq!(ray.point_at(2.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_aabb_hit_and_miss() {
        let aabb = unit_box();
        let hit = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersects_ray(&hit, FP_ERROR, 100.0));

        let miss = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.intersects_ray(&miss, FP_ERROR, 100.0));

        // Window ends before the box is reached
        assert!(!aabb.intersects_ray(&hit, FP_ERROR, 3.5));
        // Box entirely behind the origin
        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.intersects_ray(&behind, FP_ERROR, 100.0));
    }

    #[test]
    fn test_aabb_agrees_with_slab_reference() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.5, 1.0, 2.0));
        let origins = [
            Vec3::new(-6.0, 0.5, -7.0),
            Vec3::new(4.0, 3.0, 0.0),
            Vec3::new(0.0, -4.0, 5.0),
            Vec3::new(9.0, 0.2, 9.0),
        ];
        let mut checked = 0;
        for origin in origins {
            for i in 0..24 {
                let angle = i as f32 * constants::TAU / 24.0;
                let target = Vec3::new(angle.cos() * 1.2, 0.5 + angle.sin() * 0.8, angle.sin() * 2.5);
                let ray = Ray::between(origin, target);
                let expected = slab_reference(&aabb, &ray, FP_ERROR, 50.0);
                // Skip grazing rays where tolerance decides the answer
                if let Some((near, far)) = expected {
                    if (far - near).abs() < 1e-3 {
                        continue;
                    }
                }
                assert_eq!(
                    aabb.intersects_ray(&ray, FP_ERROR, 50.0),
                    expected.is_some(),
                    "origin {origin:?} target {target:?}"
                );
                checked += 1;
            }
        }
        assert!(checked > 60);
    }

    #[test]
    fn test_triangle_plane() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(tri.normal, Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(tri.distance, 0.0);

        let ray = Ray::new(Vec3::new(0.2, 0.2, 4.0), Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(tri.plane_intersection(&ray).unwrap(), 4.0);

        let parallel = Ray::new(Vec3::new(0.2, 0.2, 4.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(tri.plane_intersection(&parallel).is_none());
    }

    #[test]
    fn test_angle_sum_inside_and_outside() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        );
        for p in [Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.1, 1.7, 0.0), tri.centroid()] {
            assert!(tri.contains_point(&p), "{p:?} should be inside");
        }
        for p in [Vec3::new(1.5, 1.5, 0.0), Vec3::new(-0.1, 0.5, 0.0), Vec3::new(3.0, -1.0, 0.0)] {
            let sum = tri.subtended_angle_sum(&p).unwrap();
            assert!(sum < f64::from(constants::TAU) - 1e-3);
            assert!(!tri.contains_point(&p), "{p:?} should be outside");
        }
        // Vertex itself counts as inside
        assert!(tri.contains_point(&Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_angle_sum_degenerate_triangle() {
        // Sliver with near-zero area
        let sliver = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(2.0, 1e-4, 0.0),
        );
        assert!(sliver.contains_point(&Vec3::new(2.0, 0.00002, 0.0)));
        assert!(!sliver.contains_point(&Vec3::new(2.0, 0.5, 0.0)));
        assert!(!sliver.contains_point(&Vec3::new(5.0, 0.0, 0.0)));
    }
}
