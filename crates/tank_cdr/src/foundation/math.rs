//! Math utilities and types
//!
//! Provides the vector/matrix aliases used by the collision core, the
//! spherical coordinate helpers the hit heuristic works in, and the
//! [`Pose`] type describing an object's placement in the world.

pub use nalgebra::{Matrix4, Point3, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Tolerance used by every geometric and ballistic comparison.
pub const FP_ERROR: f32 = 0.00001;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Wrap an angle into (-PI, PI]
    pub fn wrap_angle(mut angle: f32) -> f32 {
        while angle > constants::PI {
            angle -= constants::TAU;
        }
        while angle <= -constants::PI {
            angle += constants::TAU;
        }
        angle
    }
}

/// Spherical coordinates: `pitch` from +Y, `yaw` from +Z toward +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    /// Distance from the origin
    pub radius: f32,
    /// Angle down from the +Y axis, in [0, PI]
    pub pitch: f32,
    /// Angle around +Y measured from +Z toward +X, in [0, TAU)
    pub yaw: f32,
}

impl Spherical {
    /// Create a new spherical coordinate
    pub fn new(radius: f32, pitch: f32, yaw: f32) -> Self {
        Self { radius, pitch, yaw }
    }

    /// Convert a cartesian vector into spherical form
    pub fn from_cartesian(v: &Vec3) -> Self {
        let radius = v.magnitude();
        if radius <= FP_ERROR {
            return Self::new(0.0, 0.0, 0.0);
        }
        let pitch = utils::clamp(v.y / radius, -1.0, 1.0).acos();
        let mut yaw = v.x.atan2(v.z);
        if yaw < 0.0 {
            yaw += constants::TAU;
        }
        Self { radius, pitch, yaw }
    }

    /// Convert back into a cartesian vector
    pub fn to_cartesian(&self) -> Vec3 {
        let (sin_p, cos_p) = self.pitch.sin_cos();
        let (sin_y, cos_y) = self.yaw.sin_cos();
        Vec3::new(
            self.radius * sin_p * sin_y,
            self.radius * cos_p,
            self.radius * sin_p * cos_y,
        )
    }

    /// Pitch and yaw expressed in degrees
    pub fn degrees(&self) -> (f32, f32) {
        (utils::rad_to_deg(self.pitch), utils::rad_to_deg(self.yaw))
    }
}

/// Unsigned angle between two vectors, in radians.
///
/// Returns 0 when either vector is degenerate.
pub fn angle_between(a: &Vec3, b: &Vec3) -> f32 {
    let denom = a.magnitude() * b.magnitude();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    utils::clamp(a.dot(b) / denom, -1.0, 1.0).acos()
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a translation matrix
    fn translation(offset: &Vec3) -> Mat4;

    /// Transform a position (w = 1)
    fn apply_point(&self, point: &Vec3) -> Vec3;

    /// Transform a direction (w = 0)
    fn apply_vector(&self, vector: &Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn translation(offset: &Vec3) -> Mat4 {
        Mat4::new_translation(offset)
    }

    fn apply_point(&self, point: &Vec3) -> Vec3 {
        self.transform_point(&Point3::from(*point)).coords
    }

    fn apply_vector(&self, vector: &Vec3) -> Vec3 {
        self.transform_vector(vector)
    }
}

/// Placement of an object: position plus spherical heading and roll.
///
/// The local forward axis is +Z, local up is +Y.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// World position
    pub position: Vec3,
    /// Heading pitch from +Y (HALF_PI = level)
    pub pitch: f32,
    /// Heading yaw from +Z toward +X
    pub yaw: f32,
    /// Roll around the forward axis
    pub roll: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            pitch: constants::HALF_PI,
            yaw: 0.0,
            roll: 0.0,
        }
    }
}

impl Pose {
    /// Level pose at a position with the given yaw
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw, ..Default::default() }
    }

    /// Pose at `position` whose forward axis points along `direction`
    pub fn facing(position: Vec3, direction: &Vec3) -> Self {
        let sph = Spherical::from_cartesian(direction);
        Self {
            position,
            pitch: sph.pitch,
            yaw: sph.yaw,
            roll: 0.0,
        }
    }

    /// Unit forward vector in world space
    pub fn forward(&self) -> Vec3 {
        Spherical::new(1.0, self.pitch, self.yaw).to_cartesian()
    }

    /// Local-to-world matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::translation(&self.position)
            * Mat4::rotation_y(self.yaw)
            * Mat4::rotation_x(self.pitch - constants::HALF_PI)
            * Mat4::rotation_z(self.roll)
    }

    /// World-to-local matrix
    pub fn inverse_matrix(&self) -> Mat4 {
        Mat4::rotation_z(-self.roll)
            * Mat4::rotation_x(-(self.pitch - constants::HALF_PI))
            * Mat4::rotation_y(-self.yaw)
            * Mat4::translation(&-self.position)
    }
}
