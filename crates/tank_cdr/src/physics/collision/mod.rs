//! Narrow-phase collision detection against authored meshes
//!
//! # Architecture
//!
//! - **Model Space Storage**: meshes stay in the local frame of the part
//!   they move with
//! - **Ray Transformation**: the striker's ray is brought into that frame,
//!   never the other way round
//!
//! # Module Organization
//!
//! - [`primitives`] - Rays, boxes and plane-carrying triangles
//! - [`mesh`] - Named collision meshes and the mesh library seam
//! - [`detection`] - Box/polygon tests and the running best-hit search

pub mod detection;
pub mod mesh;
pub mod primitives;

// Re-export commonly used types
pub use detection::{
    test_bounding_box, test_polygons, CollisionDetectionResult, DetectionModifiers, HitSearch, PolygonHit, CD_T_START,
};
pub use mesh::{CollisionMesh, MeshId, MeshLibrary, ModelId, ModelLibrary, ModelMeshes};
pub use primitives::{Aabb, Ray, Triangle};
