//! Collision mesh representations
//!
//! Meshes are stored in the local frame of the attachment they belong to
//! (hull, turret, gun mount or gun) and never transformed; rays are brought
//! into that frame instead.

use std::collections::HashMap;

use crate::foundation::math::Vec3;

use super::primitives::{Aabb, Triangle};

/// Index of a model in a [`MeshLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ModelId(pub u32);

/// Index of a mesh within one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct MeshId(pub usize);

/// A named collision mesh with precomputed planes and bounds
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    /// Mesh name, doubling as the armor slab name
    pub name: String,
    /// Triangles in the attachment's local frame
    pub triangles: Vec<Triangle>,
    /// Bounding box of all vertices
    pub bounds: Aabb,
}

impl CollisionMesh {
    /// Creates a mesh from local-space vertices and triangle indices
    ///
    /// Trailing indices that do not form a whole triangle, and indices out
    /// of range, are ignored.
    pub fn from_vertices(name: impl Into<String>, vertices: &[Vec3], indices: &[u32]) -> Self {
        let name = name.into();
        let triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .filter_map(|chunk| {
                let v0 = vertices.get(chunk[0] as usize)?;
                let v1 = vertices.get(chunk[1] as usize)?;
                let v2 = vertices.get(chunk[2] as usize)?;
                Some(Triangle::new(*v0, *v1, *v2))
            })
            .collect();

        if triangles.len() * 3 != indices.len() {
            log::warn!(
                "Mesh '{}': {} of {} indices did not form valid triangles",
                name,
                indices.len() - triangles.len() * 3,
                indices.len()
            );
        }

        let bounds = Aabb::from_points(triangles.iter().flat_map(|t| t.vertices.iter()));
        Self { name, triangles, bounds }
    }

    /// Axis-aligned box mesh with outward-facing triangles
    pub fn cuboid(name: impl Into<String>, min: Vec3, max: Vec3) -> Self {
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        #[rustfmt::skip]
        let indices = [
            4, 5, 6, 4, 6, 7, // +Z
            1, 0, 3, 1, 3, 2, // -Z
            5, 1, 2, 5, 2, 6, // +X
            0, 4, 7, 0, 7, 3, // -X
            7, 6, 2, 7, 2, 3, // +Y
            0, 1, 5, 0, 5, 4, // -Y
        ];
        Self::from_vertices(name, &corners, &indices)
    }
}

/// Mesh/geometry provider consumed by the narrow phase
pub trait MeshLibrary {
    /// Resolve a mesh name on a model
    fn mesh_id(&self, model: ModelId, name: &str) -> Option<MeshId>;

    /// Fetch a mesh by id
    fn mesh(&self, model: ModelId, mesh: MeshId) -> Option<&CollisionMesh>;

    /// Number of meshes on a model
    fn mesh_count(&self, model: ModelId) -> usize;

    /// Name of a mesh
    fn mesh_name(&self, model: ModelId, mesh: MeshId) -> Option<&str> {
        self.mesh(model, mesh).map(|m| m.name.as_str())
    }
}

/// Meshes belonging to one model, addressable by index and name
#[derive(Debug, Clone, Default)]
pub struct ModelMeshes {
    /// Model name
    pub name: String,
    meshes: Vec<CollisionMesh>,
    by_name: HashMap<String, MeshId>,
}

impl ModelMeshes {
    /// Empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Add a mesh, returning its id. A duplicate name shadows the earlier mesh.
    pub fn add(&mut self, mesh: CollisionMesh) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.by_name.insert(mesh.name.clone(), id);
        self.meshes.push(mesh);
        id
    }

    /// Builder-style [`ModelMeshes::add`]
    pub fn with_mesh(mut self, mesh: CollisionMesh) -> Self {
        self.add(mesh);
        self
    }

    /// Meshes in insertion order
    pub fn meshes(&self) -> &[CollisionMesh] {
        &self.meshes
    }
}

/// In-memory [`MeshLibrary`]
#[derive(Debug, Clone, Default)]
pub struct ModelLibrary {
    models: Vec<ModelMeshes>,
}

impl ModelLibrary {
    /// Empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, returning its id
    pub fn register(&mut self, model: ModelMeshes) -> ModelId {
        let id = ModelId(self.models.len() as u32);
        log::debug!("Registered model '{}' as {:?} with {} meshes", model.name, id, model.meshes.len());
        self.models.push(model);
        id
    }

    /// Look up a model id by name
    pub fn model_id(&self, name: &str) -> Option<ModelId> {
        self.models
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModelId(i as u32))
    }

    fn model(&self, model: ModelId) -> Option<&ModelMeshes> {
        self.models.get(model.0 as usize)
    }
}

impl MeshLibrary for ModelLibrary {
    fn mesh_id(&self, model: ModelId, name: &str) -> Option<MeshId> {
        self.model(model)?.by_name.get(name).copied()
    }

    fn mesh(&self, model: ModelId, mesh: MeshId) -> Option<&CollisionMesh> {
        self.model(model)?.meshes.get(mesh.0)
    }

    fn mesh_count(&self, model: ModelId) -> usize {
        self.model(model).map_or(0, |m| m.meshes.len())
    }
}
