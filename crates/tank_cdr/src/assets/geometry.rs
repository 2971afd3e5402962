//! Serializable collision geometry descriptors

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::Vec3;
use crate::physics::collision::{CollisionMesh, ModelLibrary, ModelMeshes};

/// Shape of one mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshShape {
    /// Indexed triangle list in the attachment frame
    Triangles {
        /// Vertex positions
        vertices: Vec<[f32; 3]>,
        /// Three indices per triangle
        indices: Vec<u32>,
    },
    /// Axis-aligned box
    Cuboid {
        /// Minimum corner
        min: [f32; 3],
        /// Maximum corner
        max: [f32; 3],
    },
}

/// A named mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Mesh name, also the armor slab name
    pub name: String,
    /// Geometry
    pub shape: MeshShape,
}

impl MeshGeometry {
    /// Build the collision mesh
    pub fn build(&self) -> CollisionMesh {
        match &self.shape {
            MeshShape::Triangles { vertices, indices } => {
                let vertices: Vec<Vec3> = vertices.iter().map(|v| Vec3::from(*v)).collect();
                CollisionMesh::from_vertices(self.name.clone(), &vertices, indices)
            }
            MeshShape::Cuboid { min, max } => CollisionMesh::cuboid(self.name.clone(), Vec3::from(*min), Vec3::from(*max)),
        }
    }
}

/// All meshes of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGeometry {
    /// Model name
    pub name: String,
    /// Meshes in index order
    pub meshes: Vec<MeshGeometry>,
}

impl ModelGeometry {
    /// Build the model's meshes
    pub fn build(&self) -> ModelMeshes {
        self.meshes
            .iter()
            .fold(ModelMeshes::new(self.name.clone()), |model, mesh| model.with_mesh(mesh.build()))
    }
}

/// A geometry file: a list of models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySet {
    /// Models in registration order
    pub models: Vec<ModelGeometry>,
}

impl Config for GeometrySet {}

impl GeometrySet {
    /// Register every model into `library`
    pub fn register_into(&self, library: &mut ModelLibrary) {
        for model in &self.models {
            library.register(model.build());
        }
    }

    /// Build a fresh library from this set
    pub fn build_library(&self) -> ModelLibrary {
        let mut library = ModelLibrary::new();
        self.register_into(&mut library);
        library
    }
}
