//! Model data: string attributes and collision geometry descriptors

mod geometry;
mod model_db;

pub use geometry::{GeometrySet, MeshGeometry, MeshShape, ModelGeometry};
pub use model_db::{AttributeSource, ModelDatabase};
