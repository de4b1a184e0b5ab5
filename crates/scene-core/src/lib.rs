//! Scene graph, transform components and the vector math shared by the
//! editor crates.

pub mod components;
pub mod graph;
pub mod math;
pub mod prototype;

// Re-exports
pub use components::{Collider, CollisionMask, CollisionShape, Highlight, Name, Selectable, Transform};
pub use graph::{NodeId, SceneError, SceneGraph};
pub use prototype::NodePrototype;

// Re-export glam types for consistent version usage
pub use glam;
