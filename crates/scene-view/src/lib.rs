pub mod camera;
pub mod geometry;
pub mod picking;

pub use camera::Camera;
pub use geometry::{
    GizmoVertex, create_arrow_vertices, create_box_vertices, create_ring_vertices,
    create_scale_axis_vertices,
};
pub use picking::{HoverEvent, PickHit, ScenePicker};

// Re-export glam types for consistent version usage
pub use glam;
