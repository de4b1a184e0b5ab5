//! Manipulator gizmos
//!
//! A [`Gizmo`] holds the state shared by every manipulator (axes, attached
//! nodes, hover/drag state machine) and delegates the drag math to a
//! [`GizmoVariant`]: translate, rotate or scale.

pub mod axis;
mod base;
mod manager;
mod rotate;
mod scale;
mod translate;

use scene_core::math::{safe_normalize, Mat4, Quat, Ray, Vec3};
use scene_core::{NodeId, SceneError, SceneGraph, Transform};
use scene_view::Camera;

pub use axis::{Axis, AxisLabel, AxisSpec, AxisState};
pub use base::{Gizmo, GizmoPhase, TransformChange};
pub use manager::GizmoManager;
pub use rotate::RotateGizmo;
pub use scale::ScaleGizmo;
pub use translate::TranslateGizmo;

use crate::error::GizmoError;

/// Gizmoモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoKind {
    Translate,
    Rotate,
    Scale,
}

impl GizmoKind {
    pub const ALL: [GizmoKind; 3] = [GizmoKind::Translate, GizmoKind::Rotate, GizmoKind::Scale];

    pub fn name(self) -> &'static str {
        match self {
            GizmoKind::Translate => "translate",
            GizmoKind::Rotate => "rotate",
            GizmoKind::Scale => "scale",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "translate" | "move" => Some(GizmoKind::Translate),
            "rotate" => Some(GizmoKind::Rotate),
            "scale" => Some(GizmoKind::Scale),
            _ => None,
        }
    }
}

/// Build the variant for `kind`.
pub fn create_variant(kind: GizmoKind) -> Box<dyn GizmoVariant> {
    match kind {
        GizmoKind::Translate => Box::new(TranslateGizmo::default()),
        GizmoKind::Rotate => Box::new(RotateGizmo::default()),
        GizmoKind::Scale => Box::new(ScaleGizmo::default()),
    }
}

/// Everything a variant needs to compute one drag step.
///
/// `pivot`, `orientation` and `scale` are the gizmo's values when the drag
/// started; `snapshots` are the attached nodes' local transforms at that time.
#[derive(Debug, Clone, Copy)]
pub struct DragFrame<'a> {
    pub camera: &'a Camera,
    /// Pointer ray this frame
    pub ray: Ray,
    pub axis: AxisLabel,
    /// World direction of the dragged axis (toward the camera for `Free`)
    pub direction: Vec3,
    pub pivot: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub snapshots: &'a [(NodeId, Transform)],
    pub snap_quantum: Option<f32>,
    pub min_scale: f32,
}

/// Per-variant drag math.
pub trait GizmoVariant {
    fn kind(&self) -> GizmoKind;

    /// Axes in gizmo space, in display order.
    fn axes(&self) -> Vec<AxisSpec>;

    /// Axis selected before the user picks one.
    fn default_axis(&self) -> AxisLabel {
        AxisLabel::Free
    }

    /// Compute the initial drag reference.
    fn on_drag_start(&mut self, frame: &DragFrame<'_>) -> Result<(), GizmoError>;

    /// Apply this frame's drag to every attached node.
    fn transform(&mut self, scene: &mut SceneGraph, frame: &DragFrame<'_>) -> Result<(), GizmoError>;

    /// Forget the drag reference and any partial snapping offset.
    fn reset(&mut self);
}

/// Normal of the plane a linear drag is measured on: it contains the axis
/// and faces the camera as much as possible. The free axis uses the camera
/// forward vector.
pub(crate) fn drag_plane_normal(frame: &DragFrame<'_>) -> Option<Vec3> {
    let forward = frame.camera.forward();
    match frame.axis {
        AxisLabel::Free => Some(forward),
        _ => {
            let axis = frame.direction;
            safe_normalize(axis.cross(forward.cross(axis)))
        }
    }
}

/// Matrix taking world-space vectors into `node`'s parent space.
pub(crate) fn world_to_parent(scene: &SceneGraph, node: NodeId) -> Result<Mat4, GizmoError> {
    if !scene.is_alive(node) {
        return Err(SceneError::DeadNode(node).into());
    }
    let parent = scene.parent_world_matrix(node);
    if parent.determinant().abs() < f32::EPSILON {
        return Err(GizmoError::Degenerate("parent"));
    }
    Ok(parent.inverse())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        for kind in GizmoKind::ALL {
            assert_eq!(GizmoKind::from_name(kind.name()), Some(kind));
            assert_eq!(create_variant(kind).kind(), kind);
        }
        assert_eq!(GizmoKind::from_name("Rotate"), Some(GizmoKind::Rotate));
        assert_eq!(GizmoKind::from_name("bend"), None);
    }

    #[test]
    fn test_drag_plane_contains_axis() {
        let camera = Camera::looking_at(Vec3::new(3.0, 4.0, 10.0), Vec3::ZERO, 1.0);
        let frame = DragFrame {
            camera: &camera,
            ray: Ray::new(camera.position, camera.forward()).unwrap(),
            axis: AxisLabel::X,
            direction: Vec3::X,
            pivot: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: 1.0,
            snapshots: &[],
            snap_quantum: None,
            min_scale: 1e-3,
        };
        let normal = drag_plane_normal(&frame).unwrap();
        assert!(normal.dot(Vec3::X).abs() < 1e-5);
        assert!(normal.dot(camera.forward()).abs() > 0.5);

        // looking straight down the axis leaves no usable plane
        let head_on = Camera::looking_at(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 1.0);
        let frame = DragFrame {
            camera: &head_on,
            ..frame
        };
        assert!(drag_plane_normal(&frame).is_none());
    }
}
