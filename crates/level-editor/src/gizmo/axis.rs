//! Gizmo axes
//!
//! Each axis owns a collider child node under the gizmo root; the picker hits
//! those nodes like any other and the gizmo maps them back to an axis.

use scene_core::math::{Quat, Vec3};
use scene_core::{CollisionShape, NodeId};
use scene_view::geometry::{self, GizmoVertex};
use scene_view::Camera;

/// Highlight state of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisState {
    #[default]
    Default,
    Highlighted,
    Selected,
}

/// Axis label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisLabel {
    X,
    Y,
    Z,
    /// Camera-facing handle (free move, view ring, uniform scale)
    Free,
}

impl AxisLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            AxisLabel::X => "x",
            AxisLabel::Y => "y",
            AxisLabel::Z => "z",
            AxisLabel::Free => "free",
        }
    }

    /// Unit direction in gizmo space, `None` for the free handle.
    pub fn direction(self) -> Option<Vec3> {
        match self {
            AxisLabel::X => Some(Vec3::X),
            AxisLabel::Y => Some(Vec3::Y),
            AxisLabel::Z => Some(Vec3::Z),
            AxisLabel::Free => None,
        }
    }

    /// Component index of a local scale vector.
    pub fn component(self) -> Option<usize> {
        match self {
            AxisLabel::X => Some(0),
            AxisLabel::Y => Some(1),
            AxisLabel::Z => Some(2),
            AxisLabel::Free => None,
        }
    }

    pub fn base_color(self) -> [f32; 4] {
        match self {
            AxisLabel::X => geometry::COLOR_X,
            AxisLabel::Y => geometry::COLOR_Y,
            AxisLabel::Z => geometry::COLOR_Z,
            AxisLabel::Free => geometry::COLOR_FREE,
        }
    }
}

/// What a variant declares for each of its axes
#[derive(Debug, Clone)]
pub struct AxisSpec {
    pub label: AxisLabel,
    /// Collision solid in gizmo space (unit size)
    pub shape: CollisionShape,
    /// Render geometry in gizmo space (unit size)
    pub vertices: Vec<GizmoVertex>,
    /// Turn the collider node to face the camera every refresh
    pub billboard: bool,
}

/// One manipulable axis of a gizmo
#[derive(Debug, Clone)]
pub struct Axis {
    label: AxisLabel,
    node: NodeId,
    vertices: Vec<GizmoVertex>,
    billboard: bool,
    state: AxisState,
}

impl Axis {
    pub(crate) fn new(spec: AxisSpec, node: NodeId) -> Self {
        Self {
            label: spec.label,
            node,
            vertices: spec.vertices,
            billboard: spec.billboard,
            state: AxisState::Default,
        }
    }

    pub fn label(&self) -> AxisLabel {
        self.label
    }

    /// Collider node of this axis
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> AxisState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: AxisState) {
        self.state = state;
    }

    pub fn is_billboard(&self) -> bool {
        self.billboard
    }

    pub fn color(&self) -> [f32; 4] {
        match self.state {
            AxisState::Default => self.label.base_color(),
            AxisState::Highlighted => geometry::COLOR_HIGHLIGHT,
            AxisState::Selected => geometry::COLOR_SELECTED,
        }
    }

    /// Unit-size vertices colored for the current state.
    pub fn render_vertices(&self) -> Vec<GizmoVertex> {
        let mut vertices = self.vertices.clone();
        geometry::recolor(&mut vertices, self.color());
        vertices
    }

    /// World direction under the gizmo `orientation`. The free axis points
    /// from the gizmo toward the camera.
    pub fn world_direction(&self, orientation: Quat, camera: &Camera) -> Vec3 {
        match self.label.direction() {
            Some(dir) => orientation * dir,
            None => -camera.forward(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::math::AABB;

    fn axis(label: AxisLabel) -> Axis {
        let spec = AxisSpec {
            label,
            shape: CollisionShape::Box(AABB::unit_cube(Vec3::ZERO, Vec3::ONE)),
            vertices: geometry::create_box_vertices(0.1, label.base_color()),
            billboard: false,
        };
        Axis::new(spec, NodeId::new(1, 1))
    }

    #[test]
    fn test_state_colors() {
        let mut x = axis(AxisLabel::X);
        assert_eq!(x.color(), geometry::COLOR_X);
        x.set_state(AxisState::Highlighted);
        assert_eq!(x.color(), geometry::COLOR_HIGHLIGHT);
        x.set_state(AxisState::Selected);
        assert!(x.render_vertices().iter().all(|v| v.color == geometry::COLOR_SELECTED));
    }

    #[test]
    fn test_world_direction() {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0);
        let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let x = axis(AxisLabel::X).world_direction(quarter, &camera);
        assert!((x - Vec3::Y).length() < 1e-5);

        let free = axis(AxisLabel::Free).world_direction(quarter, &camera);
        assert!((free - Vec3::Z).length() < 1e-5);
    }
}
