use scene_core::math::{angle_between_deg, project_on_plane, safe_normalize, Plane, Quat, Vec3, EPSILON};
use scene_core::{CollisionShape, SceneError, SceneGraph, Transform};
use scene_view::geometry::{self, RING_RADIUS};
use tracing::trace;

use super::axis::{AxisLabel, AxisSpec};
use super::{DragFrame, GizmoKind, GizmoVariant};
use crate::error::GizmoError;

/// リングコライダーの厚み
const RING_THICKNESS: f32 = 0.1;

/// 視線方向リングの半径
const VIEW_RING_RADIUS: f32 = 1.2;

/// 回転Gizmo
///
/// The drag angle is measured between the vector from the pivot to the
/// press point and the vector to the current pointer point, both projected
/// on the plane perpendicular to the axis. Every frame rotates from the
/// drag-start snapshots.
#[derive(Debug, Default)]
pub struct RotateGizmo {
    start: Option<Vec3>,
}

impl RotateGizmo {
    /// Unit vector from the pivot to the pointer, in the plane perpendicular to `axis`.
    fn reference(frame: &DragFrame<'_>, axis: Vec3) -> Option<Vec3> {
        let on_axis_plane = Plane::new(frame.pivot, axis)
            .filter(|_| frame.ray.direction.dot(axis).abs() > EPSILON)
            .and_then(|plane| plane.intersect_ray(&frame.ray));
        // edge-on ring: fall back to the plane facing the camera
        let point = match on_axis_plane {
            Some(point) => point,
            None => Plane::new(frame.pivot, frame.camera.forward())?.intersect_ray(&frame.ray)?,
        };
        safe_normalize(project_on_plane(point - frame.pivot, axis))
    }

    /// Signed rotation taking `from` to `to` about `axis`.
    fn rotation(frame: &DragFrame<'_>, axis: Vec3, from: Vec3, to: Vec3) -> Option<Quat> {
        let angle = angle_between_deg(from, to)?;
        let toward_camera = safe_normalize(frame.camera.position - frame.pivot)?;
        let facing = axis.dot(toward_camera);
        let axis = if facing < 0.0 { -axis } else { axis };

        let turn = from.cross(to);
        let sign = if facing.abs() > EPSILON {
            turn.dot(toward_camera)
        } else {
            turn.dot(axis)
        };
        let angle = if sign < 0.0 { -angle } else { angle };
        Some(Quat::from_axis_angle(axis, angle.to_radians()))
    }
}

impl GizmoVariant for RotateGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Rotate
    }

    fn axes(&self) -> Vec<AxisSpec> {
        let ring = |label: AxisLabel, normal: Vec3, radius: f32, billboard: bool| AxisSpec {
            label,
            shape: CollisionShape::Ring {
                center: Vec3::ZERO,
                normal,
                radius,
                thickness: RING_THICKNESS,
            },
            vertices: geometry::create_ring_vertices(normal, radius, label.base_color()),
            billboard,
        };
        vec![
            ring(AxisLabel::X, Vec3::X, RING_RADIUS, false),
            ring(AxisLabel::Y, Vec3::Y, RING_RADIUS, false),
            ring(AxisLabel::Z, Vec3::Z, RING_RADIUS, false),
            ring(AxisLabel::Free, Vec3::Z, VIEW_RING_RADIUS, true),
        ]
    }

    fn on_drag_start(&mut self, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        let start = Self::reference(frame, frame.direction).ok_or(GizmoError::Degenerate("rotate"))?;
        self.start = Some(start);
        Ok(())
    }

    fn transform(&mut self, scene: &mut SceneGraph, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        let Some(start) = self.start else {
            return Ok(());
        };
        // pointer on the pivot: keep the previous pose
        let Some(current) = Self::reference(frame, frame.direction) else {
            return Ok(());
        };
        let rotation = Self::rotation(frame, frame.direction, start, current)
            .ok_or(GizmoError::Degenerate("rotate"))?;
        trace!("rotate {:?} by {:?}", frame.axis, rotation);

        for (node, snapshot) in frame.snapshots {
            if !scene.is_alive(*node) {
                return Err(SceneError::DeadNode(*node).into());
            }
            let world = Transform::from_matrix(scene.parent_world_matrix(*node) * snapshot.to_matrix());
            let rotated = Transform::new(
                frame.pivot + rotation * (world.position - frame.pivot),
                (rotation * world.rotation).normalize(),
                world.scale,
            );
            scene.set_world_transform(*node, &rotated)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{drag_axis, setup};
    use super::*;

    #[test]
    fn test_zero_drag_is_identity() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Rotate, Vec3::ZERO);
        let before = scene.transform(cube).unwrap();
        let changes = drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Z,
            Vec3::new(1.0, 0.0, 0.0),
            &[Vec3::new(1.0, 0.0, 0.0)],
        );
        assert!(changes.iter().all(|c| c.after.abs_diff_eq(&before, 1e-5)));
        assert!(scene.transform(cube).unwrap().abs_diff_eq(&before, 1e-5));
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Rotate, Vec3::ZERO);
        drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Z,
            Vec3::new(1.0, 0.0, 0.0),
            &[Vec3::new(0.7, 0.7, 0.0), Vec3::new(0.0, 1.0, 0.0)],
        );
        let rotation = scene.transform(cube).unwrap().rotation;
        assert!((rotation * Vec3::X - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_back_and_forth_returns_to_start() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Rotate, Vec3::ZERO);
        let before = scene.transform(cube).unwrap();
        drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Z,
            Vec3::new(1.0, 0.0, 0.0),
            &[Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
        );
        assert!(scene.transform(cube).unwrap().abs_diff_eq(&before, 1e-4));
    }

    #[test]
    fn test_rotation_orbits_nodes_around_pivot() {
        let (mut scene, mut gizmo, a) = setup(GizmoKind::Rotate, Vec3::new(1.0, 0.0, 0.0));
        let root = scene.root();
        let b = scene_core::NodePrototype::cube("B")
            .at(Vec3::new(-1.0, 0.0, 0.0))
            .instantiate(&mut scene, root)
            .unwrap();
        gizmo.attach(&[a, b]);

        // pivot is the mean position, the origin
        drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Z,
            Vec3::new(1.0, 0.0, 0.0),
            &[Vec3::new(0.0, 1.0, 0.0)],
        );
        assert!((scene.world_position(a).unwrap() - Vec3::Y).length() < 1e-4);
        assert!((scene.world_position(b).unwrap() + Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_axis_facing_away_keeps_pointer_direction() {
        let camera = scene_view::Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0);
        let frame = DragFrame {
            camera: &camera,
            ray: scene_core::math::Ray::new(camera.position, camera.forward()).unwrap(),
            axis: AxisLabel::Z,
            direction: -Vec3::Z,
            pivot: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: 1.0,
            snapshots: &[],
            snap_quantum: None,
            min_scale: 1e-3,
        };
        let q = RotateGizmo::rotation(&frame, -Vec3::Z, Vec3::X, Vec3::Y).unwrap();
        assert!((q * Vec3::X - Vec3::Y).length() < 1e-5);
    }
}
