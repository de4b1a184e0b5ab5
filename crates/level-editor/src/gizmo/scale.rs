use scene_core::math::{safe_normalize, Plane, Vec3, AABB};
use scene_core::{CollisionShape, SceneError, SceneGraph};
use scene_view::geometry::{self, SCALE_BOX_SIZE, SCALE_SHAFT_LENGTH};

use super::axis::{AxisLabel, AxisSpec};
use super::{drag_plane_normal, DragFrame, GizmoKind, GizmoVariant};
use crate::error::GizmoError;

/// 軸コライダーの半径
const SHAFT_RADIUS: f32 = 0.08;

/// 均等スケールハンドルの一辺
const UNIFORM_HANDLE_SIZE: f32 = 0.2;

/// スケールGizmo
///
/// The pointer's displacement from the press point, measured along the axis
/// in gizmo units, gives the factor `1 + d` applied to the drag-start scale.
#[derive(Debug, Default)]
pub struct ScaleGizmo {
    start: Option<Vec3>,
}

impl ScaleGizmo {
    fn plane_point(frame: &DragFrame<'_>) -> Option<Vec3> {
        let plane = Plane::new(frame.pivot, drag_plane_normal(frame)?)?;
        plane.intersect_ray(&frame.ray)
    }

    /// Direction a displacement is measured along. The uniform handle grows
    /// when dragged toward the top right of the screen.
    fn measure_direction(frame: &DragFrame<'_>) -> Option<Vec3> {
        match frame.axis {
            AxisLabel::Free => safe_normalize(frame.camera.right() + frame.camera.screen_up()),
            _ => Some(frame.direction),
        }
    }

    /// Scale factor for the current pointer position.
    fn factor(&self, frame: &DragFrame<'_>) -> Option<f32> {
        let start = self.start?;
        let point = Self::plane_point(frame)?;
        let direction = Self::measure_direction(frame)?;
        let displacement = (point - start).dot(direction) / frame.scale;
        Some(1.0 + displacement)
    }
}

impl GizmoVariant for ScaleGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Scale
    }

    fn axes(&self) -> Vec<AxisSpec> {
        let mut axes: Vec<AxisSpec> = [AxisLabel::X, AxisLabel::Y, AxisLabel::Z]
            .into_iter()
            .filter_map(|label| {
                let dir = label.direction()?;
                Some(AxisSpec {
                    label,
                    shape: CollisionShape::Cylinder {
                        start: dir * (UNIFORM_HANDLE_SIZE * 0.5),
                        end: dir * (SCALE_SHAFT_LENGTH + SCALE_BOX_SIZE),
                        radius: SHAFT_RADIUS,
                    },
                    vertices: geometry::create_scale_axis_vertices(dir, label.base_color()),
                    billboard: false,
                })
            })
            .collect();
        axes.push(AxisSpec {
            label: AxisLabel::Free,
            shape: CollisionShape::Box(AABB::unit_cube(Vec3::ZERO, Vec3::splat(UNIFORM_HANDLE_SIZE))),
            vertices: geometry::create_box_vertices(UNIFORM_HANDLE_SIZE * 0.5, AxisLabel::Free.base_color()),
            billboard: false,
        });
        axes
    }

    fn on_drag_start(&mut self, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        let start = Self::plane_point(frame).ok_or(GizmoError::Degenerate("scale"))?;
        self.start = Some(start);
        Ok(())
    }

    fn transform(&mut self, scene: &mut SceneGraph, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        // ray parallel to the plane: keep the previous scale
        let Some(factor) = self.factor(frame) else {
            return Ok(());
        };
        let min = Vec3::splat(frame.min_scale);

        for (node, snapshot) in frame.snapshots {
            if !scene.is_alive(*node) {
                return Err(SceneError::DeadNode(*node).into());
            }
            let mut scale = snapshot.scale;
            match frame.axis.component() {
                Some(i) => scale[i] *= factor,
                None => scale *= factor,
            }
            scene.set_transform(*node, snapshot.with_scale(scale.max(min)))?;
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
    fn test_axis_drag_scales_one_component() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Scale, Vec3::ZERO);
        let unit = gizmo.scale();
        let changes = drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::X,
            Vec3::new(1.0, 0.0, 0.0),
            &[Vec3::new(1.0 + unit, 0.3, 0.0)],
        );
        assert_eq!(changes.len(), 1);
        let scale = scene.transform(cube).unwrap().scale;
        assert!((scale - Vec3::new(2.0, 1.0, 1.0)).length() < 1e-3);
    }

    #[test]
    fn test_scale_is_clamped() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Scale, Vec3::ZERO);
        let unit = gizmo.scale();
        drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Y,
            Vec3::new(0.0, 1.0, 0.0),
            &[Vec3::new(0.0, 1.0 - 3.0 * unit, 0.0)],
        );
        let scale = scene.transform(cube).unwrap().scale;
        assert_eq!(scale.y, 1e-3);
        assert_eq!(scale.x, 1.0);
    }

    #[test]
    fn test_uniform_drag_scales_all_components_from_start() {
        let (mut scene, mut gizmo, cube) = setup(GizmoKind::Scale, Vec3::ZERO);
        let unit = gizmo.scale();
        let diagonal = Vec3::new(1.0, 1.0, 0.0).normalize() * unit * 0.5;
        drag_axis(
            &mut scene,
            &mut gizmo,
            AxisLabel::Free,
            Vec3::ZERO,
            &[diagonal * 3.0, diagonal],
        );
        // only the last pointer position counts
        let scale = scene.transform(cube).unwrap().scale;
        assert!((scale - Vec3::splat(1.5)).length() < 1e-3);
    }
}
