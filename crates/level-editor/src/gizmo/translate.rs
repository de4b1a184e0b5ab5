use scene_core::math::{Plane, Vec3, AABB};
use scene_core::{CollisionShape, SceneError, SceneGraph};
use scene_view::geometry::{self, ARROW_LENGTH};

use super::axis::{AxisLabel, AxisSpec};
use super::{drag_plane_normal, world_to_parent, DragFrame, GizmoKind, GizmoVariant};
use crate::error::GizmoError;

/// 矢印コライダーの半径
const ARROW_RADIUS: f32 = 0.08;

/// 自由移動ハンドルの一辺
const FREE_HANDLE_SIZE: f32 = 0.24;

/// 移動Gizmo
///
/// Works incrementally: every frame moves the attached nodes by the
/// distance the pointer travelled on the drag plane since the last frame.
#[derive(Debug, Default)]
pub struct TranslateGizmo {
    last_point: Option<Vec3>,
    /// World offset not yet emitted because of snapping
    remainder: Vec3,
}

impl TranslateGizmo {
    fn plane_point(frame: &DragFrame<'_>) -> Result<Vec3, GizmoError> {
        let normal = drag_plane_normal(frame).ok_or(GizmoError::Degenerate("translate"))?;
        let plane = Plane::new(frame.pivot, normal).ok_or(GizmoError::Degenerate("translate"))?;
        plane
            .intersect_ray(&frame.ray)
            .ok_or(GizmoError::Degenerate("translate"))
    }

    /// Constrain a world delta to the dragged axis.
    fn constrain(frame: &DragFrame<'_>, delta: Vec3) -> Vec3 {
        match frame.axis {
            AxisLabel::Free => delta,
            _ => frame.direction * delta.dot(frame.direction),
        }
    }

    /// Emit whole grid steps from the accumulated offset, keeping the rest.
    fn snap(&mut self, frame: &DragFrame<'_>, delta: Vec3) -> Vec3 {
        let Some(quantum) = frame.snap_quantum.filter(|q| *q > 0.0) else {
            return delta;
        };
        self.remainder += delta;
        let emitted = match frame.axis {
            AxisLabel::Free => (self.remainder / quantum).trunc() * quantum,
            _ => {
                let offset = self.remainder.dot(frame.direction);
                frame.direction * ((offset / quantum).trunc() * quantum)
            }
        };
        self.remainder -= emitted;
        emitted
    }
}

impl GizmoVariant for TranslateGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Translate
    }

    fn axes(&self) -> Vec<AxisSpec> {
        let mut axes: Vec<AxisSpec> = [AxisLabel::X, AxisLabel::Y, AxisLabel::Z]
            .into_iter()
            .filter_map(|label| {
                let dir = label.direction()?;
                Some(AxisSpec {
                    label,
                    shape: CollisionShape::Cylinder {
                        start: dir * (FREE_HANDLE_SIZE * 0.5),
                        end: dir * ARROW_LENGTH,
                        radius: ARROW_RADIUS,
                    },
                    vertices: geometry::create_arrow_vertices(dir, label.base_color()),
                    billboard: false,
                })
            })
            .collect();
        axes.push(AxisSpec {
            label: AxisLabel::Free,
            shape: CollisionShape::Box(AABB::unit_cube(Vec3::ZERO, Vec3::splat(FREE_HANDLE_SIZE))),
            vertices: geometry::create_box_vertices(FREE_HANDLE_SIZE * 0.5, AxisLabel::Free.base_color()),
            billboard: false,
        });
        axes
    }

    fn on_drag_start(&mut self, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        self.last_point = Some(Self::plane_point(frame)?);
        self.remainder = Vec3::ZERO;
        Ok(())
    }

    fn transform(&mut self, scene: &mut SceneGraph, frame: &DragFrame<'_>) -> Result<(), GizmoError> {
        let Some(last) = self.last_point else {
            return Ok(());
        };
        // ray parallel to the plane: skip the frame
        let Ok(point) = Self::plane_point(frame) else {
            return Ok(());
        };
        self.last_point = Some(point);

        let delta = Self::constrain(frame, point - last);
        let delta = self.snap(frame, delta);
        if delta == Vec3::ZERO {
            return Ok(());
        }

        for (node, _) in frame.snapshots {
            let local = world_to_parent(scene, *node)?.transform_vector3(delta);
            let mut transform = scene.transform(*node).ok_or(SceneError::DeadNode(*node))?;
            transform.position += local;
            scene.set_transform(*node, transform)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.last_point = None;
        self.remainder = Vec3::ZERO;
    }
}
