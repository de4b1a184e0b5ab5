use scene_core::math::{Quat, Vec3, EPSILON};
use scene_core::{Collider, CollisionMask, Name, NodeId, SceneError, SceneGraph, Transform};
use scene_view::Camera;
use tracing::{debug, warn};

use super::axis::{Axis, AxisLabel, AxisState};
use super::{DragFrame, GizmoKind, GizmoVariant};
use crate::config::GizmoConfig;
use crate::error::GizmoError;
use crate::input::Viewport;

/// Visual size multiplier while a drag is in progress
const DRAG_SIZE_FACTOR: f32 = 1.1;

/// Gizmo interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoPhase {
    #[default]
    Idle,
    Hovering,
    Dragging,
}

/// Local transform of a node before and after a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformChange {
    pub node: NodeId,
    pub before: Transform,
    pub after: Transform,
}

/// Values frozen when a drag starts
#[derive(Debug)]
struct DragState {
    axis: usize,
    snapshots: Vec<(NodeId, Transform)>,
    pivot: Vec3,
    orientation: Quat,
    scale: f32,
}

/// A manipulator widget living in the scene graph.
///
/// Built once, its root node is attached under the overlay node while the
/// gizmo is active and has something attached, and detached otherwise.
pub struct Gizmo {
    variant: Box<dyn GizmoVariant>,
    root: NodeId,
    axes: Vec<Axis>,
    default_axis: usize,
    hovered_axis: Option<usize>,
    selected_axis: Option<usize>,
    attached: Vec<NodeId>,
    local: bool,
    size_factor: f32,
    drag_factor: f32,
    snap_quantum: Option<f32>,
    screen_divisor: f32,
    min_scale: f32,
    scale: f32,
    active: bool,
    phase: GizmoPhase,
    drag: Option<DragState>,
}

impl Gizmo {
    /// Spawn the gizmo root (detached) and one collider node per axis.
    pub fn new(
        scene: &mut SceneGraph,
        variant: Box<dyn GizmoVariant>,
        config: &GizmoConfig,
    ) -> Result<Self, SceneError> {
        let kind = variant.kind().name();
        let root = scene.spawn_detached();
        scene.insert(root, Name::new(format!("gizmo.{kind}")));

        let mut axes = Vec::new();
        for spec in variant.axes() {
            let node = scene.spawn(root)?;
            scene.insert(node, Name::new(format!("gizmo.{kind}.{}", spec.label.as_str())));
            scene.insert(node, Collider::new(spec.shape, CollisionMask::GIZMO));
            axes.push(Axis::new(spec, node));
        }

        let default_label = variant.default_axis();
        let default_axis = axes
            .iter()
            .position(|a| a.label() == default_label)
            .unwrap_or(0);
        let selected_axis = axes.get_mut(default_axis).map(|axis| {
            axis.set_state(AxisState::Selected);
            default_axis
        });

        Ok(Self {
            variant,
            root,
            axes,
            default_axis,
            hovered_axis: None,
            selected_axis,
            attached: Vec::new(),
            local: config.local,
            size_factor: 1.0,
            drag_factor: 1.0,
            snap_quantum: None,
            screen_divisor: config.screen_divisor,
            min_scale: config.min_scale,
            scale: 1.0,
            active: false,
            phase: GizmoPhase::Idle,
            drag: None,
        })
    }

    pub fn kind(&self) -> GizmoKind {
        self.variant.kind()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, label: AxisLabel) -> Option<&Axis> {
        self.axes.iter().find(|a| a.label() == label)
    }

    pub fn default_axis(&self) -> AxisLabel {
        self.axes[self.default_axis].label()
    }

    pub fn hovered_axis(&self) -> Option<AxisLabel> {
        self.hovered_axis.map(|i| self.axes[i].label())
    }

    pub fn selected_axis(&self) -> Option<AxisLabel> {
        self.selected_axis.map(|i| self.axes[i].label())
    }

    pub fn phase(&self) -> GizmoPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == GizmoPhase::Dragging
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn attached(&self) -> &[NodeId] {
        &self.attached
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn size_factor(&self) -> f32 {
        self.size_factor
    }

    /// Uniform scale applied at the last refresh.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Axis whose collider is `node`.
    pub fn axis_for_node(&self, node: NodeId) -> Option<AxisLabel> {
        self.axis_index(node).map(|i| self.axes[i].label())
    }

    fn axis_index(&self, node: NodeId) -> Option<usize> {
        self.axes.iter().position(|a| a.node() == node)
    }

    pub fn attach(&mut self, nodes: &[NodeId]) {
        self.attached = nodes.to_vec();
    }

    pub fn set_local(&mut self, local: bool) {
        self.local = local;
    }

    pub fn set_size(&mut self, factor: f32) {
        self.size_factor = factor;
    }

    pub fn set_snapping(&mut self, quantum: Option<f32>) {
        self.snap_quantum = quantum;
    }

    /// Activate. The gizmo shows up at the next [`Gizmo::refresh`].
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Deactivate: cancel any drag, drop hover and hide.
    pub fn stop(&mut self, scene: &mut SceneGraph) -> Result<(), SceneError> {
        if self.is_dragging() {
            self.cancel_drag(scene);
        }
        self.hover(None);
        self.active = false;
        self.hide(scene)
    }

    fn hide(&mut self, scene: &mut SceneGraph) -> Result<(), SceneError> {
        if scene.parent(self.root).is_some() {
            scene.detach(self.root)?;
        }
        Ok(())
    }

    /// Attached nodes that are still part of the scene.
    fn live_attached(&self, scene: &SceneGraph) -> Vec<NodeId> {
        self.attached
            .iter()
            .copied()
            .filter(|n| scene.is_in_scene(*n))
            .collect()
    }

    /// Mean world position, and the first node's world rotation in local mode.
    fn pose(&self, scene: &SceneGraph, nodes: &[NodeId]) -> Option<(Vec3, Quat)> {
        let positions: Vec<Vec3> = nodes.iter().filter_map(|n| scene.world_position(*n)).collect();
        if positions.is_empty() {
            return None;
        }
        let pivot = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
        let orientation = if self.local {
            nodes
                .first()
                .and_then(|n| scene.world_transform(*n))
                .map(|t| t.rotation.normalize())
                .unwrap_or(Quat::IDENTITY)
        } else {
            Quat::IDENTITY
        };
        Some((pivot, orientation))
    }

    /// Place the gizmo on its attached nodes at constant screen size, or
    /// hide it when inactive or nothing is attached.
    pub fn refresh(
        &mut self,
        scene: &mut SceneGraph,
        overlay: NodeId,
        camera: &Camera,
    ) -> Result<(), SceneError> {
        let nodes = self.live_attached(scene);
        let pose = self.pose(scene, &nodes);
        let (Some((pivot, orientation)), true) = (pose, self.active) else {
            return self.hide(scene);
        };

        if scene.parent(self.root) != Some(overlay) {
            scene.set_parent(self.root, overlay, None)?;
        }

        let distance = camera.distance_to(pivot).max(camera.near);
        self.scale = (distance / self.screen_divisor).max(EPSILON) * self.size_factor * self.drag_factor;
        let transform = Transform::new(pivot, orientation, Vec3::splat(self.scale));
        scene.set_world_transform(self.root, &transform)?;

        // camera-facing handles are modelled in the XY plane
        let facing = Quat::from_rotation_arc(Vec3::Z, -camera.forward());
        for axis in self.axes.iter().filter(|a| a.is_billboard()) {
            let rotation = orientation.inverse() * facing;
            scene.set_transform(axis.node(), Transform::identity().with_rotation(rotation))?;
        }
        Ok(())
    }

    /// Feed the picker's hovered node. Ignored while dragging.
    pub fn hover(&mut self, node: Option<NodeId>) {
        if self.is_dragging() {
            return;
        }
        let axis = node.and_then(|n| self.axis_index(n));
        if axis != self.hovered_axis {
            if let Some(old) = self.hovered_axis {
                if self.axes[old].state() == AxisState::Highlighted {
                    self.axes[old].set_state(AxisState::Default);
                }
            }
            if let Some(new) = axis {
                if self.axes[new].state() != AxisState::Selected {
                    self.axes[new].set_state(AxisState::Highlighted);
                }
            }
            self.hovered_axis = axis;
        }
        self.phase = if axis.is_some() {
            GizmoPhase::Hovering
        } else {
            GizmoPhase::Idle
        };
    }

    /// Start dragging the hovered axis. Returns whether a drag started.
    pub fn primary_down(
        &mut self,
        scene: &mut SceneGraph,
        viewport: &Viewport<'_>,
    ) -> Result<bool, GizmoError> {
        match self.hovered_axis {
            Some(axis) => self.begin_drag(scene, viewport, axis),
            None => Ok(false),
        }
    }

    /// Start dragging the selected axis wherever the pointer is.
    pub fn secondary_down(
        &mut self,
        scene: &mut SceneGraph,
        viewport: &Viewport<'_>,
    ) -> Result<bool, GizmoError> {
        match self.selected_axis {
            Some(axis) => self.begin_drag(scene, viewport, axis),
            None => Ok(false),
        }
    }

    fn select_axis(&mut self, axis: usize) {
        if let Some(previous) = self.selected_axis {
            self.axes[previous].set_state(AxisState::Default);
        }
        self.axes[axis].set_state(AxisState::Selected);
        self.selected_axis = Some(axis);
    }

    fn begin_drag(
        &mut self,
        scene: &mut SceneGraph,
        viewport: &Viewport<'_>,
        axis: usize,
    ) -> Result<bool, GizmoError> {
        if !self.active || self.is_dragging() {
            return Ok(false);
        }
        let nodes = self.live_attached(scene);
        let (Some(ray), Some((pivot, orientation))) = (viewport.pointer_ray(), self.pose(scene, &nodes))
        else {
            return Ok(false);
        };

        let mut snapshots = Vec::with_capacity(nodes.len());
        for node in nodes {
            let transform = scene.transform(node).ok_or(SceneError::DeadNode(node))?;
            snapshots.push((node, transform));
        }

        self.select_axis(axis);
        let drag = DragState {
            axis,
            snapshots,
            pivot,
            orientation,
            scale: self.scale.max(EPSILON),
        };

        let frame = drag_frame(&drag, &self.axes[axis], viewport.camera, ray, self.snap_quantum, self.min_scale);
        if let Err(err) = self.variant.on_drag_start(&frame) {
            warn!("cannot start {} drag: {}", self.kind().name(), err);
            self.variant.reset();
            return Err(err);
        }

        debug!(
            "{} drag start on axis {} with {} node(s)",
            self.kind().name(),
            self.axes[axis].label().as_str(),
            drag.snapshots.len()
        );
        self.drag = Some(drag);
        self.drag_factor = DRAG_SIZE_FACTOR;
        self.phase = GizmoPhase::Dragging;
        Ok(true)
    }

    /// Apply this frame's drag. On failure the attached nodes are restored
    /// and the gizmo is back to idle.
    pub fn drag(&mut self, scene: &mut SceneGraph, viewport: &Viewport<'_>) -> Result<(), GizmoError> {
        let Some(drag) = self.drag.as_ref() else {
            return Ok(());
        };
        let Some(ray) = viewport.pointer_ray() else {
            return Ok(());
        };

        let frame = drag_frame(drag, &self.axes[drag.axis], viewport.camera, ray, self.snap_quantum, self.min_scale);
        let result = self.variant.transform(scene, &frame);
        if let Err(err) = result {
            warn!("{} drag failed, restoring: {}", self.kind().name(), err);
            self.cancel_drag(scene);
            return Err(err);
        }
        Ok(())
    }

    /// Finish the drag and report the nodes whose transform changed.
    pub fn end_drag(&mut self, scene: &SceneGraph) -> Vec<TransformChange> {
        let Some(drag) = self.finish() else {
            return Vec::new();
        };
        debug!("{} drag end", self.kind().name());

        drag.snapshots
            .into_iter()
            .filter_map(|(node, before)| {
                let after = scene.transform(node)?;
                (after != before).then_some(TransformChange { node, before, after })
            })
            .collect()
    }

    /// Abort the drag, putting every attached node back where it started.
    pub fn cancel_drag(&mut self, scene: &mut SceneGraph) {
        let Some(drag) = self.finish() else {
            return;
        };
        for (node, before) in drag.snapshots {
            if let Err(err) = scene.set_transform(node, before) {
                warn!("cannot restore {}: {}", node, err);
            }
        }
        debug!("{} drag cancelled", self.kind().name());
    }

    fn finish(&mut self) -> Option<DragState> {
        let drag = self.drag.take()?;
        self.variant.reset();
        self.drag_factor = 1.0;
        self.phase = if self.hovered_axis.is_some() {
            GizmoPhase::Hovering
        } else {
            GizmoPhase::Idle
        };
        Some(drag)
    }
}

impl std::fmt::Debug for Gizmo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gizmo")
            .field("kind", &self.kind())
            .field("root", &self.root)
            .field("phase", &self.phase)
            .field("attached", &self.attached)
            .field("local", &self.local)
            .finish()
    }
}

fn drag_frame<'a>(
    drag: &'a DragState,
    axis: &Axis,
    camera: &'a Camera,
    ray: scene_core::math::Ray,
    snap_quantum: Option<f32>,
    min_scale: f32,
) -> DragFrame<'a> {
    DragFrame {
        camera,
        ray,
        axis: axis.label(),
        direction: axis.world_direction(drag.orientation, camera),
        pivot: drag.pivot,
        orientation: drag.orientation,
        scale: drag.scale,
        snapshots: &drag.snapshots,
        snap_quantum,
        min_scale,
    }
}
