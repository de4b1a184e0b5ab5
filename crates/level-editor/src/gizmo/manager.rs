use scene_core::{NodeId, SceneError, SceneGraph};
use scene_view::Camera;
use tracing::{debug, info};

use super::base::Gizmo;
use crate::config::GizmoConfig;

/// Registry of named gizmos with at most one active at a time.
///
/// Attached nodes, local mode, size factor and snapping apply to every
/// registered gizmo so switching keeps them.
#[derive(Debug)]
pub struct GizmoManager {
    gizmos: Vec<(String, Gizmo)>,
    active: Option<usize>,
    overlay: NodeId,
    local: bool,
    size: f32,
    size_step: f32,
    min_size: f32,
    max_size: f32,
    snap_quantum: Option<f32>,
    attached: Vec<NodeId>,
}

impl GizmoManager {
    /// `overlay` is the node active gizmos are parented under.
    pub fn new(overlay: NodeId, config: &GizmoConfig) -> Self {
        Self {
            gizmos: Vec::new(),
            active: None,
            overlay,
            local: config.local,
            size: 1.0,
            size_step: config.size_step,
            min_size: config.min_size,
            max_size: config.max_size,
            snap_quantum: None,
            attached: Vec::new(),
        }
    }

    pub fn overlay(&self) -> NodeId {
        self.overlay
    }

    /// Register `gizmo` under `name`, returning the gizmo it replaces.
    ///
    /// Replacing the active gizmo stops the old one and activates the new
    /// one in its place.
    pub fn add_gizmo(
        &mut self,
        scene: &mut SceneGraph,
        name: impl Into<String>,
        mut gizmo: Gizmo,
    ) -> Result<Option<Gizmo>, SceneError> {
        let name = name.into();
        gizmo.set_local(self.local);
        gizmo.set_size(self.size);
        gizmo.set_snapping(self.snap_quantum);
        gizmo.attach(&self.attached);
        let Some(index) = self.gizmos.iter().position(|(n, _)| *n == name) else {
            self.gizmos.push((name, gizmo));
            return Ok(None);
        };

        let mut old = std::mem::replace(&mut self.gizmos[index].1, gizmo);
        if self.active == Some(index) {
            old.stop(scene)?;
            self.gizmos[index].1.start();
            debug!("replaced active gizmo {}", self.gizmos[index].0);
        }
        Ok(Some(old))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gizmos.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Gizmo> {
        self.gizmos.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    pub fn active(&self) -> Option<&Gizmo> {
        self.active.map(|i| &self.gizmos[i].1)
    }

    pub fn active_mut(&mut self) -> Option<&mut Gizmo> {
        let index = self.active?;
        self.gizmos.get_mut(index).map(|(_, gizmo)| gizmo)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.map(|i| self.gizmos[i].0.as_str())
    }

    pub fn is_dragging(&self) -> bool {
        self.active().is_some_and(Gizmo::is_dragging)
    }

    /// Switch the active gizmo. `None` (or an unknown name) leaves no gizmo
    /// active. The previous gizmo is stopped, cancelling any drag; the new
    /// one is started and placed for `camera` right away.
    pub fn set_active(
        &mut self,
        scene: &mut SceneGraph,
        name: Option<&str>,
        camera: &Camera,
    ) -> Result<(), SceneError> {
        let next = name.and_then(|name| self.gizmos.iter().position(|(n, _)| n == name));
        if next == self.active {
            return Ok(());
        }
        if let Some(gizmo) = self.active_mut() {
            gizmo.stop(scene)?;
        }

        self.active = next;
        if let Some(gizmo) = self.active_mut() {
            gizmo.start();
        }
        info!("active gizmo: {}", self.active_name().unwrap_or("none"));
        self.refresh_active(scene, camera)
    }

    pub fn attach_nodes(&mut self, nodes: &[NodeId]) {
        self.attached = nodes.to_vec();
        for (_, gizmo) in &mut self.gizmos {
            gizmo.attach(nodes);
        }
    }

    pub fn attached(&self) -> &[NodeId] {
        &self.attached
    }

    /// Re-place the active gizmo for this frame's camera.
    pub fn refresh_active(&mut self, scene: &mut SceneGraph, camera: &Camera) -> Result<(), SceneError> {
        let overlay = self.overlay;
        match self.active_mut() {
            Some(gizmo) => gizmo.refresh(scene, overlay, camera),
            None => Ok(()),
        }
    }

    /// Forward the hovered node to the active gizmo.
    pub fn hover(&mut self, node: Option<NodeId>) {
        if let Some(gizmo) = self.active_mut() {
            gizmo.hover(node);
        }
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn set_local(&mut self, local: bool) {
        self.local = local;
        for (_, gizmo) in &mut self.gizmos {
            gizmo.set_local(local);
        }
    }

    pub fn toggle_local(&mut self) -> bool {
        self.set_local(!self.local);
        debug!("gizmo local mode: {}", self.local);
        self.local
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Set the size factor, clamped to the configured range.
    pub fn set_size(&mut self, size: f32) -> f32 {
        self.size = size.clamp(self.min_size, self.max_size);
        for (_, gizmo) in &mut self.gizmos {
            gizmo.set_size(self.size);
        }
        self.size
    }

    pub fn increase_size(&mut self) -> f32 {
        self.set_size(self.size + self.size_step)
    }

    pub fn decrease_size(&mut self) -> f32 {
        self.set_size(self.size - self.size_step)
    }

    pub fn snap_quantum(&self) -> Option<f32> {
        self.snap_quantum
    }

    pub fn set_snapping(&mut self, quantum: Option<f32>) {
        self.snap_quantum = quantum;
        for (_, gizmo) in &mut self.gizmos {
            gizmo.set_snapping(quantum);
        }
    }
}
