//! The level editor: wires input, picking, selection, gizmos and the
//! command history together and runs them once per frame.

use scene_core::{CollisionMask, Name, NodeId, NodePrototype, SceneGraph};
use tracing::{debug, info, warn};

use crate::command::{
    AddObjectCommand, Command, CommandManager, EditContext, RemoveObjectCommand, SelectCommand,
    TransformCommand,
};
use crate::config::EditorConfig;
use crate::error::{CommandError, EditorError};
use crate::events::{EventBus, EventPayload, HOVER_ENTER, HOVER_LEAVE, SELECTION_CHANGED};
use crate::gizmo::{create_variant, Gizmo, GizmoKind, GizmoManager};
use crate::input::{InputAction, InputQueue, Modifiers, Viewport};
use crate::selection::SelectionManager;
use scene_view::{Camera, HoverEvent};

/// エディタ本体
///
/// The host owns the scene graph and passes it to every call. Input arrives
/// as named events on the [`EventBus`] and is processed by [`LevelEditor::tick`].
#[derive(Debug)]
pub struct LevelEditor {
    config: EditorConfig,
    bus: EventBus,
    input: InputQueue,
    selection: SelectionManager,
    gizmos: GizmoManager,
    commands: CommandManager,
    snapping: bool,
    /// Picking already ran this frame
    picked: bool,
}

impl LevelEditor {
    /// Build the editor: an overlay node under the scene root holds the
    /// active gizmo, and all three gizmos are created up front. The initial
    /// gizmo is placed for `camera`.
    pub fn new(
        scene: &mut SceneGraph,
        bus: &EventBus,
        camera: &Camera,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        config.validate()?;

        let root = scene.root();
        let overlay = scene.spawn(root)?;
        scene.insert(overlay, Name::new("overlay"));

        let mut gizmos = GizmoManager::new(overlay, &config.gizmo);
        for kind in GizmoKind::ALL {
            let gizmo = Gizmo::new(scene, create_variant(kind), &config.gizmo)?;
            gizmos.add_gizmo(scene, kind.name(), gizmo)?;
        }
        gizmos.set_snapping(config.snapping.quantum());
        let initial = config.gizmo.initial.as_deref().and_then(GizmoKind::from_name);
        gizmos.set_active(scene, initial.map(GizmoKind::name), camera)?;

        let pick_mask = config.scene_mask.union(CollisionMask::GIZMO);
        let editor = Self {
            input: InputQueue::connect(bus, &config.bindings),
            selection: SelectionManager::new(pick_mask, config.marquee_min_extent),
            commands: CommandManager::new(config.undo_capacity),
            snapping: config.snapping.enabled,
            bus: bus.clone(),
            gizmos,
            config,
            picked: false,
        };
        info!(
            "level editor ready (gizmo: {}, undo capacity: {})",
            editor.active_gizmo().unwrap_or("none"),
            editor.commands.capacity()
        );
        Ok(editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Currently selected nodes, in selection order.
    pub fn selection(&self) -> &[NodeId] {
        self.selection.current()
    }

    pub fn selection_manager(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.selection.hovered()
    }

    pub fn is_dragging(&self) -> bool {
        self.gizmos.is_dragging()
    }

    pub fn is_drag_selecting(&self) -> bool {
        self.selection.is_drag_selecting()
    }

    pub fn active_gizmo(&self) -> Option<&str> {
        self.gizmos.active_name()
    }

    pub fn gizmos(&self) -> &GizmoManager {
        &self.gizmos
    }

    pub fn command_manager(&self) -> &CommandManager {
        &self.commands
    }

    pub fn is_snapping(&self) -> bool {
        self.snapping
    }

    /// Queue an action as if its event had been published.
    pub fn push_action(&self, action: InputAction) {
        self.input.push(action);
    }

    /// Run one frame: queued input, hover picking, the active drag, then
    /// the gizmo's placement for this camera.
    pub fn tick(&mut self, scene: &mut SceneGraph, viewport: &Viewport<'_>) {
        self.picked = false;
        for action in self.input.drain() {
            self.handle(scene, viewport, action);
        }
        self.ensure_picked(scene, viewport);

        if self.gizmos.is_dragging() {
            if let Some(gizmo) = self.gizmos.active_mut() {
                // a failed drag restores the nodes and ends itself
                if let Err(err) = gizmo.drag(scene, viewport) {
                    warn!("gizmo drag aborted: {}", err);
                }
            }
        } else if let Some(pointer) = viewport.pointer() {
            self.selection.update_drag_select(pointer);
        }

        if let Err(err) = self.gizmos.refresh_active(scene, viewport.camera) {
            warn!("cannot place gizmo: {}", err);
        }
    }

    /// Pick under the pointer at most once per frame, feeding the result to
    /// the active gizmo and publishing hover changes.
    fn ensure_picked(&mut self, scene: &SceneGraph, viewport: &Viewport<'_>) {
        if self.picked {
            return;
        }
        self.picked = true;
        self.selection.update_hover(scene, viewport);
        self.gizmos.hover(self.selection.hovered());

        for event in self.selection.drain_hover_events() {
            match event {
                HoverEvent::Enter(node) => self.bus.publish(HOVER_ENTER, EventPayload::Node(node)),
                HoverEvent::Leave(node) => self.bus.publish(HOVER_LEAVE, EventPayload::Node(node)),
            };
        }
    }

    fn handle(&mut self, scene: &mut SceneGraph, viewport: &Viewport<'_>, action: InputAction) {
        debug!("input {:?}", action);
        match action {
            InputAction::PrimaryDown(modifiers) => self.primary_down(scene, viewport, modifiers),
            InputAction::PrimaryUp => {
                self.ensure_picked(scene, viewport);
                if self.gizmos.is_dragging() {
                    self.finish_drag(scene);
                } else if self.selection.is_drag_selecting() {
                    if let Some(pointer) = viewport.pointer() {
                        self.selection.update_drag_select(pointer);
                    }
                    let nodes = self.selection.stop_drag_select(scene, viewport.camera);
                    self.apply_selection(scene, nodes);
                }
            }
            InputAction::SecondaryDown => {
                self.ensure_picked(scene, viewport);
                if !self.gizmos.is_dragging() && !self.selection.is_drag_selecting() {
                    self.begin_drag(scene, viewport, false);
                }
            }
            InputAction::SecondaryUp => {
                if self.gizmos.is_dragging() {
                    self.finish_drag(scene);
                }
            }
            InputAction::SetActiveGizmo(name) => {
                self.finish_drag(scene);
                if let Err(err) = self.gizmos.set_active(scene, name.as_deref(), viewport.camera) {
                    warn!("cannot switch gizmo: {}", err);
                }
            }
            InputAction::ToggleLocal => {
                self.gizmos.toggle_local();
            }
            InputAction::IncreaseSize => {
                self.gizmos.increase_size();
            }
            InputAction::DecreaseSize => {
                self.gizmos.decrease_size();
            }
            InputAction::FocusLost => {
                self.finish_drag(scene);
                self.selection.cancel_drag_select();
                self.selection.clear_hover();
                self.gizmos.hover(None);
            }
            InputAction::ToggleSnapping => self.set_snapping(!self.snapping),
            InputAction::Undo => {
                self.undo(scene, 1);
            }
            InputAction::Redo => {
                self.redo(scene, 1);
            }
            InputAction::DeleteSelection => {
                if let Err(err) = self.remove_selected(scene) {
                    warn!("cannot delete selection: {}", err);
                }
            }
        }
    }

    /// Grab the hovered gizmo axis, or start a marquee.
    fn primary_down(&mut self, scene: &mut SceneGraph, viewport: &Viewport<'_>, modifiers: Modifiers) {
        self.ensure_picked(scene, viewport);
        if self.gizmos.is_dragging() || self.begin_drag(scene, viewport, true) {
            return;
        }
        if let Some(pointer) = viewport.pointer() {
            self.selection.start_drag_select(pointer, modifiers.append());
        }
    }

    /// Returns whether a gizmo drag started.
    fn begin_drag(&mut self, scene: &mut SceneGraph, viewport: &Viewport<'_>, primary: bool) -> bool {
        let Some(gizmo) = self.gizmos.active_mut() else {
            return false;
        };
        let started = if primary {
            gizmo.primary_down(scene, viewport)
        } else {
            gizmo.secondary_down(scene, viewport)
        };
        match started {
            Ok(true) => true,
            Ok(false) => false,
            Err(err) => {
                warn!("cannot start gizmo drag: {}", err);
                false
            }
        }
    }

    /// End the active drag and record what it changed.
    fn finish_drag(&mut self, scene: &mut SceneGraph) {
        let Some(gizmo) = self.gizmos.active_mut().filter(|g| g.is_dragging()) else {
            return;
        };
        let changes = gizmo.end_drag(scene);
        if changes.is_empty() {
            return;
        }
        if let Err(err) = self.execute(scene, Box::new(TransformCommand::new(changes))) {
            warn!("cannot record transform: {}", err);
        }
    }

    fn apply_selection(&mut self, scene: &mut SceneGraph, nodes: Vec<NodeId>) {
        if nodes.as_slice() == self.selection.current() {
            return;
        }
        if let Err(err) = self.execute(scene, Box::new(SelectCommand::new(nodes))) {
            warn!("cannot select: {}", err);
        }
    }

    /// Attach the gizmos to the selection and tell listeners, if it changed.
    fn sync_selection(&mut self) {
        if self.selection.current() == self.gizmos.attached() {
            return;
        }
        let nodes = self.selection.current().to_vec();
        debug!("selection changed: {} node(s)", nodes.len());
        self.gizmos.attach_nodes(&nodes);
        self.bus.publish(SELECTION_CHANGED, EventPayload::None);
    }

    /// Execute and record `command`.
    pub fn execute(&mut self, scene: &mut SceneGraph, command: Box<dyn Command>) -> Result<(), CommandError> {
        let mut ctx = EditContext::new(scene, self.selection.selection_mut());
        let result = self.commands.execute(&mut ctx, command);
        self.sync_selection();
        result
    }

    /// Undo up to `n` commands, returning how many were undone.
    pub fn undo(&mut self, scene: &mut SceneGraph, n: usize) -> usize {
        self.finish_drag(scene);
        let mut ctx = EditContext::new(scene, self.selection.selection_mut());
        let undone = self.commands.undo(&mut ctx, n);
        self.sync_selection();
        undone
    }

    /// Redo up to `n` commands, returning how many were redone.
    pub fn redo(&mut self, scene: &mut SceneGraph, n: usize) -> usize {
        self.finish_drag(scene);
        let mut ctx = EditContext::new(scene, self.selection.selection_mut());
        let redone = self.commands.redo(&mut ctx, n);
        self.sync_selection();
        redone
    }

    /// Select `nodes` (resolved to top-level selectable ancestors) through
    /// an undoable command. Returns whether the selection changed.
    pub fn select(&mut self, scene: &mut SceneGraph, nodes: &[NodeId], append: bool) -> Result<bool, CommandError> {
        let next = self.selection.resolve(scene, nodes, append);
        if next.as_slice() == self.selection.current() {
            return Ok(false);
        }
        self.execute(scene, Box::new(SelectCommand::new(next)))?;
        Ok(true)
    }

    pub fn deselect_all(&mut self, scene: &mut SceneGraph) -> Result<bool, CommandError> {
        self.select(scene, &[], false)
    }

    /// Instantiate `prototype` under `parent` (the scene root by default).
    pub fn add_object(
        &mut self,
        scene: &mut SceneGraph,
        prototype: NodePrototype,
        parent: Option<NodeId>,
    ) -> Result<NodeId, CommandError> {
        let parent = parent.unwrap_or_else(|| scene.root());
        self.execute(scene, Box::new(AddObjectCommand::new(prototype, parent)))?;
        // instantiation appends under the parent
        scene
            .children(parent)
            .last()
            .copied()
            .ok_or_else(|| CommandError::Rejected("added node is missing".into()))
    }

    /// Remove the selected nodes. Returns false when nothing is selected.
    pub fn remove_selected(&mut self, scene: &mut SceneGraph) -> Result<bool, CommandError> {
        self.finish_drag(scene);
        let nodes = self.selection.current().to_vec();
        if nodes.is_empty() {
            return Ok(false);
        }
        self.execute(scene, Box::new(RemoveObjectCommand::new(nodes)))?;
        Ok(true)
    }

    pub fn set_snapping(&mut self, enabled: bool) {
        self.snapping = enabled;
        let quantum = enabled.then_some(self.config.snapping.translate_quantum);
        self.gizmos.set_snapping(quantum);
        debug!("snapping: {:?}", quantum);
    }
}
