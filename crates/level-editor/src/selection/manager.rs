use scene_core::math::Vec2;
use scene_core::{CollisionMask, Highlight, NodeId, SceneGraph, Selectable};
use scene_view::{Camera, HoverEvent, PickHit, ScenePicker};
use tracing::debug;

use super::marquee::Marquee;
use crate::input::Viewport;

/// The selected nodes, in selection order without duplicates.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    nodes: Vec<NodeId>,
}

impl Selection {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replace the selection, moving the `Highlight` marker from nodes that
    /// leave to nodes that enter. Returns whether anything changed.
    pub fn replace(&mut self, scene: &mut SceneGraph, nodes: &[NodeId]) -> bool {
        let mut next: Vec<NodeId> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if scene.is_alive(*node) && !next.contains(node) {
                next.push(*node);
            }
        }
        if next == self.nodes {
            return false;
        }

        for old in &self.nodes {
            if !next.contains(old) {
                scene.remove::<Highlight>(*old);
            }
        }
        for new in &next {
            scene.insert(*new, Highlight);
        }
        self.nodes = next;
        true
    }
}

/// Walk up from `node` and return its highest selectable ancestor
/// (`node` itself if nothing above it is selectable). `None` when neither
/// the node nor any ancestor is selectable.
pub fn top_level_selectable(scene: &SceneGraph, node: NodeId) -> Option<NodeId> {
    let mut found = None;
    let mut current = Some(node);
    while let Some(id) = current {
        if scene.has::<Selectable>(id) {
            found = Some(id);
        }
        current = scene.parent(id);
    }
    found
}

/// Resolve candidates to top-level selectable ancestors, de-duplicated and
/// in first-seen order.
pub fn resolve_top_level(scene: &SceneGraph, candidates: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    for candidate in candidates {
        if let Some(top) = top_level_selectable(scene, *candidate) {
            if !out.contains(&top) {
                out.push(top);
            }
        }
    }
    out
}

/// Owns the selection and composes click picking with marquee dragging.
///
/// The picker gives gizmo handles precedence over scene objects.
#[derive(Debug)]
pub struct SelectionManager {
    picker: ScenePicker,
    marquee: Marquee,
    selection: Selection,
}

impl SelectionManager {
    pub fn new(pick_mask: CollisionMask, marquee_min_extent: f32) -> Self {
        Self {
            picker: ScenePicker::new(pick_mask).with_priority(CollisionMask::GIZMO),
            marquee: Marquee::new(marquee_min_extent),
            selection: Selection::default(),
        }
    }

    pub fn current(&self) -> &[NodeId] {
        self.selection.nodes()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.picker.hovered()
    }

    /// Pick under the pointer, or clear hover when it left the viewport.
    pub fn update_hover(&mut self, scene: &SceneGraph, viewport: &Viewport<'_>) -> Option<PickHit> {
        match viewport.pointer() {
            Some(ndc) => self.picker.pick(scene, viewport.camera, ndc),
            None => {
                self.picker.clear_hover();
                None
            }
        }
    }

    pub fn clear_hover(&mut self) {
        self.picker.clear_hover();
    }

    pub fn drain_hover_events(&mut self) -> Vec<HoverEvent> {
        self.picker.drain_events()
    }

    /// Selection that `set` would produce, without applying it.
    pub fn resolve(&self, scene: &SceneGraph, nodes: &[NodeId], append: bool) -> Vec<NodeId> {
        let mut candidates = if append {
            self.selection.nodes().to_vec()
        } else {
            Vec::new()
        };
        candidates.extend_from_slice(nodes);
        resolve_top_level(scene, &candidates)
    }

    pub fn set(&mut self, scene: &mut SceneGraph, nodes: &[NodeId], append: bool) -> bool {
        let next = self.resolve(scene, nodes, append);
        self.selection.replace(scene, &next)
    }

    pub fn deselect_all(&mut self, scene: &mut SceneGraph) -> bool {
        self.selection.replace(scene, &[])
    }

    pub fn start_drag_select(&mut self, pointer: Vec2, append: bool) {
        debug!("drag select from {:?} (append: {})", pointer, append);
        self.marquee.start(pointer, append);
    }

    pub fn update_drag_select(&mut self, pointer: Vec2) {
        self.marquee.update(pointer);
    }

    pub fn is_drag_selecting(&self) -> bool {
        self.marquee.is_active()
    }

    pub fn cancel_drag_select(&mut self) {
        self.marquee.cancel();
    }

    /// Finish the marquee and return the selection it produces: the contained
    /// nodes plus the hovered node, resolved to top-level ancestors, unioned
    /// with the current selection in append mode. The selection itself is
    /// left untouched so the caller can apply it through a command.
    pub fn stop_drag_select(&mut self, scene: &SceneGraph, camera: &Camera) -> Vec<NodeId> {
        let append = self.marquee.append();
        let mut candidates = self.marquee.stop(scene, camera);
        if let Some(hovered) = self.picker.hovered() {
            candidates.push(hovered);
        }
        self.resolve(scene, &candidates, append)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::math::Vec3;
    use scene_core::NodePrototype;

    fn camera() -> Camera {
        Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0)
    }

    fn spawn_cube(scene: &mut SceneGraph, x: f32) -> NodeId {
        let root = scene.root();
        NodePrototype::cube("Cube")
            .at(Vec3::new(x, 0.0, 0.0))
            .instantiate(scene, root)
            .unwrap()
    }

    #[test]
    fn test_set_then_deselect_all_clears_highlight() {
        let mut scene = SceneGraph::new();
        let a = spawn_cube(&mut scene, -2.0);
        let b = spawn_cube(&mut scene, 2.0);
        let mut manager = SelectionManager::new(CollisionMask::SCENE, 0.001);

        assert!(manager.set(&mut scene, &[a, b], false));
        assert_eq!(manager.current(), &[a, b]);
        assert!(scene.has::<Highlight>(a) && scene.has::<Highlight>(b));

        assert!(manager.deselect_all(&mut scene));
        assert!(manager.current().is_empty());
        assert!(!scene.has::<Highlight>(a));
        assert!(!scene.has::<Highlight>(b));
    }

    #[test]
    fn test_set_deduplicates_and_appends() {
        let mut scene = SceneGraph::new();
        let a = spawn_cube(&mut scene, -2.0);
        let b = spawn_cube(&mut scene, 2.0);
        let mut manager = SelectionManager::new(CollisionMask::SCENE, 0.001);

        manager.set(&mut scene, &[a, a], false);
        assert_eq!(manager.current(), &[a]);

        manager.set(&mut scene, &[b, a], true);
        assert_eq!(manager.current(), &[a, b]);

        // replacing unhighlights the node that left
        manager.set(&mut scene, &[b], false);
        assert!(!scene.has::<Highlight>(a));
        assert!(!manager.set(&mut scene, &[b], false));
    }

    #[test]
    fn test_child_resolves_to_top_level_ancestor() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let parent = NodePrototype::cube("Table")
            .with_child(NodePrototype::cube("Leg").unselectable())
            .with_child(NodePrototype::cube("Cup"))
            .instantiate(&mut scene, root)
            .unwrap();
        let leg = scene.children(parent)[0];
        let cup = scene.children(parent)[1];

        assert_eq!(top_level_selectable(&scene, leg), Some(parent));
        assert_eq!(top_level_selectable(&scene, cup), Some(parent));
        assert_eq!(resolve_top_level(&scene, &[cup, leg, parent]), vec![parent]);

        let loose = scene.spawn(root).unwrap();
        assert_eq!(top_level_selectable(&scene, loose), None);
    }

    #[test]
    fn test_full_viewport_marquee_selects_top_level_only() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = NodePrototype::cube("Group")
            .with_child(NodePrototype::cube("Child").at(Vec3::new(0.0, 1.0, 0.0)))
            .instantiate(&mut scene, root)
            .unwrap();
        let other = spawn_cube(&mut scene, 3.0);

        let mut manager = SelectionManager::new(CollisionMask::SCENE, 0.001);
        manager.start_drag_select(Vec2::new(-1.0, -1.0), false);
        manager.update_drag_select(Vec2::new(1.0, 1.0));
        let selected = manager.stop_drag_select(&scene, &camera());

        assert_eq!(selected, vec![group, other]);
        // nothing applied yet
        assert!(manager.current().is_empty());
    }

    #[test]
    fn test_zero_area_drag_acts_like_click() {
        let mut scene = SceneGraph::new();
        let a = spawn_cube(&mut scene, 0.0);
        let camera = camera();
        let mut manager = SelectionManager::new(CollisionMask::SCENE, 0.001);

        // over the cube but away from its projected center
        let pointer = Vec2::new(0.0, 0.05);
        let viewport = Viewport::new(&camera, &pointer);
        assert_eq!(manager.update_hover(&scene, &viewport).map(|h| h.node), Some(a));

        manager.start_drag_select(pointer, false);
        assert_eq!(manager.stop_drag_select(&scene, &camera), vec![a]);
    }

    #[test]
    fn test_click_on_empty_space_clears() {
        let mut scene = SceneGraph::new();
        let a = spawn_cube(&mut scene, 0.0);
        let camera = camera();
        let mut manager = SelectionManager::new(CollisionMask::SCENE, 0.001);
        manager.set(&mut scene, &[a], false);

        let pointer = Vec2::new(0.8, 0.8);
        manager.update_hover(&scene, &Viewport::new(&camera, &pointer));
        manager.start_drag_select(pointer, false);
        assert!(manager.stop_drag_select(&scene, &camera).is_empty());

        manager.start_drag_select(pointer, true);
        assert_eq!(manager.stop_drag_select(&scene, &camera), vec![a]);
    }
}
