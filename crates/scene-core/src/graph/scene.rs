use std::any::TypeId;
use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use super::component::{AnyStorage, Component};
use super::node::NodeId;
use super::storage::ComponentStorage;
use crate::components::{Name, Transform};
use crate::math::{Mat4, Vec3};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0} does not exist")]
    DeadNode(NodeId),
    #[error("cannot parent {node} under its own descendant {parent}")]
    Cycle { node: NodeId, parent: NodeId },
    #[error("the scene root cannot be moved or removed")]
    Root,
}

/// ノード生存情報と階層
struct NodeMeta {
    /// 現在の世代番号
    generation: u32,
    /// 生存フラグ
    alive: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Scene graph owning every node, its hierarchy and its components.
///
/// Nodes that are alive but have no parent (other than the root) are
/// *detached*: they keep their id and components but are invisible to
/// picking and selection until attached again.
pub struct SceneGraph {
    nodes: Vec<NodeMeta>,
    /// 再利用可能なインデックス
    free_list: Vec<u32>,
    /// 型ごとのコンポーネントストレージ
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
    root: NodeId,
}

impl SceneGraph {
    /// Create a graph containing only the root node.
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            storages: HashMap::new(),
            root: NodeId::new(0, 1),
        };
        let root = graph.alloc();
        graph.insert(root, Name::new("render"));
        graph.root = root;
        graph
    }

    /// The renderable scene root.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self) -> NodeId {
        let node = if let Some(index) = self.free_list.pop() {
            // 再利用: 世代番号をインクリメント
            let meta = &mut self.nodes[index as usize];
            meta.generation += 1;
            meta.alive = true;
            NodeId::new(index, meta.generation)
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(NodeMeta {
                generation: 1,
                alive: true,
                parent: None,
                children: Vec::new(),
            });
            NodeId::new(index, 1)
        };
        self.insert(node, Transform::identity());
        node
    }

    /// Spawn a node with an identity transform as the last child of `parent`.
    pub fn spawn(&mut self, parent: NodeId) -> Result<NodeId, SceneError> {
        self.check_alive(parent)?;
        let node = self.alloc();
        self.link(node, parent, None);
        Ok(node)
    }

    /// Spawn a node that is not part of the visible scene yet.
    pub fn spawn_detached(&mut self) -> NodeId {
        self.alloc()
    }

    /// Permanently delete a node and its whole subtree.
    /// 成功時true、既に削除済みまたは無効なノードの場合false
    pub fn despawn(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.is_alive(node) {
            return false;
        }
        self.unlink(node);

        let subtree = self.subtree(node);
        trace!("despawn {} ({} node(s))", node, subtree.len());
        for id in subtree {
            let meta = &mut self.nodes[id.index() as usize];
            meta.alive = false;
            meta.parent = None;
            meta.children.clear();
            self.free_list.push(id.index());

            // 全ストレージからコンポーネントを削除
            for storage in self.storages.values_mut() {
                storage.remove(id);
            }
        }
        true
    }

    /// ノードが生存しているか確認
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.index() as usize)
            .is_some_and(|meta| meta.alive && meta.generation == node.generation())
    }

    fn check_alive(&self, node: NodeId) -> Result<(), SceneError> {
        if self.is_alive(node) {
            Ok(())
        } else {
            Err(SceneError::DeadNode(node))
        }
    }

    fn meta(&self, node: NodeId) -> Option<&NodeMeta> {
        self.is_alive(node).then(|| &self.nodes[node.index() as usize])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.meta(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.meta(node).map(|m| m.children.as_slice()).unwrap_or(&[])
    }

    /// Index of `node` within its parent's children.
    pub fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|c| *c == node)
    }

    /// True when `node` is reachable from the root.
    pub fn is_in_scene(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if !self.is_alive(current) {
                return false;
            }
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Move `node` under `parent` at `index` (appended when `None`).
    /// The local transform is kept as is.
    pub fn set_parent(
        &mut self,
        node: NodeId,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<(), SceneError> {
        self.check_alive(node)?;
        self.check_alive(parent)?;
        if node == self.root {
            return Err(SceneError::Root);
        }
        if self.is_ancestor_of(node, parent) {
            return Err(SceneError::Cycle { node, parent });
        }
        self.unlink(node);
        self.link(node, parent, index);
        Ok(())
    }

    /// Remove `node` from the visible hierarchy, keeping its id and subtree.
    /// Returns where it was so the caller can put it back.
    pub fn detach(&mut self, node: NodeId) -> Result<Option<(NodeId, usize)>, SceneError> {
        self.check_alive(node)?;
        if node == self.root {
            return Err(SceneError::Root);
        }
        let previous = self.parent(node).zip(self.sibling_index(node));
        self.unlink(node);
        Ok(previous)
    }

    fn link(&mut self, node: NodeId, parent: NodeId, index: Option<usize>) {
        let children = &mut self.nodes[parent.index() as usize].children;
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, node);
        self.nodes[node.index() as usize].parent = Some(parent);
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index() as usize].parent.take() {
            self.nodes[parent.index() as usize]
                .children
                .retain(|c| *c != node);
        }
    }

    /// `node` and all its descendants in pre-order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if !self.is_alive(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// コンポーネントを追加
    pub fn insert<T: Component>(&mut self, node: NodeId, component: T) {
        if !self.is_alive(node) {
            return;
        }
        self.get_or_create_storage::<T>().insert(node, component);
    }

    /// コンポーネントを取得（不変参照）
    pub fn get<T: Component>(&self, node: NodeId) -> Option<&T> {
        if !self.is_alive(node) {
            return None;
        }
        self.get_storage::<T>()?.get(node)
    }

    /// コンポーネントを取得（可変参照）
    pub fn get_mut<T: Component>(&mut self, node: NodeId) -> Option<&mut T> {
        if !self.is_alive(node) {
            return None;
        }
        self.get_storage_mut::<T>()?.get_mut(node)
    }

    /// コンポーネントを削除
    pub fn remove<T: Component>(&mut self, node: NodeId) -> Option<T> {
        if !self.is_alive(node) {
            return None;
        }
        self.get_storage_mut::<T>()?.remove(node)
    }

    pub fn has<T: Component>(&self, node: NodeId) -> bool {
        self.get::<T>(node).is_some()
    }

    /// 全ノードをイテレート（切り離されたノードも含む）
    pub fn iter_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.alive)
            .map(|(index, meta)| NodeId::new(index as u32, meta.generation))
    }

    /// 生存ノード数を取得（ルートを含む）
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|meta| meta.alive).count()
    }

    /// 指定したコンポーネントを持つノードとコンポーネントをイテレート
    pub fn iter_with<T: Component>(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.get_storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.iter())
            .filter(move |(node, _)| self.is_alive(*node))
    }

    fn get_or_create_storage<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("type mismatch in storage")
    }

    fn get_storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    fn get_storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Local transform of `node`.
    pub fn transform(&self, node: NodeId) -> Option<Transform> {
        self.get::<Transform>(node).copied()
    }

    pub fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        let slot = self
            .get_mut::<Transform>(node)
            .ok_or(SceneError::DeadNode(node))?;
        *slot = transform;
        Ok(())
    }

    /// Local-to-world matrix.
    pub fn world_matrix(&self, node: NodeId) -> Option<Mat4> {
        let local = self.transform(node)?.to_matrix();
        Some(self.parent_world_matrix(node) * local)
    }

    /// World matrix of the parent, identity for roots and detached nodes.
    pub fn parent_world_matrix(&self, node: NodeId) -> Mat4 {
        self.parent(node)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_transform(&self, node: NodeId) -> Option<Transform> {
        self.world_matrix(node).map(Transform::from_matrix)
    }

    pub fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.world_matrix(node).map(|m| m.w_axis.truncate())
    }

    /// Set the transform of `node` so that it ends up at `world` in world space.
    pub fn set_world_transform(&mut self, node: NodeId, world: &Transform) -> Result<(), SceneError> {
        self.check_alive(node)?;
        let parent_inv = self.parent_world_matrix(node).inverse();
        let local = Transform::from_matrix(parent_inv * world.to_matrix());
        self.set_transform(node, local)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[derive(Debug, PartialEq, Clone)]
    struct Tag(u32);
    impl Component for Tag {}

    #[test]
    fn test_new_graph_has_root() {
        let graph = SceneGraph::new();
        assert!(graph.is_alive(graph.root()));
        assert!(graph.is_in_scene(graph.root()));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get::<Name>(graph.root()).unwrap().as_str(), "render");
    }

    #[test]
    fn test_spawn_links_child() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root).unwrap();
        let b = graph.spawn(root).unwrap();

        assert_eq!(graph.children(root), &[a, b]);
        assert_eq!(graph.parent(a), Some(root));
        assert_eq!(graph.transform(a), Some(Transform::identity()));
    }

    #[test]
    fn test_despawn_removes_subtree_and_reuses_index() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root()).unwrap();
        let child = graph.spawn(a).unwrap();
        graph.insert(child, Tag(1));

        assert!(graph.despawn(a));
        assert!(!graph.is_alive(a));
        assert!(!graph.is_alive(child));
        assert!(graph.children(graph.root()).is_empty());
        assert_eq!(graph.get::<Tag>(child), None);

        let reused = graph.spawn(graph.root()).unwrap();
        assert!(reused.index() == a.index() || reused.index() == child.index());
        assert!(reused.generation() >= 2);
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        assert!(!graph.despawn(root));
        assert_eq!(graph.detach(root), Err(SceneError::Root));
    }

    #[test]
    fn test_detach_and_reattach_keeps_id() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root).unwrap();
        let b = graph.spawn(root).unwrap();

        let previous = graph.detach(a).unwrap();
        assert_eq!(previous, Some((root, 0)));
        assert!(graph.is_alive(a));
        assert!(!graph.is_in_scene(a));

        graph.set_parent(a, root, Some(0)).unwrap();
        assert_eq!(graph.children(root), &[a, b]);
        assert!(graph.is_in_scene(a));
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root()).unwrap();
        let b = graph.spawn(a).unwrap();
        assert_eq!(
            graph.set_parent(a, b, None),
            Err(SceneError::Cycle { node: a, parent: b })
        );
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn(graph.root()).unwrap();
        graph
            .set_transform(
                parent,
                Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::splat(2.0)),
            )
            .unwrap();
        let child = graph.spawn(parent).unwrap();
        graph
            .set_transform(child, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();

        let pos = graph.world_position(child).unwrap();
        assert!((pos - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_set_world_transform_under_rotated_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn(graph.root()).unwrap();
        graph
            .set_transform(
                parent,
                Transform::identity().with_rotation(Quat::from_rotation_z(1.0)),
            )
            .unwrap();
        let child = graph.spawn(parent).unwrap();

        let target = Transform::from_position(Vec3::new(3.0, 4.0, 5.0));
        graph.set_world_transform(child, &target).unwrap();
        let world = graph.world_transform(child).unwrap();
        assert!(world.abs_diff_eq(&target, 1e-5));
    }

    #[test]
    fn test_subtree_preorder() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root()).unwrap();
        let a1 = graph.spawn(a).unwrap();
        let a2 = graph.spawn(a).unwrap();
        let a11 = graph.spawn(a1).unwrap();
        assert_eq!(graph.subtree(a), vec![a, a1, a11, a2]);
    }

    #[test]
    fn test_iter_with_skips_dead() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(graph.root()).unwrap();
        let b = graph.spawn(graph.root()).unwrap();
        graph.insert(a, Tag(1));
        graph.insert(b, Tag(2));
        graph.despawn(a);

        let tagged: Vec<_> = graph.iter_with::<Tag>().map(|(id, _)| id).collect();
        assert_eq!(tagged, vec![b]);
    }

    #[test]
    fn test_dead_node_operations() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn(graph.root()).unwrap();
        graph.despawn(node);

        graph.insert(node, Tag(1));
        assert_eq!(graph.get::<Tag>(node), None);
        assert_eq!(
            graph.set_transform(node, Transform::identity()),
            Err(SceneError::DeadNode(node))
        );
        assert!(graph.spawn(node).is_err());
    }
}
