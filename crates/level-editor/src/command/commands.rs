//! Editor commands

use scene_core::{NodeId, NodePrototype, SceneError, SceneGraph};
use tracing::debug;

use super::{Command, EditContext};
use crate::error::CommandError;
use crate::gizmo::TransformChange;

/// Despawn `node` if it is alive but no longer part of the scene.
fn despawn_detached(scene: &mut SceneGraph, node: NodeId) {
    if scene.is_alive(node) && !scene.is_in_scene(node) && scene.despawn(node) {
        debug!("released node {}", node);
    }
}

/// Replace the selection
#[derive(Debug, Clone)]
pub struct SelectCommand {
    after: Vec<NodeId>,
    before: Option<Vec<NodeId>>,
}

impl SelectCommand {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            after: nodes,
            before: None,
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.after
    }
}

impl Command for SelectCommand {
    fn name(&self) -> &str {
        "select"
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        if self.before.is_none() {
            self.before = Some(ctx.selection.nodes().to_vec());
        }
        ctx.selection.replace(ctx.scene, &self.after);
        Ok(())
    }

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        let before = self.before.as_deref().unwrap_or_default();
        ctx.selection.replace(ctx.scene, before);
        Ok(())
    }
}

/// Set local transforms, e.g. the result of a gizmo drag
#[derive(Debug, Clone)]
pub struct TransformCommand {
    changes: Vec<TransformChange>,
}

impl TransformCommand {
    pub fn new(changes: Vec<TransformChange>) -> Self {
        Self { changes }
    }

    pub fn changes(&self) -> &[TransformChange] {
        &self.changes
    }
}

impl Command for TransformCommand {
    fn name(&self) -> &str {
        "transform"
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        for change in &self.changes {
            ctx.scene.set_transform(change.node, change.after)?;
        }
        Ok(())
    }

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        for change in self.changes.iter().rev() {
            ctx.scene.set_transform(change.node, change.before)?;
        }
        Ok(())
    }
}

/// Instantiate a prototype under `parent`.
///
/// Undo detaches the new node instead of deleting it, so redo brings back
/// the very same node id.
#[derive(Debug, Clone)]
pub struct AddObjectCommand {
    prototype: NodePrototype,
    parent: NodeId,
    node: Option<NodeId>,
    slot: Option<usize>,
}

impl AddObjectCommand {
    pub fn new(prototype: NodePrototype, parent: NodeId) -> Self {
        Self {
            prototype,
            parent,
            node: None,
            slot: None,
        }
    }

    /// The created node, once executed.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl Command for AddObjectCommand {
    fn name(&self) -> &str {
        "add-object"
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        match self.node.filter(|n| ctx.scene.is_alive(*n)) {
            Some(node) => ctx.scene.set_parent(node, self.parent, self.slot)?,
            None => {
                let node = self.prototype.instantiate(ctx.scene, self.parent)?;
                debug!("added {} as {}", self.prototype.name, node);
                self.node = Some(node);
            }
        }
        Ok(())
    }

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        let node = self
            .node
            .ok_or_else(|| CommandError::Rejected("add-object was never executed".into()))?;
        self.slot = ctx.scene.detach(node)?.map(|(_, index)| index);
        Ok(())
    }

    fn release(&mut self, scene: &mut SceneGraph) {
        if let Some(node) = self.node {
            despawn_detached(scene, node);
        }
    }
}

/// Take nodes out of the scene, deselecting them.
///
/// The nodes are detached and kept alive until the command leaves the
/// history, so undo puts back the same ids at their old sibling index.
#[derive(Debug, Clone)]
pub struct RemoveObjectCommand {
    nodes: Vec<NodeId>,
    /// (node, parent, sibling index) in removal order
    slots: Vec<(NodeId, NodeId, usize)>,
    selection: Vec<NodeId>,
}

impl RemoveObjectCommand {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes,
            slots: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

impl Command for RemoveObjectCommand {
    fn name(&self) -> &str {
        "remove-object"
    }

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        if let Some(dead) = self.nodes.iter().find(|n| !ctx.scene.is_alive(**n)) {
            return Err(SceneError::DeadNode(*dead).into());
        }
        if !self.nodes.iter().any(|n| ctx.scene.is_in_scene(*n)) {
            return Err(CommandError::Rejected("nothing to remove".into()));
        }

        self.selection = ctx.selection.nodes().to_vec();
        let remaining: Vec<NodeId> = self
            .selection
            .iter()
            .copied()
            .filter(|s| !self.nodes.iter().any(|n| ctx.scene.is_ancestor_of(*n, *s)))
            .collect();
        ctx.selection.replace(ctx.scene, &remaining);

        self.slots.clear();
        for node in &self.nodes {
            if let Some((parent, index)) = ctx.scene.detach(*node)? {
                self.slots.push((*node, parent, index));
            }
        }
        Ok(())
    }

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
        for (node, parent, index) in self.slots.iter().rev() {
            ctx.scene.set_parent(*node, *parent, Some(*index))?;
        }
        ctx.selection.replace(ctx.scene, &self.selection);
        Ok(())
    }

    fn release(&mut self, scene: &mut SceneGraph) {
        for node in &self.nodes {
            despawn_detached(scene, *node);
        }
    }
}
