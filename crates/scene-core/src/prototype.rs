//! Templates for objects the editor can add to a scene.

use crate::components::{Collider, Name, Selectable, Transform};
use crate::graph::{NodeId, SceneError, SceneGraph};
use crate::math::Vec3;

/// A node tree to instantiate, e.g. a cube with a box collider.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePrototype {
    pub name: String,
    pub transform: Transform,
    pub collider: Option<Collider>,
    pub selectable: bool,
    pub children: Vec<NodePrototype>,
}

impl NodePrototype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            collider: None,
            selectable: true,
            children: Vec::new(),
        }
    }

    /// Selectable unit cube with a matching box collider.
    pub fn cube(name: impl Into<String>) -> Self {
        Self::new(name).with_collider(Collider::unit_box())
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_child(mut self, child: NodePrototype) -> Self {
        self.children.push(child);
        self
    }

    /// Child parts are usually not selectable on their own.
    pub fn unselectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    /// Build the tree under `parent` and return the top node.
    pub fn instantiate(&self, scene: &mut SceneGraph, parent: NodeId) -> Result<NodeId, SceneError> {
        let node = scene.spawn(parent)?;
        scene.set_transform(node, self.transform)?;
        scene.insert(node, Name::new(self.name.clone()));
        if let Some(collider) = self.collider {
            scene.insert(node, collider);
        }
        if self.selectable {
            scene.insert(node, Selectable);
        }
        for child in &self.children {
            child.instantiate(scene, node)?;
        }
        Ok(node)
    }
}
