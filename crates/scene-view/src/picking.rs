//! Picking system for ray-collider intersection
//!
//! Provides CPU-based node picking using raycasting against [`Collider`]
//! solids, plus hover enter/leave tracking.

use scene_core::math::{safe_normalize, Ray, Vec2, Vec3};
use scene_core::{Collider, CollisionMask, NodeId, SceneGraph};
use tracing::trace;

use crate::camera::Camera;

/// Nearest intersection found by a pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Node owning the collider that was hit
    pub node: NodeId,
    /// World-space hit point
    pub point: Vec3,
    /// World-space surface normal at the hit
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Hover transition produced by [`ScenePicker::pick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    Enter(NodeId),
    Leave(NodeId),
}

/// Casts rays from the camera into the scene and remembers what is hovered.
///
/// There is no caching between calls: each `pick` traverses every collider
/// matching the mask, so call it at most once per frame.
///
/// Colliders in the priority mask are tested first; handles drawn inside an
/// object stay grabbable.
#[derive(Debug)]
pub struct ScenePicker {
    mask: CollisionMask,
    priority: CollisionMask,
    hovered: Option<NodeId>,
    events: Vec<HoverEvent>,
}

impl ScenePicker {
    pub fn new(mask: CollisionMask) -> Self {
        Self {
            mask,
            priority: CollisionMask::NONE,
            hovered: None,
            events: Vec::new(),
        }
    }

    pub fn mask(&self) -> CollisionMask {
        self.mask
    }

    pub fn set_mask(&mut self, mask: CollisionMask) {
        self.mask = mask;
    }

    pub fn with_priority(mut self, priority: CollisionMask) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> CollisionMask {
        self.priority
    }

    /// Node under the pointer as of the last pick.
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Nearest hit along `ray` without touching hover state. A hit on a
    /// priority collider wins even when another collider is closer.
    pub fn cast(&self, scene: &SceneGraph, ray: &Ray) -> Option<PickHit> {
        let priority = self.mask.intersection(self.priority);
        if priority != CollisionMask::NONE {
            if let Some(hit) = nearest_hit(scene, ray, priority) {
                return Some(hit);
            }
        }
        nearest_hit(scene, ray, self.mask)
    }

    /// Pick through a screen point and update hover state.
    pub fn pick(&mut self, scene: &SceneGraph, camera: &Camera, ndc: Vec2) -> Option<PickHit> {
        let hit = camera
            .ray_from_ndc(ndc)
            .and_then(|ray| self.cast(scene, &ray));
        self.set_hovered(hit.map(|h| h.node));
        hit
    }

    /// The pointer left the viewport: emit a single leave.
    pub fn clear_hover(&mut self) {
        self.set_hovered(None);
    }

    fn set_hovered(&mut self, node: Option<NodeId>) {
        if node == self.hovered {
            return;
        }
        if let Some(old) = self.hovered.take() {
            trace!("hover leave {}", old);
            self.events.push(HoverEvent::Leave(old));
        }
        if let Some(new) = node {
            trace!("hover enter {}", new);
            self.events.push(HoverEvent::Enter(new));
        }
        self.hovered = node;
    }

    /// Hover transitions since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<HoverEvent> {
        std::mem::take(&mut self.events)
    }
}

fn nearest_hit(scene: &SceneGraph, ray: &Ray, mask: CollisionMask) -> Option<PickHit> {
    let mut closest: Option<PickHit> = None;

    for (node, collider) in scene.iter_with::<Collider>() {
        if !collider.mask.intersects(mask) || !scene.is_in_scene(node) {
            continue;
        }
        let Some(hit) = intersect_collider(scene, node, collider, ray) else {
            continue;
        };
        match closest {
            Some(prev) if prev.distance <= hit.distance => {}
            _ => closest = Some(hit),
        }
    }

    closest
}

fn intersect_collider(
    scene: &SceneGraph,
    node: NodeId,
    collider: &Collider,
    ray: &Ray,
) -> Option<PickHit> {
    let world = scene.world_matrix(node)?;
    // zero scale collapses the solid
    if world.determinant().abs() < f32::EPSILON {
        return None;
    }
    let inverse = world.inverse();
    let local_ray = ray.transformed(&inverse)?;
    let local = collider.shape.intersect(&local_ray)?;

    let point = world.transform_point3(local.point);
    let distance = (point - ray.origin).dot(ray.direction);
    if distance < 0.0 {
        return None;
    }
    let normal = safe_normalize(inverse.transpose().transform_vector3(local.normal))
        .unwrap_or(-ray.direction);

    Some(PickHit {
        node,
        point,
        normal,
        distance,
    })
}
