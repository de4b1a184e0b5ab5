//! Rectangle (marquee) selection in normalized screen space

use scene_core::math::Vec2;
use scene_core::{NodeId, SceneGraph, Selectable};
use scene_view::Camera;
use tracing::debug;

/// Axis-aligned rectangle in normalized screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    /// Rectangle spanned by two corners, at least `min_extent` wide and tall.
    pub fn from_corners(anchor: Vec2, corner: Vec2, min_extent: f32) -> Self {
        let extend = |a: f32, c: f32| {
            let size = c - a;
            if size.abs() >= min_extent {
                c
            } else if size < 0.0 {
                a - min_extent
            } else {
                a + min_extent
            }
        };
        let corner = Vec2::new(extend(anchor.x, corner.x), extend(anchor.y, corner.y));
        Self {
            min: anchor.min(corner),
            max: anchor.max(corner),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Drag-selection tool. Inactive until [`Marquee::start`].
#[derive(Debug)]
pub struct Marquee {
    anchor: Option<Vec2>,
    corner: Vec2,
    append: bool,
    min_extent: f32,
}

impl Marquee {
    pub fn new(min_extent: f32) -> Self {
        Self {
            anchor: None,
            corner: Vec2::ZERO,
            append: false,
            min_extent,
        }
    }

    /// Anchor the rectangle at the pointer.
    pub fn start(&mut self, pointer: Vec2, append: bool) {
        self.anchor = Some(pointer);
        self.corner = pointer;
        self.append = append;
    }

    /// Stretch to the pointer.
    pub fn update(&mut self, pointer: Vec2) {
        if self.anchor.is_some() {
            self.corner = pointer;
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    /// Whether the drag was started in append mode.
    pub fn append(&self) -> bool {
        self.append
    }

    pub fn rect(&self) -> Option<ScreenRect> {
        self.anchor
            .map(|anchor| ScreenRect::from_corners(anchor, self.corner, self.min_extent))
    }

    /// Abort without selecting anything.
    pub fn cancel(&mut self) {
        self.anchor = None;
    }

    /// End the drag and return every selectable node whose world position
    /// projects inside the rectangle. Nodes behind the camera are skipped.
    pub fn stop(&mut self, scene: &SceneGraph, camera: &Camera) -> Vec<NodeId> {
        let Some(rect) = self.rect() else {
            return Vec::new();
        };
        self.anchor = None;

        let contained: Vec<NodeId> = scene
            .iter_with::<Selectable>()
            .map(|(node, _)| node)
            .filter(|node| scene.is_in_scene(*node))
            .filter(|node| {
                scene
                    .world_position(*node)
                    .and_then(|p| camera.project_to_ndc(p))
                    .is_some_and(|ndc| rect.contains(ndc))
            })
            .collect();

        debug!("marquee {:?} contains {} node(s)", rect, contained.len());
        contained
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

    #[test]
    fn test_rect_min_extent() {
        let rect = ScreenRect::from_corners(Vec2::new(0.2, 0.2), Vec2::new(0.2, 0.2), 0.01);
        assert!((rect.size() - Vec2::splat(0.01)).length() < 1e-6);

        let rect = ScreenRect::from_corners(Vec2::new(0.5, 0.5), Vec2::new(-0.5, 0.5), 0.01);
        assert_eq!(rect.min, Vec2::new(-0.5, 0.5));
        assert!((rect.max.y - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_stop_without_start_is_empty() {
        let scene = SceneGraph::new();
        let mut marquee = Marquee::new(0.001);
        assert!(marquee.stop(&scene, &camera()).is_empty());
    }

    #[test]
    fn test_contains_projected_positions() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let left = NodePrototype::cube("Left")
            .at(Vec3::new(-2.0, 0.0, 0.0))
            .instantiate(&mut scene, root)
            .unwrap();
        let right = NodePrototype::cube("Right")
            .at(Vec3::new(2.0, 0.0, 0.0))
            .instantiate(&mut scene, root)
            .unwrap();
        // behind the camera
        NodePrototype::cube("Behind")
            .at(Vec3::new(0.0, 0.0, 20.0))
            .instantiate(&mut scene, root)
            .unwrap();

        let mut marquee = Marquee::new(0.001);
        marquee.start(Vec2::new(-1.0, -1.0), false);
        marquee.update(Vec2::new(0.0, 1.0));
        assert!(marquee.is_active());
        assert_eq!(marquee.stop(&scene, &camera()), vec![left]);
        assert!(!marquee.is_active());

        marquee.start(Vec2::new(1.0, 1.0), true);
        marquee.update(Vec2::new(-1.0, -1.0));
        assert!(marquee.append());
        assert_eq!(marquee.stop(&scene, &camera()), vec![left, right]);
    }

    #[test]
    fn test_cancel() {
        let mut marquee = Marquee::new(0.001);
        marquee.start(Vec2::ZERO, false);
        marquee.cancel();
        assert!(marquee.rect().is_none());
    }
}
