use std::any::Any;

/// ノードに付与できるデータのマーカートレイト
/// - `'static`: コンポーネントは参照を持たない
///
/// The editor is single threaded, so unlike a general ECS there is no
/// `Send + Sync` bound.
pub trait Component: 'static {}

/// 型消去されたストレージ
pub(crate) trait AnyStorage {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, node: super::NodeId);
    fn contains(&self, node: super::NodeId) -> bool;
}

impl<T: Component> AnyStorage for super::ComponentStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn remove(&mut self, node: super::NodeId) {
        super::ComponentStorage::remove(self, node);
    }
    fn contains(&self, node: super::NodeId) -> bool {
        super::ComponentStorage::contains(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComponentStorage, NodeId};

    struct Marker;
    impl Component for Marker {}

    #[test]
    fn test_erased_storage_roundtrip() {
        let mut storage: Box<dyn AnyStorage> = Box::new(ComponentStorage::<Marker>::new());
        let node = NodeId::new(0, 1);
        storage
            .as_any_mut()
            .downcast_mut::<ComponentStorage<Marker>>()
            .unwrap()
            .insert(node, Marker);

        assert!(storage.contains(node));
        storage.remove(node);
        assert!(!storage.contains(node));
        assert!(storage.as_any().downcast_ref::<ComponentStorage<Marker>>().is_some());
    }
}
