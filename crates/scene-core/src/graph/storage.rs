use super::component::Component;
use super::node::NodeId;

/// SparseSetベースのコンポーネントストレージ
/// - dense: 実際のデータ配列（連続メモリ）
/// - sparse: NodeId.index -> denseのインデックスへのマッピング
/// - nodes: denseと対応するNodeIdの配列（世代チェックとイテレーション用）
pub struct ComponentStorage<T: Component> {
    dense: Vec<T>,
    nodes: Vec<NodeId>,
    sparse: Vec<Option<usize>>,
}

impl<T: Component> ComponentStorage<T> {
    /// 新しいストレージを作成
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            nodes: Vec::new(),
            sparse: Vec::new(),
        }
    }

    /// コンポーネントを挿入（既存の場合は上書き）
    pub fn insert(&mut self, node: NodeId, component: T) {
        let index = node.index() as usize;

        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, None);
        }

        if let Some(dense_index) = self.sparse[index] {
            self.dense[dense_index] = component;
            self.nodes[dense_index] = node;
        } else {
            let dense_index = self.dense.len();
            self.dense.push(component);
            self.nodes.push(node);
            self.sparse[index] = Some(dense_index);
        }
    }

    /// 世代が一致する場合のみdenseインデックスを返す
    fn dense_index(&self, node: NodeId) -> Option<usize> {
        let dense_index = (*self.sparse.get(node.index() as usize)?)?;
        (self.nodes[dense_index] == node).then_some(dense_index)
    }

    /// コンポーネントを取得（不変参照）
    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.dense_index(node).map(|i| &self.dense[i])
    }

    /// コンポーネントを取得（可変参照）
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        self.dense_index(node).map(|i| &mut self.dense[i])
    }

    /// コンポーネントを削除
    pub fn remove(&mut self, node: NodeId) -> Option<T> {
        let dense_index = self.dense_index(node)?;
        self.sparse[node.index() as usize] = None;

        // 最後の要素と交換して削除（O(1)削除）
        let last_index = self.dense.len() - 1;
        if dense_index != last_index {
            let last_node = self.nodes[last_index];
            self.sparse[last_node.index() as usize] = Some(dense_index);
        }

        self.nodes.swap_remove(dense_index);
        Some(self.dense.swap_remove(dense_index))
    }

    /// 全コンポーネントをイテレート
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes.iter().copied().zip(self.dense.iter())
    }

    /// ストレージ内のコンポーネント数
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// ストレージが空かどうか
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// 指定ノードがコンポーネントを持つか
    pub fn contains(&self, node: NodeId) -> bool {
        self.dense_index(node).is_some()
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
