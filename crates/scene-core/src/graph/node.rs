use std::fmt;
use std::num::NonZeroU32;

/// シーンノード識別子（世代番号付き）
/// - index: ノード配列のインデックス
/// - generation: 再利用時の世代番号（削除済みノードとの区別用）
///
/// The scene graph owns the nodes; everything else only stores `NodeId`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: NonZeroU32,
}

impl NodeId {
    /// 新しいNodeIdを作成
    /// generationは1以上である必要がある（0は無効値として予約）
    pub fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation: NonZeroU32::new(generation).expect("generation must be >= 1"),
        }
    }

    /// インデックスを取得
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 世代番号を取得
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
