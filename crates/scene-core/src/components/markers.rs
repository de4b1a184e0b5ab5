//! Tag components used by selection.

use crate::graph::Component;

/// The node can be selected in the viewport. Selection resolves clicked
/// descendants up to the highest ancestor carrying this tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selectable;

impl Component for Selectable {}

/// Bounds highlight shown while the node is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Highlight;

impl Component for Highlight {}
