//! Undoable editing
//!
//! Every change the editor makes to the scene goes through a [`Command`]
//! executed by the [`CommandManager`], which keeps the bounded undo history.

mod commands;
mod manager;

use scene_core::SceneGraph;

pub use commands::{AddObjectCommand, RemoveObjectCommand, SelectCommand, TransformCommand};
pub use manager::CommandManager;

use crate::error::CommandError;
use crate::selection::Selection;

/// State a command may touch
pub struct EditContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub selection: &'a mut Selection,
}

impl<'a> EditContext<'a> {
    pub fn new(scene: &'a mut SceneGraph, selection: &'a mut Selection) -> Self {
        Self { scene, selection }
    }
}

/// A reversible edit.
///
/// `revert` must exactly undo `execute` for the same payload, and calling
/// `execute` again after `revert` must redo it.
pub trait Command {
    /// Label shown in the history
    fn name(&self) -> &str;

    fn execute(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError>;

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), CommandError>;

    /// Free anything the command keeps alive for a later redo. Called once
    /// when the command leaves the history for good.
    fn release(&mut self, _scene: &mut SceneGraph) {}
}
