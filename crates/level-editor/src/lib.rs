//! Selection, manipulator gizmos and undoable editing for a 3D scene.
//!
//! The host owns the [`SceneGraph`](scene_core::SceneGraph) and calls
//! [`LevelEditor::tick`] once per frame with the current camera and pointer.

pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod gizmo;
pub mod input;
pub mod selection;

// Re-exports
pub use command::{
    AddObjectCommand, Command, CommandManager, EditContext, RemoveObjectCommand, SelectCommand,
    TransformCommand,
};
pub use config::{EditorConfig, GizmoConfig, InputBindings, SnapConfig};
pub use editor::LevelEditor;
pub use error::{CommandError, ConfigError, EditorError, GizmoError};
pub use events::{EventBus, EventPayload, Subscription};
pub use gizmo::{Gizmo, GizmoKind, GizmoManager, GizmoPhase};
pub use input::{InputAction, Modifiers, PointerSource, Viewport};
pub use selection::{Selection, SelectionManager};
