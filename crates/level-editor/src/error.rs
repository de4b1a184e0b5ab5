use scene_core::SceneError;
use thiserror::Error;

/// Failure of a command's `execute` or `revert`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("command rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GizmoError {
    /// Drag geometry collapsed (axis parallel to the view, gizmo on the camera, ...)
    #[error("degenerate drag geometry on axis {0}")]
    Degenerate(&'static str),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse editor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
