//! Editor configuration
//!
//! Everything the host may want to tune without recompiling: history depth,
//! gizmo sizing, snapping and the names of the input events the editor
//! listens to. Missing fields in the JSON fall back to the defaults below.

use scene_core::CollisionMask;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of commands kept for undo
pub const DEFAULT_UNDO_CAPACITY: usize = 20;

/// Default divisor K in `scale = distance / K`
pub const DEFAULT_SCREEN_DIVISOR: f32 = 6.0;

/// Default step applied by increase/decrease size events
pub const DEFAULT_SIZE_STEP: f32 = 0.1;

/// Default size factor bounds
pub const DEFAULT_MIN_SIZE: f32 = 0.2;
pub const DEFAULT_MAX_SIZE: f32 = 5.0;

/// Smallest scale component the scale gizmo may produce
pub const DEFAULT_MIN_SCALE: f32 = 1e-3;

/// Default translation grid quantum in world units
pub const DEFAULT_SNAP_QUANTUM: f32 = 0.5;

/// Smallest marquee extent in normalized screen units
pub const DEFAULT_MARQUEE_MIN_EXTENT: f32 = 1e-3;

/// Gizmo tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoConfig {
    /// K in `scale = distance / K * size`
    pub screen_divisor: f32,
    pub size_step: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_scale: f32,
    /// Start in local orientation mode
    pub local: bool,
    /// Gizmo activated at startup (`None` = no gizmo)
    pub initial: Option<String>,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            screen_divisor: DEFAULT_SCREEN_DIVISOR,
            size_step: DEFAULT_SIZE_STEP,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            min_scale: DEFAULT_MIN_SCALE,
            local: false,
            initial: Some("translate".to_string()),
        }
    }
}

/// Grid snapping for translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    pub translate_quantum: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            translate_quantum: DEFAULT_SNAP_QUANTUM,
        }
    }
}

impl SnapConfig {
    /// Quantum to snap to, if snapping is on
    pub fn quantum(&self) -> Option<f32> {
        self.enabled.then_some(self.translate_quantum)
    }
}

/// Host event names the editor subscribes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBindings {
    pub primary_down: String,
    pub primary_up: String,
    pub secondary_down: String,
    pub secondary_up: String,
    pub set_active_gizmo: String,
    pub toggle_local: String,
    pub increase_size: String,
    pub decrease_size: String,
    pub focus_lost: String,
    pub toggle_snapping: String,
    pub undo: String,
    pub redo: String,
    pub delete_selection: String,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            primary_down: "primary-button-down".to_string(),
            primary_up: "primary-button-up".to_string(),
            secondary_down: "secondary-button-down".to_string(),
            secondary_up: "secondary-button-up".to_string(),
            set_active_gizmo: "set-active-gizmo".to_string(),
            toggle_local: "toggle-local-mode".to_string(),
            increase_size: "increase-size".to_string(),
            decrease_size: "decrease-size".to_string(),
            focus_lost: "focus-lost".to_string(),
            toggle_snapping: "toggle-snapping".to_string(),
            undo: "undo".to_string(),
            redo: "redo".to_string(),
            delete_selection: "delete-selection".to_string(),
        }
    }
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub undo_capacity: usize,
    pub marquee_min_extent: f32,
    /// Colliders that count as scene objects for picking
    pub scene_mask: CollisionMask,
    pub gizmo: GizmoConfig,
    pub snapping: SnapConfig,
    pub bindings: InputBindings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            marquee_min_extent: DEFAULT_MARQUEE_MIN_EXTENT,
            scene_mask: CollisionMask::SCENE,
            gizmo: GizmoConfig::default(),
            snapping: SnapConfig::default(),
            bindings: InputBindings::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_capacity == 0 {
            return Err(invalid("undo_capacity", "must be at least 1"));
        }
        positive("marquee_min_extent", self.marquee_min_extent)?;
        positive("gizmo.screen_divisor", self.gizmo.screen_divisor)?;
        positive("gizmo.size_step", self.gizmo.size_step)?;
        positive("gizmo.min_size", self.gizmo.min_size)?;
        positive("gizmo.min_scale", self.gizmo.min_scale)?;
        positive("snapping.translate_quantum", self.snapping.translate_quantum)?;
        if self.gizmo.max_size < self.gizmo.min_size {
            return Err(invalid("gizmo.max_size", "must not be below gizmo.min_size"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.undo_capacity, DEFAULT_UNDO_CAPACITY);
        assert_eq!(config.gizmo.screen_divisor, DEFAULT_SCREEN_DIVISOR);
        assert_eq!(config.snapping.quantum(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(
            r#"{ "undo_capacity": 5, "snapping": { "enabled": true }, "bindings": { "undo": "ctrl-z" } }"#,
        )
        .unwrap();
        assert_eq!(config.undo_capacity, 5);
        assert_eq!(config.snapping.quantum(), Some(DEFAULT_SNAP_QUANTUM));
        assert_eq!(config.bindings.undo, "ctrl-z");
        assert_eq!(config.bindings.redo, "redo");
        assert_eq!(config.gizmo.initial.as_deref(), Some("translate"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EditorConfig::from_json(r#"{ "undo_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "undo_capacity", .. }));

        let err = EditorConfig::from_json(r#"{ "gizmo": { "screen_divisor": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "gizmo.screen_divisor", .. }));

        assert!(matches!(
            EditorConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = EditorConfig::default();
        config.gizmo.local = true;
        config.scene_mask = CollisionMask(5);
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}
