//! Session configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Hosts typically load one from JSON and override fields from
//! their own command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DialogError;
use crate::model::{DialogFlags, ModeFlags, OperationKind};
use crate::release::DEFAULT_GRACE_DELAY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Pause between `stop` and releasing the surface, in milliseconds
    pub grace_delay_ms: u64,

    /// Working context: default location and base for the current-item fallback.
    /// `None` means the process working directory.
    pub working_dir: Option<PathBuf>,

    /// Initial total on all three progress axes
    pub initial_total: u64,

    /// Let the item axis drive the progress bar
    pub estimate_from_items: bool,

    pub dialog_flags: DialogFlags,

    pub operation: OperationKind,

    pub mode: ModeFlags,
}

impl Default for DialogConfig {
    fn default() -> Self {
        DialogConfig {
            grace_delay_ms: DEFAULT_GRACE_DELAY.as_millis() as u64,
            working_dir: None,
            initial_total: 100,
            estimate_from_items: false,
            dialog_flags: DialogFlags::empty(),
            operation: OperationKind::None,
            mode: ModeFlags::empty(),
        }
    }
}

impl DialogConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    /// The configured working context, or the process working directory.
    pub fn resolve_working_dir(&self) -> Result<PathBuf, DialogError> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| DialogError::Config {
                message: format!("cannot determine working directory: {}", e),
            }),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DialogError> {
        serde_json::from_str(json).map_err(|e| DialogError::Config {
            message: e.to_string(),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DialogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DialogError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DialogConfig::default();
        assert_eq!(config.grace_delay(), Duration::from_millis(900));
        assert_eq!(config.initial_total, 100);
        assert!(!config.estimate_from_items);
        assert_eq!(config.operation, OperationKind::None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DialogConfig::from_json_str(
            r#"{ "grace_delay_ms": 250, "operation": "copying", "estimate_from_items": true }"#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.grace_delay(), Duration::from_millis(250));
        assert_eq!(config.operation, OperationKind::Copying);
        assert!(config.estimate_from_items);
        assert_eq!(config.initial_total, 100);
        assert_eq!(config.dialog_flags, DialogFlags::empty());
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = DialogConfig::from_json_str("{ not json").expect_err("Should fail");
        assert!(matches!(err, DialogError::Config { .. }));
    }

    #[test]
    fn test_explicit_working_dir_wins() {
        let config = DialogConfig {
            working_dir: Some(PathBuf::from("/srv/jobs")),
            ..DialogConfig::default()
        };
        assert_eq!(
            config.resolve_working_dir().expect("Should resolve"),
            PathBuf::from("/srv/jobs")
        );
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("dialog.json");
        std::fs::write(&path, r#"{ "initial_total": 5 }"#).expect("Failed to write config");

        let config = DialogConfig::from_json_file(&path).expect("Failed to load config");
        assert_eq!(config.initial_total, 5);
    }
}
