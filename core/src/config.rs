//! Editor configuration

use crate::error::{OtError, Result};
use crate::ot::UserId;
use crate::undo::DEFAULT_UNDO_LIMIT;
use serde::{Deserialize, Serialize};

/// Per-session settings of the editor binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Author of local edits; 0 means anonymous (inserts are not tagged)
    pub user_id: UserId,
    /// May re-format text written by other authors
    pub can_override: bool,
    /// Maximum undo entries (0 = unlimited)
    pub undo_limit: usize,
    /// Merge contiguous typing / deleting into one undo step
    pub group_undo: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            user_id: 0,
            can_override: false,
            undo_limit: DEFAULT_UNDO_LIMIT,
            group_undo: true,
        }
    }
}

impl EditorConfig {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| OtError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.undo_limit, 50);
        assert!(config.group_undo);
        assert!(!config.can_override);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EditorConfig::from_json_str(r#"{"userId": 7, "canOverride": true}"#).unwrap();
        assert_eq!(config.user_id, 7);
        assert!(config.can_override);
        assert_eq!(config.undo_limit, 50);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = EditorConfig::from_json_str(r#"{"undoLimit": "lots"}"#).unwrap_err();
        assert!(matches!(err, OtError::Config(_)));
    }
}
