//! Session configuration

use crate::error::SessionError;
use plan_model::PatchRules;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Save `current` through the repository after every commit
    pub persist_on_commit: bool,
    /// Reject patch records lacking `created_at` / `updated_at`
    pub require_record_timestamps: bool,
    /// Longest accepted instruction, in characters
    pub max_instruction_len: usize,
    /// Emit logs as JSON (binary only)
    pub json_logs: bool,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns `SessionError::Config` if the text is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> Result<Self, SessionError> {
        toml::from_str(text).map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns `SessionError::Config` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// With persist-on-commit
    #[inline]
    #[must_use]
    pub fn with_persist_on_commit(mut self, persist: bool) -> Self {
        self.persist_on_commit = persist;
        self
    }

    /// With record timestamp requirement
    #[inline]
    #[must_use]
    pub fn with_required_timestamps(mut self, required: bool) -> Self {
        self.require_record_timestamps = required;
        self
    }

    /// With maximum instruction length
    #[inline]
    #[must_use]
    pub fn with_max_instruction_len(mut self, max: usize) -> Self {
        self.max_instruction_len = max;
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Validation rules applied to generator output
    #[inline]
    #[must_use]
    pub fn patch_rules(&self) -> PatchRules {
        PatchRules {
            require_timestamps: self.require_record_timestamps,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist_on_commit: true,
            require_record_timestamps: false,
            max_instruction_len: 4000,
            json_logs: false,
        }
    }
}
