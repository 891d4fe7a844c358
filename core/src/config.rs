use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound accepted for `max_memory_mb` (128 GB).
pub const MAX_MEMORY_MB_CEILING: u64 = 131_072;

/// A sensible cap for shared hosts. Not applied unless set explicitly.
pub const SUGGESTED_MAX_MEMORY_MB: u64 = 4096;

/// Engine settings. Passed explicitly; nothing is read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lines whose first non-blank character is this are skipped during load.
    pub comment_prefix: char,
    /// Cap on the estimated CSR footprint (see `estimate_bytes`). A load that
    /// would exceed it fails and keeps the previous graph. 0 = unlimited, the
    /// default.
    ///
    /// The check runs after parsing, so the staged edge list (8 bytes per
    /// edge) is already allocated by then and is not counted against the cap.
    pub max_memory_mb: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            comment_prefix: '#',
            max_memory_mb: 0,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config object. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.comment_prefix.is_whitespace() || self.comment_prefix.is_ascii_digit() {
            return Err(ConfigError::InvalidCommentPrefix(self.comment_prefix));
        }
        if self.max_memory_mb > MAX_MEMORY_MB_CEILING {
            return Err(ConfigError::MemoryLimitOutOfRange {
                got: self.max_memory_mb,
                max: MAX_MEMORY_MB_CEILING,
            });
        }
        Ok(())
    }

    /// Byte limit derived from `max_memory_mb`, or None when uncapped.
    pub fn memory_limit_bytes(&self) -> Option<u64> {
        match self.max_memory_mb {
            0 => None,
            mb => Some(mb * 1024 * 1024),
        }
    }
}
