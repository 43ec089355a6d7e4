//! Pipeline configuration.
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! adaptive_parsing = true
//! link_type_policy = "link-wins"
//!
//! [unification]
//! id_match_tail_tokens = 1000
//! proximity_sentence_window = 1
//! ```
//!
//! Every key is optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{ClauseMateError, ClauseMateResult};

/// Which encoding wins when a token's link and type name different chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkTypePolicy {
    /// Trust the `*->chain-occurrence` link (default)
    LinkWins,
    /// Trust the `Type[chain]` label
    TypeWins,
}

impl Default for LinkTypePolicy {
    fn default() -> Self {
        Self::LinkWins
    }
}

/// Settings for the per-file pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detect the schema from the preamble. When disabled the legacy column
    /// map is forced.
    pub adaptive_parsing: bool,
    pub link_type_policy: LinkTypePolicy,
    pub unification: UnificationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            adaptive_parsing: true,
            link_type_policy: LinkTypePolicy::LinkWins,
            unification: UnificationConfig::default(),
        }
    }
}

/// Thresholds for linking chains across chapter files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnificationConfig {
    /// An id match requires the earlier chain's last mention to be at most
    /// this many tokens before its file end.
    pub id_match_tail_tokens: usize,
    /// An id match requires the later chain to start within this many tokens
    /// of its file start.
    pub id_match_head_tokens: usize,
    /// Minimum word overlap (Jaccard, 0..=1) for a text match.
    pub text_overlap_threshold: f64,
    /// Maximum global sentence distance for a proximity match.
    pub proximity_sentence_window: usize,
}

impl Default for UnificationConfig {
    fn default() -> Self {
        Self {
            id_match_tail_tokens: 1000,
            id_match_head_tokens: 1000,
            text_overlap_threshold: 0.8,
            proximity_sentence_window: 1,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ClauseMateResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ClauseMateError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ClauseMateError::Config { message, .. } => ClauseMateError::Config {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> ClauseMateResult<Self> {
        toml::from_str(content).map_err(|e| ClauseMateError::Config {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Builder-style toggle for adaptive parsing.
    pub fn with_adaptive_parsing(mut self, enabled: bool) -> Self {
        self.adaptive_parsing = enabled;
        self
    }

    pub fn with_link_type_policy(mut self, policy: LinkTypePolicy) -> Self {
        self.link_type_policy = policy;
        self
    }
}
