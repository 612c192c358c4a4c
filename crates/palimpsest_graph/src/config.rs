//! Graph builder configuration.

use serde::{Deserialize, Serialize};

/// Graph builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Link cuts and copies to the pastes that reuse their text
    pub cut_paste_edges: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cut_paste_edges: true,
        }
    }
}
