//! Host configuration.

use serde::{Deserialize, Serialize};

use crate::identity::MAX_AGENT_ID;
use crate::render::DEFAULT_PADDING;

/// Options for a [`Host`](crate::host::Host).
///
/// Every field has a default, so a host can be built with zero
/// configuration. A JavaScript host passes the same options as a JSON object
/// with camelCase keys; unknown keys are rejected, and so is an
/// `agentIdOffset` above [`MAX_AGENT_ID`].
///
/// | Field | JSON key | Default | Description |
/// |-------|----------|---------|-------------|
/// | `agent_id_offset` | `agentIdOffset` | `0` | Counter value before the first allocation; the first id is `offset + 1` |
/// | `table_padding` | `tablePadding` | `2` | Spaces added after the widest cell of each table column |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct HostConfig {
    pub agent_id_offset: u64,
    pub table_padding: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            agent_id_offset: 0,
            table_padding: DEFAULT_PADDING,
        }
    }
}

impl HostConfig {
    /// Parse options from a JSON object. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        if config.agent_id_offset > MAX_AGENT_ID {
            return Err(serde::de::Error::custom(format!(
                "agentIdOffset must be at most {MAX_AGENT_ID}"
            )));
        }
        Ok(config)
    }
}
