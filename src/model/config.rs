use serde::{Deserialize, Serialize};

/// Configuration from `taskgrid/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub view: ViewSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Maximum undo depth. 0 keeps every snapshot.
    /// Default: see src/templates/config.toml
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub id_policy: IdPolicy,
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            history_limit: default_history_limit(),
            id_policy: IdPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSection {
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Default: see src/templates/config.toml
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ViewSection {
    fn default() -> Self {
        ViewSection {
            filter_mode: FilterMode::default(),
            page_size: default_page_size(),
        }
    }
}

/// How new task ids are chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// Counter that only moves forward; ids are never reissued within a session
    #[default]
    Monotonic,
    /// `collection size + 1`, stepping past ids still in use. Can reissue an
    /// id freed by a delete, never a live one.
    Size,
}

/// How the three task filters combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every active predicate must match
    #[default]
    All,
    /// Only the first active predicate applies, in the order text, status, priority
    First,
}

/// Default: see src/templates/config.toml
fn default_history_limit() -> usize {
    500
}

/// Default: see src/templates/config.toml
fn default_page_size() -> usize {
    10
}
