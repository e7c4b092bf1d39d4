//! Provider node records.

use serde::{Deserialize, Serialize};

/// Everything stored on a provider node, as read back from the store.
///
/// Every field is optional: a node can exist with any subset of values.
/// A node without `version` is an orphan and checks treat it as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub version: Option<String>,
    pub attributes: Option<u32>,
}

impl ProviderInfo {
    pub fn is_orphaned(&self) -> bool {
        self.version.is_none()
    }
}

/// Input to `register_dependency`: the full set of provider fields to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRegistration {
    pub provider_key: String,
    pub version: String,
    pub display_name: String,
    /// Written to the node's default value only when present.
    pub id: Option<String>,
    pub attributes: u32,
}

impl ProviderRegistration {
    pub fn new(
        provider_key: impl Into<String>,
        version: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            provider_key: provider_key.into(),
            version: version.into(),
            display_name: display_name.into(),
            id: None,
            attributes: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attributes(mut self, attributes: u32) -> Self {
        self.attributes = attributes;
        self
    }
}
