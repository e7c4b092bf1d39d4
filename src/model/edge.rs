//! Dependent edges and version requirements.

use serde::{Deserialize, Serialize};

/// Inclusive flags for a version bound.
///
/// Stored as a bit mask (`MIN_INCLUSIVE` = 256, `MAX_INCLUSIVE` = 512) so
/// that state written by existing installers stays readable. Inside the
/// crate the two flags are plain booleans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiresAttributes {
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl RequiresAttributes {
    pub const MIN_INCLUSIVE: u32 = 256;
    pub const MAX_INCLUSIVE: u32 = 512;

    pub const fn new(min_inclusive: bool, max_inclusive: bool) -> Self {
        Self { min_inclusive, max_inclusive }
    }

    /// Both bounds admit equality.
    pub const fn inclusive() -> Self {
        Self::new(true, true)
    }

    /// Decode from the stored mask. Unknown bits are ignored.
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            min_inclusive: bits & Self::MIN_INCLUSIVE != 0,
            max_inclusive: bits & Self::MAX_INCLUSIVE != 0,
        }
    }

    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.min_inclusive {
            bits |= Self::MIN_INCLUSIVE;
        }
        if self.max_inclusive {
            bits |= Self::MAX_INCLUSIVE;
        }
        bits
    }
}

/// One "dependent depends on provider" record, stored under the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentEdge {
    pub dependent_key: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub attributes: RequiresAttributes,
}

impl DependentEdge {
    pub fn new(dependent_key: impl Into<String>) -> Self {
        Self {
            dependent_key: dependent_key.into(),
            min_version: None,
            max_version: None,
            attributes: RequiresAttributes::default(),
        }
    }

    pub fn with_min_version(mut self, version: impl Into<String>, inclusive: bool) -> Self {
        self.min_version = Some(version.into());
        self.attributes.min_inclusive = inclusive;
        self
    }

    pub fn with_max_version(mut self, version: impl Into<String>, inclusive: bool) -> Self {
        self.max_version = Some(version.into());
        self.attributes.max_inclusive = inclusive;
        self
    }
}

/// What a package requires of a provider: it must exist and fit the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement {
    pub provider_key: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub attributes: RequiresAttributes,
}

impl DependencyRequirement {
    pub fn new(provider_key: impl Into<String>) -> Self {
        Self {
            provider_key: provider_key.into(),
            min_version: None,
            max_version: None,
            attributes: RequiresAttributes::default(),
        }
    }

    pub fn with_min_version(mut self, version: impl Into<String>, inclusive: bool) -> Self {
        self.min_version = Some(version.into());
        self.attributes.min_inclusive = inclusive;
        self
    }

    pub fn with_max_version(mut self, version: impl Into<String>, inclusive: bool) -> Self {
        self.max_version = Some(version.into());
        self.attributes.max_inclusive = inclusive;
        self
    }

    /// Replace both inclusive flags from a stored/raw bit mask.
    pub fn with_attribute_bits(mut self, bits: u32) -> Self {
        self.attributes = RequiresAttributes::from_bits(bits);
        self
    }
}
