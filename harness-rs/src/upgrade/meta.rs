//! Version descriptors and upgrade path records
//!
//! A `VersionMeta` describes one release line slot: which family it belongs
//! to, whether it is a released point version or a moving branch, the
//! version selector handed to the cluster driver, and the range of native
//! protocol versions it speaks.

use crate::errors::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of a version line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Most recent released point version of a line
    Current,
    /// Branch where changing code lives
    Indev,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Current => write!(f, "current"),
            Variant::Indev => write!(f, "indev"),
        }
    }
}

/// Descriptor for a single version line slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMeta {
    pub name: String,
    pub family: String,
    pub variant: Variant,
    /// Opaque selector for the cluster driver (`2.1.14`, `git:cassandra-2.1`, ...)
    pub version: String,
    pub min_proto_v: u8,
    pub max_proto_v: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_versions: Option<BTreeSet<u8>>,
}

impl VersionMeta {
    pub fn new(
        name: &str,
        family: &str,
        variant: Variant,
        version: &str,
        min_proto_v: u8,
        max_proto_v: u8,
    ) -> Self {
        Self {
            name: name.to_string(),
            family: family.to_string(),
            variant,
            version: version.to_string(),
            min_proto_v,
            max_proto_v,
            java_versions: None,
        }
    }

    pub fn with_java_versions(mut self, versions: &[u8]) -> Self {
        self.java_versions = Some(versions.iter().copied().collect());
        self
    }

    /// Highest runtime major version this line accepts
    pub fn java_version(&self) -> Option<u8> {
        self.java_versions.as_ref().and_then(|set| set.iter().next_back().copied())
    }

    /// Copy of this descriptor pointing at a different version selector
    pub fn clone_with_local_version(&self, version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..self.clone()
        }
    }

    /// Reject descriptors missing required fields
    ///
    /// Protocol range ordering is a catalog precondition and is not checked.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::MalformedManifest(
                "version descriptor has an empty name".to_string(),
            ));
        }
        if self.family.trim().is_empty() {
            return Err(HarnessError::MalformedManifest(format!(
                "version descriptor '{}' has an empty family",
                self.name
            )));
        }
        if self.version.trim().is_empty() {
            return Err(HarnessError::MalformedManifest(format!(
                "version descriptor '{}' has an empty version selector",
                self.name
            )));
        }
        if let Some(java) = &self.java_versions {
            if java.is_empty() {
                return Err(HarnessError::MalformedManifest(format!(
                    "version descriptor '{}' declares an empty java_versions set",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// A single upgrade scenario handed to the suite generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePath {
    pub name: String,
    pub starting_version: String,
    pub upgrade_version: String,
    pub starting_meta: VersionMeta,
    pub upgrade_meta: VersionMeta,
}

impl UpgradePath {
    pub fn new(origin: VersionMeta, destination: VersionMeta) -> Self {
        Self {
            name: Self::path_name(&origin, &destination),
            starting_version: origin.version.clone(),
            upgrade_version: destination.version.clone(),
            starting_meta: origin,
            upgrade_meta: destination,
        }
    }

    pub fn path_name(origin: &VersionMeta, destination: &VersionMeta) -> String {
        format!("Upgrade_{}_To_{}", origin.name, destination.name)
    }
}
