//! Upgrade manifests and active-manifest resolution
//!
//! A manifest maps an origin slot to the ordered list of slots it may be
//! upgraded to. The built-in manifest is declared against the built-in
//! catalog; operators may supply an override manifest file which, when it
//! has any entries, replaces the built-in one entirely.
//!
//! Override file format:
//!
//! ```yaml
//! versions:
//!   - name: local_4_0
//!     family: "4.0.x"
//!     variant: indev
//!     version: "git:cassandra-4.0"
//!     min_proto_v: 3
//!     max_proto_v: 5
//!     java_versions: [8, 11]
//! upgrades:
//!   - from: current_3_x
//!     to: [indev_3_x, local_4_0]
//! ```

use crate::errors::{HarnessError, Result};
use crate::upgrade::catalog::VersionCatalog;
use crate::upgrade::meta::VersionMeta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A manifest slot; `None` marks a line that is not tested
pub type VersionSlot = Option<VersionMeta>;

/// Built-in upgrade table, in declaration order
const BUILTIN_UPGRADES: &[(&str, &[&str])] = &[
    ("indev_2_0_x", &["indev_2_1_x", "current_2_1_x"]),
    ("current_2_0_x", &["indev_2_0_x", "indev_2_1_x", "current_2_1_x"]),
    (
        "indev_2_1_x",
        &["indev_2_2_x", "current_2_2_x", "indev_3_0_x", "current_3_0_x", "indev_3_x", "current_3_x", "head_trunk"],
    ),
    (
        "current_2_1_x",
        &["indev_2_1_x", "indev_2_2_x", "current_2_2_x", "indev_3_0_x", "current_3_0_x", "indev_3_x", "current_3_x", "head_trunk"],
    ),
    ("indev_2_2_x", &["indev_3_0_x", "current_3_0_x", "indev_3_x", "current_3_x", "head_trunk"]),
    ("current_2_2_x", &["indev_2_2_x", "indev_3_0_x", "current_3_0_x", "indev_3_x", "current_3_x", "head_trunk"]),
    ("indev_3_0_x", &["indev_3_x", "current_3_x", "head_trunk"]),
    ("current_3_0_x", &["indev_3_0_x", "indev_3_x", "current_3_x", "head_trunk"]),
    ("indev_3_x", &["head_trunk"]),
    ("current_3_x", &["indev_3_x", "head_trunk"]),
];

/// One origin and its candidate destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub origin: VersionSlot,
    pub destinations: Vec<VersionSlot>,
}

/// Ordered origin -> destinations table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Built-in manifest resolved against the built-in catalog
    pub fn builtin() -> Result<Self> {
        Self::from_slot_names(VersionCatalog::builtin(), BUILTIN_UPGRADES)
    }

    /// Build a manifest from slot names
    ///
    /// Fails on the first name the catalog does not know.
    pub fn from_slot_names(catalog: &VersionCatalog, table: &[(&str, &[&str])]) -> Result<Self> {
        let mut manifest = Self::new();
        for (origin, destinations) in table {
            let origin = catalog.slot(origin)?.cloned();
            let destinations = destinations
                .iter()
                .map(|name| catalog.slot(name).map(|slot| slot.cloned()))
                .collect::<Result<Vec<_>>>()?;
            manifest.push(origin, destinations);
        }
        Ok(manifest)
    }

    pub fn with_entry(mut self, origin: VersionSlot, destinations: Vec<VersionSlot>) -> Self {
        self.push(origin, destinations);
        self
    }

    pub fn push(&mut self, origin: VersionSlot, destinations: Vec<VersionSlot>) {
        self.entries.push(ManifestEntry { origin, destinations });
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Picks the manifest a resolution run uses
#[derive(Debug, Clone, Copy)]
pub struct ManifestResolver<'a> {
    default: &'a Manifest,
    override_manifest: Option<&'a Manifest>,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(default: &'a Manifest, override_manifest: Option<&'a Manifest>) -> Self {
        Self {
            default,
            override_manifest,
        }
    }

    /// True when a non-empty override replaces the default manifest
    pub fn override_active(&self) -> bool {
        self.override_manifest.map_or(false, |m| !m.is_empty())
    }

    pub fn active_manifest(&self) -> &'a Manifest {
        match self.override_manifest {
            Some(manifest) if !manifest.is_empty() => manifest,
            _ => self.default,
        }
    }
}

/// Single upgrade row of an override file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideUpgrade {
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

/// Operator-supplied manifest file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverrideManifestFile {
    /// Descriptors not present in the catalog, or shadowing catalog slots
    #[serde(default)]
    pub versions: Vec<VersionMeta>,
    #[serde(default)]
    pub upgrades: Vec<OverrideUpgrade>,
}

impl OverrideManifestFile {
    /// Load an override manifest from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HarnessError::FileNotFound(path.to_string_lossy().to_string()));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::IoError(format!("Failed to read override manifest: {}", e))
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: OverrideManifestFile = serde_yaml::from_str(content).map_err(|e| {
            HarnessError::ParseError(format!("Invalid override manifest YAML: {}", e))
        })?;

        for meta in &file.versions {
            meta.validate()?;
        }

        Ok(file)
    }

    /// Resolve slot names into a manifest
    ///
    /// Inline `versions` take precedence over catalog slots of the same name.
    pub fn into_manifest(self, catalog: &VersionCatalog) -> Result<Manifest> {
        let lookup = |name: &str| -> Result<VersionSlot> {
            if let Some(meta) = self.versions.iter().find(|m| m.name == name) {
                return Ok(Some(meta.clone()));
            }
            catalog.slot(name).map(|slot| slot.cloned())
        };

        let mut manifest = Manifest::new();
        for row in &self.upgrades {
            let origin = lookup(&row.from)?;
            let destinations = row
                .to
                .iter()
                .map(|name| lookup(name))
                .collect::<Result<Vec<_>>>()?;
            manifest.push(origin, destinations);
        }
        Ok(manifest)
    }
}
