//! Built-in catalog of version line slots
//!
//! Each slot is either a `VersionMeta` or an explicit absence marker for a
//! line that is intentionally not tested (e.g. no further 2.0 development).
//! Manifests reference slots by name, so every manifest key and value is
//! guaranteed to be one of these entries.

use crate::errors::{HarnessError, Result};
use crate::upgrade::family::{FAMILY_2_0, FAMILY_2_1, FAMILY_2_2, FAMILY_3_0, FAMILY_3_X, FAMILY_TRUNK};
use crate::upgrade::meta::{Variant, VersionMeta};
use once_cell::sync::Lazy;

/// Named slot in a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSlot {
    pub name: String,
    pub meta: Option<VersionMeta>,
}

/// Ordered set of version slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    slots: Vec<CatalogSlot>,
}

static BUILTIN: Lazy<VersionCatalog> = Lazy::new(|| {
    use Variant::{Current, Indev};

    VersionCatalog::new()
        .with_absent("indev_2_0_x") // no further 2.0 development
        .with_version(
            VersionMeta::new("current_2_0_x", FAMILY_2_0, Current, "2.0.17", 1, 2)
                .with_java_versions(&[7]),
        )
        .with_version(
            VersionMeta::new("indev_2_1_x", FAMILY_2_1, Indev, "git:cassandra-2.1", 1, 3)
                .with_java_versions(&[7, 8]),
        )
        .with_version(
            VersionMeta::new("current_2_1_x", FAMILY_2_1, Current, "2.1.14", 1, 3)
                .with_java_versions(&[7, 8]),
        )
        .with_version(
            VersionMeta::new("indev_2_2_x", FAMILY_2_2, Indev, "git:cassandra-2.2", 1, 4)
                .with_java_versions(&[7, 8]),
        )
        .with_version(
            VersionMeta::new("current_2_2_x", FAMILY_2_2, Current, "2.2.6", 1, 4)
                .with_java_versions(&[7, 8]),
        )
        .with_version(
            VersionMeta::new("indev_3_0_x", FAMILY_3_0, Indev, "git:cassandra-3.0", 3, 4)
                .with_java_versions(&[8]),
        )
        .with_version(
            VersionMeta::new("current_3_0_x", FAMILY_3_0, Current, "3.0.5", 3, 4)
                .with_java_versions(&[8]),
        )
        .with_version(
            VersionMeta::new("indev_3_x", FAMILY_3_X, Indev, "git:cassandra-3.7", 3, 4)
                .with_java_versions(&[8]),
        )
        .with_version(
            VersionMeta::new("current_3_x", FAMILY_3_X, Current, "3.5", 3, 4)
                .with_java_versions(&[8]),
        )
        .with_version(
            VersionMeta::new("head_trunk", FAMILY_TRUNK, Indev, "git:trunk", 3, 4)
                .with_java_versions(&[8]),
        )
});

impl VersionCatalog {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Process-wide catalog of supported lines
    pub fn builtin() -> &'static VersionCatalog {
        &BUILTIN
    }

    /// Add a defined slot named after the descriptor
    pub fn with_version(mut self, meta: VersionMeta) -> Self {
        self.slots.push(CatalogSlot {
            name: meta.name.clone(),
            meta: Some(meta),
        });
        self
    }

    /// Add a slot that is intentionally not tested
    pub fn with_absent(mut self, name: &str) -> Self {
        self.slots.push(CatalogSlot {
            name: name.to_string(),
            meta: None,
        });
        self
    }

    /// Look up a slot by name
    ///
    /// `Ok(None)` is a known absence marker; an unknown name is a
    /// manifest authoring error.
    pub fn slot(&self, name: &str) -> Result<Option<&VersionMeta>> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.meta.as_ref())
            .ok_or_else(|| {
                HarnessError::MalformedManifest(format!("unknown version slot '{}'", name))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.name == name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &CatalogSlot> {
        self.slots.iter()
    }

    /// Defined descriptors, in declaration order
    pub fn versions(&self) -> impl Iterator<Item = &VersionMeta> {
        self.slots.iter().filter_map(|slot| slot.meta.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
