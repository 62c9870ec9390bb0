//! Upgrade-path resolution
//!
//! Computes which (starting version, upgrade version) pairs the upgrade
//! suites are generated for:
//!
//! - `catalog`: the fixed set of version line slots
//! - `manifest`: supported transitions, built-in or operator override
//! - `filter`: definedness, variant targeting and protocol predicates
//! - `builder`: orchestration into ordered `UpgradePath` records
//! - `family`: release family of the locally built version

pub mod builder;
pub mod catalog;
pub mod family;
pub mod filter;
pub mod manifest;
pub mod meta;

pub use builder::{build_upgrade_pairs, BuildSummary, PathBuilder, ResolverOptions};
pub use catalog::{CatalogSlot, VersionCatalog};
pub use family::version_family;
pub use filter::{PathFilter, Rejection};
pub use manifest::{Manifest, ManifestEntry, ManifestResolver, OverrideManifestFile, OverrideUpgrade, VersionSlot};
pub use meta::{UpgradePath, Variant, VersionMeta};
