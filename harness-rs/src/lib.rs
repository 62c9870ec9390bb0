//! # dtest core - upgrade test harness runtime
//!
//! Upgrade suites for a distributed database are generated once per
//! supported (starting version, upgrade version) pair. This crate decides
//! which pairs exist for a given run and provides the pieces the generated
//! suites need to drive and verify a cluster across the upgrade.
//!
//! ## Core Principle
//!
//! **Only test what the local build can upgrade to or from**: unless the
//! operator asks for the full static matrix or supplies an override
//! manifest, only `current -> indev` transitions within the family of the
//! locally built code are emitted, and the indev side always points at the
//! local source reference.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │ HarnessConfig (env)  │    │ override manifest    │
//! └──────────┬───────────┘    └──────────┬───────────┘
//!            ▼                           ▼
//!     ┌──────────────────────────────────────────┐
//!     │ upgrade: catalog -> manifest -> filter   │
//!     │          -> builder -> Vec<UpgradePath>  │
//!     └──────────────────┬───────────────────────┘
//!                        ▼
//!     ┌──────────────────────────────────────────┐
//!     │ suite registry -> UpgradeTester(driver)  │
//!     │       verify assertions / jmx probes     │
//!     └──────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod logging;
pub mod config;
pub mod upgrade;
pub mod source;
pub mod jmx;
pub mod verify;
pub mod cluster;
pub mod suite;

pub use errors::HarnessError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use config::HarnessConfig;
pub use upgrade::{
    build_upgrade_pairs, version_family, BuildSummary, Manifest, OverrideManifestFile, PathBuilder,
    ResolverOptions, UpgradePath, Variant, VersionCatalog, VersionMeta,
};
pub use source::{GitDriver, LocalSource};
pub use jmx::{check_delivery, make_mbean, JolokiaAgent, MetricsProbe};
pub use verify::{QuerySession, Statement};
pub use cluster::{ClusterDriver, UpgradeTester};
pub use suite::{GeneratedSuite, SuiteRegistry};

/// Version of the harness runtime
pub const VERSION: &str = "0.4.2";
