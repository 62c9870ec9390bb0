//! Harness configuration
//!
//! Process environment is read once into `HarnessConfig` and handed to the
//! resolver explicitly. Recognised variables:
//!
//! | variable | meaning |
//! |---|---|
//! | `CASSANDRA_VERSION` | version of the code under test |
//! | `CASSANDRA_DIR` | local source tree (fallback for version and git ref) |
//! | `CASSANDRA_GITREF` | source-control reference of the code under test |
//! | `RUN_STATIC_UPGRADE_MATRIX` | test the full static upgrade matrix |
//! | `UPGRADE_TEST_RUN` | enable generated upgrade suites |
//! | `UPGRADE_OVERRIDE_MANIFEST` | YAML override manifest path |

use crate::errors::{HarnessError, Result};
use crate::source::LocalSource;
use crate::upgrade::{version_family, Manifest, OverrideManifestFile, ResolverOptions, VersionCatalog};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

pub const ENV_CASSANDRA_VERSION: &str = "CASSANDRA_VERSION";
pub const ENV_CASSANDRA_DIR: &str = "CASSANDRA_DIR";
pub const ENV_CASSANDRA_GITREF: &str = "CASSANDRA_GITREF";
pub const ENV_RUN_STATIC_UPGRADE_MATRIX: &str = "RUN_STATIC_UPGRADE_MATRIX";
pub const ENV_UPGRADE_TEST_RUN: &str = "UPGRADE_TEST_RUN";
pub const ENV_UPGRADE_OVERRIDE_MANIFEST: &str = "UPGRADE_OVERRIDE_MANIFEST";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cassandra_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ref: Option<String>,
    pub full_matrix: bool,
    pub upgrade_test_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_manifest_path: Option<PathBuf>,
}

/// `true`/`yes` (any case) enable a flag; anything else disables it
pub fn env_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("yes")
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, with `overrides` consulted before the environment
    ///
    /// An overridden version or ref is never derived from `CASSANDRA_DIR`.
    pub fn from_env_with<F>(overrides: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    /// Build from an arbitrary variable lookup
    ///
    /// Explicit `CASSANDRA_VERSION`/`CASSANDRA_GITREF` win over values
    /// derived from `CASSANDRA_DIR`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cassandra_dir = non_empty(lookup(ENV_CASSANDRA_DIR)).map(PathBuf::from);
        let source = cassandra_dir.as_ref().map(LocalSource::new);

        let local_version = match non_empty(lookup(ENV_CASSANDRA_VERSION)) {
            Some(version) => Some(version),
            None => match &source {
                Some(source) => Some(source.base_version()?),
                None => None,
            },
        };

        let local_ref = match non_empty(lookup(ENV_CASSANDRA_GITREF)) {
            Some(git_ref) => Some(git_ref),
            None => match &source {
                Some(source) => source.local_ref()?,
                None => None,
            },
        };

        let config = Self {
            cassandra_dir,
            local_version,
            local_ref,
            full_matrix: env_flag(lookup(ENV_RUN_STATIC_UPGRADE_MATRIX).as_deref()),
            upgrade_test_run: env_flag(lookup(ENV_UPGRADE_TEST_RUN).as_deref()),
            override_manifest_path: non_empty(lookup(ENV_UPGRADE_OVERRIDE_MANIFEST)).map(PathBuf::from),
        };

        debug!(?config, "loaded harness configuration");
        Ok(config)
    }

    /// Family of the code under test, `unknown` when no version is known
    pub fn local_family(&self) -> String {
        version_family(self.local_version.as_deref().unwrap_or_default())
    }

    /// Operator override manifest, empty when none is configured
    pub fn override_manifest(&self) -> Result<Manifest> {
        match &self.override_manifest_path {
            Some(path) => OverrideManifestFile::load(path)?.into_manifest(VersionCatalog::builtin()),
            None => Ok(Manifest::new()),
        }
    }

    pub fn resolver_options(&self) -> Result<ResolverOptions> {
        let override_manifest = self.override_manifest()?;
        if self.full_matrix && !override_manifest.is_empty() {
            debug!("override manifest configured together with the static matrix flag");
        }

        Ok(ResolverOptions {
            local_family: self.local_family(),
            full_matrix: self.full_matrix,
            local_ref: self.local_ref.clone(),
            override_manifest,
        })
    }

    /// Reject configurations that cannot target the local build
    ///
    /// An override file without upgrades does not count as an override.
    pub fn validate(&self) -> Result<()> {
        if self.full_matrix || self.local_ref.is_some() {
            return Ok(());
        }

        if self.override_manifest()?.is_empty() {
            return Err(HarnessError::Config(format!(
                "targeting the local build needs {} or a git checkout in {}",
                ENV_CASSANDRA_GITREF, ENV_CASSANDRA_DIR
            )));
        }
        Ok(())
    }
}
