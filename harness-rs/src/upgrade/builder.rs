//! Upgrade path construction
//!
//! Walks the active manifest in declaration order, filters each
//! (origin, destination) candidate and materializes the survivors as
//! `UpgradePath` records. When the run targets the locally built code (no
//! full matrix, no override), the destination's version selector is
//! replaced with the local source reference so the suite always upgrades to
//! the code under test.

use crate::errors::{HarnessError, Result};
use crate::upgrade::filter::{PathFilter, Rejection};
use crate::upgrade::manifest::{Manifest, ManifestResolver};
use crate::upgrade::meta::{UpgradePath, VersionMeta};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Environment-derived inputs of a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Family of the locally built version (`3.0.x`, `3.x`, `unknown`, ...)
    pub local_family: String,
    /// Test every manifest pair instead of only the local family
    pub full_matrix: bool,
    /// Source-control reference of the code under test
    pub local_ref: Option<String>,
    /// Replaces the default manifest when non-empty
    pub override_manifest: Manifest,
}

impl ResolverOptions {
    pub fn targeted(local_family: &str, local_ref: &str) -> Self {
        Self {
            local_family: local_family.to_string(),
            local_ref: Some(local_ref.to_string()),
            ..Self::default()
        }
    }

    pub fn full_matrix() -> Self {
        Self {
            full_matrix: true,
            ..Self::default()
        }
    }

    pub fn with_override(mut self, manifest: Manifest) -> Self {
        self.override_manifest = manifest;
        self
    }
}

/// Counts of what a resolution run did with each candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub candidates: usize,
    pub emitted: usize,
    pub undefined: usize,
    pub untargeted: usize,
    pub protocol_mismatch: usize,
}

pub struct PathBuilder {
    default_manifest: Manifest,
    options: ResolverOptions,
}

impl PathBuilder {
    pub fn new(default_manifest: Manifest, options: ResolverOptions) -> Self {
        Self {
            default_manifest,
            options,
        }
    }

    /// Builder over the built-in manifest
    pub fn with_builtin(options: ResolverOptions) -> Result<Self> {
        Ok(Self::new(Manifest::builtin()?, options))
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn resolver(&self) -> ManifestResolver<'_> {
        ManifestResolver::new(&self.default_manifest, Some(&self.options.override_manifest))
    }

    /// Whether accepted destinations are pointed at the local source reference
    pub fn substitutes_local_version(&self) -> bool {
        !self.options.full_matrix && !self.resolver().override_active()
    }

    pub fn build_upgrade_pairs(&self) -> Result<Vec<UpgradePath>> {
        self.build_with_summary().map(|(paths, _)| paths)
    }

    /// Resolve the active manifest into upgrade paths
    ///
    /// Malformed descriptors or a duplicate path name abort the whole run;
    /// no partial result is returned.
    pub fn build_with_summary(&self) -> Result<(Vec<UpgradePath>, BuildSummary)> {
        let resolver = self.resolver();
        let override_active = resolver.override_active();
        let filter = PathFilter::new(&self.options.local_family, self.options.full_matrix, override_active);
        let substitute = self.substitutes_local_version();

        let mut paths = Vec::new();
        let mut seen = HashSet::new();
        let mut summary = BuildSummary::default();

        for entry in resolver.active_manifest().entries() {
            if let Some(origin) = &entry.origin {
                origin.validate()?;
            }

            for destination in &entry.destinations {
                if let Some(meta) = destination {
                    meta.validate()?;
                }
                summary.candidates += 1;

                let (origin, destination) = match filter.evaluate(entry.origin.as_ref(), destination.as_ref()) {
                    Ok(pair) => pair,
                    Err(rejection) => {
                        match rejection {
                            Rejection::Undefined => summary.undefined += 1,
                            Rejection::UntargetedVariant => summary.untargeted += 1,
                            Rejection::ProtocolMismatch => summary.protocol_mismatch += 1,
                        }
                        continue;
                    }
                };

                let destination = if substitute {
                    self.localize(destination)?
                } else {
                    destination.clone()
                };

                let path = UpgradePath::new(origin.clone(), destination);
                if !seen.insert(path.name.clone()) {
                    return Err(HarnessError::DuplicateUpgradePath(path.name));
                }

                debug!(path = %path.name, from = %path.starting_version, to = %path.upgrade_version, "upgrade path accepted");
                paths.push(path);
            }
        }

        summary.emitted = paths.len();
        info!(
            emitted = summary.emitted,
            candidates = summary.candidates,
            override_active,
            full_matrix = self.options.full_matrix,
            local_family = %self.options.local_family,
            "resolved upgrade paths"
        );

        Ok((paths, summary))
    }

    fn localize(&self, destination: &VersionMeta) -> Result<VersionMeta> {
        let local_ref = self
            .options
            .local_ref
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| HarnessError::MissingLocalRef(destination.name.clone()))?;
        Ok(destination.clone_with_local_version(local_ref))
    }
}

/// Resolve upgrade paths over the built-in manifest
pub fn build_upgrade_pairs(options: ResolverOptions) -> Result<Vec<UpgradePath>> {
    PathBuilder::with_builtin(options)?.build_upgrade_pairs()
}
