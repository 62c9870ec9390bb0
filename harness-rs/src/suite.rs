//! Generated upgrade suites
//!
//! Each upgrade test family is instantiated once per `UpgradePath`. Suite
//! names embed the cluster shape and the path name, e.g.
//! `TestThriftSchemaUpgradeNodes1RF1_Upgrade_current_3_0_x_To_indev_3_x`,
//! and must be unique across everything registered.

use crate::errors::{HarnessError, Result};
use crate::upgrade::UpgradePath;
use serde::Serialize;
use std::collections::HashSet;

/// One generated suite: a test family bound to an upgrade path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSuite {
    pub name: String,
    pub base: String,
    pub nodes: usize,
    pub replication_factor: usize,
    pub upgrade_path: UpgradePath,
    /// Whether the runner should execute this suite
    pub enabled: bool,
}

#[derive(Debug, Default)]
pub struct SuiteRegistry {
    names: HashSet<String>,
    suites: Vec<GeneratedSuite>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suite_name(base: &str, nodes: usize, replication_factor: usize, path: &UpgradePath) -> String {
        format!("{}Nodes{}RF{}_{}", base, nodes, replication_factor, path.name)
    }

    pub fn register(&mut self, suite: GeneratedSuite) -> Result<&GeneratedSuite> {
        if !self.names.insert(suite.name.clone()) {
            return Err(HarnessError::DuplicateSuite(suite.name));
        }
        self.suites.push(suite);
        Ok(&self.suites[self.suites.len() - 1])
    }

    /// Register one suite of `base` per path
    ///
    /// Nothing is registered if any generated name collides.
    pub fn generate(
        &mut self,
        base: &str,
        nodes: usize,
        replication_factor: usize,
        paths: &[UpgradePath],
        enabled: bool,
    ) -> Result<Vec<GeneratedSuite>> {
        let generated: Vec<GeneratedSuite> = paths
            .iter()
            .map(|path| GeneratedSuite {
                name: Self::suite_name(base, nodes, replication_factor, path),
                base: base.to_string(),
                nodes,
                replication_factor,
                upgrade_path: path.clone(),
                enabled,
            })
            .collect();

        let mut batch = HashSet::new();
        for suite in &generated {
            if self.names.contains(&suite.name) || !batch.insert(suite.name.as_str()) {
                return Err(HarnessError::DuplicateSuite(suite.name.clone()));
            }
        }

        for suite in &generated {
            self.register(suite.clone())?;
        }
        Ok(generated)
    }

    pub fn suites(&self) -> &[GeneratedSuite] {
        &self.suites
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
