//! Cluster lifecycle for upgrade suites
//!
//! The cluster processes themselves are managed by an external driver
//! (ccm-style). `UpgradeTester` sequences that driver through one
//! `UpgradePath`: install the starting version, bring the cluster up, then
//! stop, switch every node to the upgrade version and restart.

use crate::errors::{HarnessError, Result};
use crate::upgrade::UpgradePath;
use tracing::info;

/// External cluster process manager
pub trait ClusterDriver {
    fn populate(&mut self, nodes: usize) -> Result<()>;

    /// Point every node at the install for `version` (`2.1.14`, `git:cassandra-3.0`, ...)
    fn set_install_dir(&mut self, version: &str) -> Result<()>;

    fn start(&mut self, wait_for_binary_proto: bool) -> Result<()>;

    fn stop(&mut self, gently: bool) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStage {
    Created,
    Prepared,
    /// Stopped for the upgrade; the upgrade version is not running yet
    Stopped,
    Upgraded,
}

/// Drives one cluster through a single upgrade path
pub struct UpgradeTester<D: ClusterDriver> {
    driver: D,
    path: UpgradePath,
    stage: UpgradeStage,
}

impl<D: ClusterDriver> UpgradeTester<D> {
    pub fn new(driver: D, path: UpgradePath) -> Self {
        Self {
            driver,
            path,
            stage: UpgradeStage::Created,
        }
    }

    pub fn path(&self) -> &UpgradePath {
        &self.path
    }

    pub fn stage(&self) -> UpgradeStage {
        self.stage
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Install the starting version and start `nodes` nodes
    pub fn prepare(&mut self, nodes: usize) -> Result<()> {
        if self.stage != UpgradeStage::Created {
            return Err(HarnessError::Cluster(format!(
                "{} already prepared",
                self.path.name
            )));
        }
        if nodes == 0 {
            return Err(HarnessError::Cluster("cluster needs at least one node".to_string()));
        }

        info!(path = %self.path.name, version = %self.path.starting_version, nodes, "preparing cluster");
        self.driver.set_install_dir(&self.path.starting_version)?;
        self.driver.populate(nodes)?;
        self.driver.start(true)?;

        self.stage = UpgradeStage::Prepared;
        Ok(())
    }

    /// Stop the cluster, switch to the upgrade version and restart
    ///
    /// If switching or restarting fails the tester stays `Stopped`, and a
    /// retry resumes without stopping the cluster again.
    pub fn do_upgrade(&mut self) -> Result<()> {
        match self.stage {
            UpgradeStage::Created => {
                return Err(HarnessError::Cluster(format!(
                    "{} must be prepared before upgrading",
                    self.path.name
                )))
            }
            UpgradeStage::Upgraded => {
                return Err(HarnessError::Cluster(format!("{} already upgraded", self.path.name)))
            }
            UpgradeStage::Prepared => {
                info!(
                    path = %self.path.name,
                    from = %self.path.starting_version,
                    to = %self.path.upgrade_version,
                    "upgrading cluster"
                );
                self.driver.stop(true)?;
                self.stage = UpgradeStage::Stopped;
            }
            UpgradeStage::Stopped => {
                info!(path = %self.path.name, to = %self.path.upgrade_version, "resuming upgrade of stopped cluster");
            }
        }

        self.driver.set_install_dir(&self.path.upgrade_version)?;
        self.driver.start(true)?;

        self.stage = UpgradeStage::Upgraded;
        Ok(())
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}
