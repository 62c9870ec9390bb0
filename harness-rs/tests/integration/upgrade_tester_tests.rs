//! Integration tests for driving a cluster through generated upgrade suites
//!
//! A recording `ClusterDriver` stands in for the external cluster manager so
//! the exact sequence of lifecycle calls can be checked:
//! - prepare installs the starting version before populating and starting
//! - upgrade stops gently, switches install and restarts
//! - stage ordering is enforced
//! - a failed upgrade resumes from the stopped cluster
//! - suites generated from resolved paths map one-to-one onto testers

use dtest_core::cluster::{ClusterDriver, UpgradeStage, UpgradeTester};
use dtest_core::errors::{HarnessError, Result};
use dtest_core::suite::SuiteRegistry;
use dtest_core::upgrade::{build_upgrade_pairs, ResolverOptions, UpgradePath};

// ==================== Test Helper Functions ====================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Populate(usize),
    InstallDir(String),
    Start(bool),
    Stop(bool),
}

#[derive(Debug, Default)]
struct RecordingDriver {
    calls: Vec<Call>,
    fail_start: bool,
    /// Version whose install fails once
    fail_install: Option<String>,
}

impl ClusterDriver for RecordingDriver {
    fn populate(&mut self, nodes: usize) -> Result<()> {
        self.calls.push(Call::Populate(nodes));
        Ok(())
    }

    fn set_install_dir(&mut self, version: &str) -> Result<()> {
        self.calls.push(Call::InstallDir(version.to_string()));
        if self.fail_install.as_deref() == Some(version) {
            self.fail_install = None;
            return Err(HarnessError::Cluster(format!("no install for {}", version)));
        }
        Ok(())
    }

    fn start(&mut self, wait_for_binary_proto: bool) -> Result<()> {
        self.calls.push(Call::Start(wait_for_binary_proto));
        if self.fail_start {
            return Err(HarnessError::Cluster("node1 did not start".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self, gently: bool) -> Result<()> {
        self.calls.push(Call::Stop(gently));
        Ok(())
    }
}

fn targeted_paths() -> Vec<UpgradePath> {
    build_upgrade_pairs(ResolverOptions::targeted("3.0.x", "git:5ca1ab1e")).unwrap()
}

// ==================== Lifecycle ====================

/// Test: Prepare then upgrade issues the expected driver calls in order
#[test]
fn test_full_upgrade_sequence() {
    let path = targeted_paths().remove(0);
    let mut tester = UpgradeTester::new(RecordingDriver::default(), path);

    tester.prepare(3).unwrap();
    assert_eq!(tester.stage(), UpgradeStage::Prepared);

    tester.do_upgrade().unwrap();
    assert_eq!(tester.stage(), UpgradeStage::Upgraded);

    assert_eq!(
        tester.into_driver().calls,
        vec![
            Call::InstallDir("2.1.14".to_string()),
            Call::Populate(3),
            Call::Start(true),
            Call::Stop(true),
            Call::InstallDir("git:5ca1ab1e".to_string()),
            Call::Start(true),
        ]
    );
}

/// Test: Upgrading before prepare is rejected without touching the driver
#[test]
fn test_upgrade_requires_prepare() {
    let path = targeted_paths().remove(0);
    let mut tester = UpgradeTester::new(RecordingDriver::default(), path);

    assert!(matches!(tester.do_upgrade(), Err(HarnessError::Cluster(_))));
    assert!(tester.driver().calls.is_empty());
}

/// Test: Each stage runs once
#[test]
fn test_stages_are_not_repeatable() {
    let path = targeted_paths().remove(0);
    let mut tester = UpgradeTester::new(RecordingDriver::default(), path);

    tester.prepare(1).unwrap();
    assert!(tester.prepare(1).is_err());

    tester.do_upgrade().unwrap();
    assert!(tester.do_upgrade().is_err());
    assert_eq!(tester.driver().calls.len(), 6);
}

/// Test: Driver failure during prepare leaves the tester unprepared
#[test]
fn test_start_failure_propagates() {
    let path = targeted_paths().remove(0);
    let driver = RecordingDriver {
        fail_start: true,
        ..RecordingDriver::default()
    };
    let mut tester = UpgradeTester::new(driver, path);

    let err = tester.prepare(2).unwrap_err();
    assert!(err.to_string().contains("node1 did not start"));
    assert_eq!(tester.stage(), UpgradeStage::Created);

    tester.driver_mut().fail_start = false;
    tester.prepare(2).unwrap();
    assert_eq!(tester.stage(), UpgradeStage::Prepared);
}

/// Test: Upgrade failing after the stop resumes without stopping again
#[test]
fn test_failed_upgrade_resumes_from_stopped() {
    let path = targeted_paths().remove(0);
    let driver = RecordingDriver {
        fail_install: Some("git:5ca1ab1e".to_string()),
        ..RecordingDriver::default()
    };
    let mut tester = UpgradeTester::new(driver, path);

    tester.prepare(1).unwrap();
    assert!(tester.do_upgrade().is_err());
    assert_eq!(tester.stage(), UpgradeStage::Stopped);

    tester.do_upgrade().unwrap();
    assert_eq!(tester.stage(), UpgradeStage::Upgraded);

    assert_eq!(
        tester.into_driver().calls,
        vec![
            Call::InstallDir("2.1.14".to_string()),
            Call::Populate(1),
            Call::Start(true),
            Call::Stop(true),
            Call::InstallDir("git:5ca1ab1e".to_string()),
            Call::InstallDir("git:5ca1ab1e".to_string()),
            Call::Start(true),
        ]
    );
}

// ==================== Generated Suites ====================

/// Test: Every generated suite drives its own path to the local ref
#[test]
fn test_generated_suites_drive_their_paths() {
    let paths = targeted_paths();
    let mut registry = SuiteRegistry::new();
    let suites = registry.generate("TestCQLUpgrade", 2, 2, &paths, true).unwrap();

    assert_eq!(suites.len(), paths.len());
    assert_eq!(
        suites[0].name,
        "TestCQLUpgradeNodes2RF2_Upgrade_current_2_1_x_To_indev_3_0_x"
    );

    for suite in &suites {
        let mut tester = UpgradeTester::new(RecordingDriver::default(), suite.upgrade_path.clone());
        tester.prepare(suite.nodes).unwrap();
        tester.do_upgrade().unwrap();

        let calls = tester.into_driver().calls;
        assert_eq!(calls[0], Call::InstallDir(suite.upgrade_path.starting_version.clone()));
        assert_eq!(calls[4], Call::InstallDir("git:5ca1ab1e".to_string()));
    }
}
