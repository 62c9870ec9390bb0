//! Local database source tree
//!
//! Provides the version string and source-control reference of the code
//! under test:
//! - `base.version` from the tree's `build.xml`
//! - `git:<sha>` of the checked-out commit via `GitDriver`

mod git;

pub use git::GitDriver;

use crate::errors::{HarnessError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static BASE_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<property\s+name="base\.version"\s+value="([^"]+)""#)
        .expect("static build.xml pattern is valid")
});

/// Checkout of the database source
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `base.version` declared in `build.xml`
    pub fn base_version(&self) -> Result<String> {
        let build_xml = self.root.join("build.xml");
        if !build_xml.exists() {
            return Err(HarnessError::FileNotFound(build_xml.to_string_lossy().to_string()));
        }

        let content = fs::read_to_string(&build_xml)
            .map_err(|e| HarnessError::IoError(format!("Failed to read build.xml: {}", e)))?;

        parse_base_version(&content).ok_or_else(|| {
            HarnessError::ParseError(format!(
                "no base.version property in {}",
                build_xml.to_string_lossy()
            ))
        })
    }

    pub fn local_ref(&self) -> Result<Option<String>> {
        GitDriver::new(&self.root).local_ref()
    }
}

pub fn parse_base_version(build_xml: &str) -> Option<String> {
    BASE_VERSION
        .captures(build_xml)
        .map(|caps| caps[1].trim().to_string())
}
