//! Git queries against the local database source tree
//!
//! Used to derive the source-control reference the upgrade suites upgrade
//! to when targeting the locally built code.
//!
//! ## Reference Format
//!
//! - `git:<sha>` for the checked-out commit (`git rev-parse HEAD`)

use crate::errors::{HarnessError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Read-only git driver for a source checkout
#[derive(Debug, Clone)]
pub struct GitDriver {
    repo_path: PathBuf,
}

impl GitDriver {
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn is_repository(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// Run a git command, returning trimmed stdout or `None` when git reports failure
    fn query(&self, args: &[&str]) -> Result<Option<String>> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .map_err(|e| HarnessError::IoError(format!("Failed to run git {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(None)
        } else {
            Ok(Some(stdout))
        }
    }

    /// Full sha of the checked-out commit
    pub fn head_sha(&self) -> Result<Option<String>> {
        if !self.repo_path.exists() {
            return Err(HarnessError::FileNotFound(self.repo_path.to_string_lossy().to_string()));
        }
        self.query(&["rev-parse", "HEAD"])
    }

    /// Version selector for the checked-out commit
    ///
    /// A directory without `.git` is not a checkout and yields `None`
    /// without invoking git.
    pub fn local_ref(&self) -> Result<Option<String>> {
        if self.repo_path.exists() && !self.is_repository() {
            return Ok(None);
        }
        Ok(self.head_sha()?.map(|sha| Self::format_ref(&sha)))
    }

    pub fn format_ref(sha: &str) -> String {
        format!("git:{}", sha.trim())
    }
}
