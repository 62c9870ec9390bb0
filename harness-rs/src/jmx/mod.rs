//! JMX access to nodes under test
//!
//! - `MetricsProbe`: read/write attributes and invoke operations on MBeans
//! - `JolokiaAgent`: probe implementation over the Jolokia HTTP bridge
//! - `hints`: polling hinted-handoff metrics until hints are created/delivered

pub mod hints;
mod jolokia;

pub use hints::{check_delivery, hints_created_mbean, HintDelivery, PollOptions};
pub use jolokia::{JolokiaAgent, JolokiaRequest, DEFAULT_JOLOKIA_JAR, DEFAULT_JOLOKIA_PORT};

use crate::errors::{HarnessError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const MBEAN_DOMAIN_PREFIX: &str = "org.apache.cassandra";

/// JVM flag that hides the attach socket from the Jolokia agent
pub const PERF_DISABLE_SHARED_MEM: &str = "-XX:+PerfDisableSharedMem";

/// MBean name for a database component
///
/// `make_mbean("db", "IndexSummaries", &[])` ->
/// `org.apache.cassandra.db:type=IndexSummaries`
pub fn make_mbean(package: &str, mbean_type: &str, properties: &[(&str, &str)]) -> String {
    let mut name = format!("{}.{}:type={}", MBEAN_DOMAIN_PREFIX, package, mbean_type);
    for (key, value) in properties {
        name.push_str(&format!(",{}={}", key, value));
    }
    name
}

/// Attribute and operation access to a node's MBeans
#[allow(async_fn_in_trait)]
pub trait MetricsProbe {
    async fn read_attribute(&self, mbean: &str, attribute: &str, path: Option<&str>) -> Result<Value>;

    async fn write_attribute(&self, mbean: &str, attribute: &str, value: Value, path: Option<&str>) -> Result<()>;

    async fn execute_method(&self, mbean: &str, operation: &str, arguments: Vec<Value>) -> Result<Value>;
}

/// Strip `-XX:+PerfDisableSharedMem` from a node's `cassandra-env.sh`
///
/// Returns whether the file changed.
pub fn remove_perf_disable_shared_mem<P: AsRef<Path>>(conf_dir: P) -> Result<bool> {
    let env_file = conf_dir.as_ref().join("cassandra-env.sh");
    if !env_file.exists() {
        return Err(HarnessError::FileNotFound(env_file.to_string_lossy().to_string()));
    }

    let content = fs::read_to_string(&env_file)
        .map_err(|e| HarnessError::IoError(format!("Failed to read cassandra-env.sh: {}", e)))?;

    if !content.contains(PERF_DISABLE_SHARED_MEM) {
        return Ok(false);
    }

    let mut kept: Vec<&str> = content
        .lines()
        .filter(|line| !line.contains(PERF_DISABLE_SHARED_MEM))
        .collect();
    if content.ends_with('\n') {
        kept.push("");
    }

    fs::write(&env_file, kept.join("\n"))
        .map_err(|e| HarnessError::IoError(format!("Failed to write cassandra-env.sh: {}", e)))?;

    Ok(true)
}
