//! Jolokia HTTP bridge to a node's JMX
//!
//! The agent is attached to a running node with
//! `java -jar <jolokia-jvm-agent.jar> --host <host> start <pid>` and then
//! answers JSON requests on `http://<host>:8778/jolokia/`.

use crate::errors::{HarnessError, Result};
use crate::jmx::MetricsProbe;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_JOLOKIA_JAR: &str = "lib/jolokia-jvm-1.2.3-agent.jar";
pub const DEFAULT_JOLOKIA_PORT: u16 = 8778;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body understood by the Jolokia agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JolokiaRequest {
    Read {
        mbean: String,
        attribute: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Write {
        mbean: String,
        attribute: String,
        value: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Exec {
        mbean: String,
        operation: String,
        arguments: Vec<Value>,
    },
}

#[derive(Debug, Clone)]
pub struct JolokiaAgent {
    host: String,
    port: u16,
    jar: PathBuf,
    client: reqwest::Client,
}

impl JolokiaAgent {
    /// Agent for the node whose binary interface listens on `host`
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: DEFAULT_JOLOKIA_PORT,
            jar: PathBuf::from(DEFAULT_JOLOKIA_JAR),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_jar<P: AsRef<Path>>(mut self, jar: P) -> Self {
        self.jar = jar.as_ref().to_path_buf();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jolokia/", self.host, self.port)
    }

    /// Attach the agent to the node process
    pub fn start(&self, pid: u32) -> Result<()> {
        let pid = pid.to_string();
        let jar = self.jar.to_string_lossy().to_string();
        self.run_agent_command(&["-jar", &jar, "--host", &self.host, "start", &pid])
    }

    /// Detach the agent from the node process
    pub fn stop(&self, pid: u32) -> Result<()> {
        let pid = pid.to_string();
        let jar = self.jar.to_string_lossy().to_string();
        self.run_agent_command(&["-jar", &jar, "stop", &pid])
    }

    fn run_agent_command(&self, args: &[&str]) -> Result<()> {
        let command_line = format!("java {}", args.join(" "));
        let output = Command::new("java")
            .args(args)
            .output()
            .map_err(|e| HarnessError::Jolokia(format!("Failed to run '{}': {}", command_line, e)))?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(command = %command_line, status = ?output.status.code(), "jolokia agent command failed");
            return Err(HarnessError::Jolokia(format!(
                "'{}' exited with status {:?}; output: {}{}",
                command_line,
                output.status.code(),
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn query(&self, request: &JolokiaRequest) -> Result<Value> {
        debug!(endpoint = %self.endpoint(), ?request, "jolokia request");

        let response = self
            .client
            .post(self.endpoint())
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Self::parse_response(status, &body)
    }

    /// Check HTTP and agent status, returning the `value` field
    pub fn parse_response(http_status: u16, body: &str) -> Result<Value> {
        if http_status != 200 {
            return Err(HarnessError::Jolokia(format!(
                "Failed to query Jolokia agent; HTTP response code: {}; response: {}",
                http_status, body
            )));
        }

        let parsed: Value = serde_json::from_str(body)?;
        let agent_status = parsed.get("status").and_then(Value::as_u64);
        if agent_status != Some(200) {
            return Err(HarnessError::Jolokia(format!(
                "Jolokia agent returned non-200 status: {}",
                parsed
            )));
        }

        Ok(parsed.get("value").cloned().unwrap_or(Value::Null))
    }
}

impl MetricsProbe for JolokiaAgent {
    async fn read_attribute(&self, mbean: &str, attribute: &str, path: Option<&str>) -> Result<Value> {
        self.query(&JolokiaRequest::Read {
            mbean: mbean.to_string(),
            attribute: attribute.to_string(),
            path: path.map(str::to_string),
        })
        .await
    }

    async fn write_attribute(&self, mbean: &str, attribute: &str, value: Value, path: Option<&str>) -> Result<()> {
        self.query(&JolokiaRequest::Write {
            mbean: mbean.to_string(),
            attribute: attribute.to_string(),
            value,
            path: path.map(str::to_string),
        })
        .await?;
        Ok(())
    }

    async fn execute_method(&self, mbean: &str, operation: &str, arguments: Vec<Value>) -> Result<Value> {
        self.query(&JolokiaRequest::Exec {
            mbean: mbean.to_string(),
            operation: operation.to_string(),
            arguments,
        })
        .await
    }
}
