//! Hinted handoff delivery polling
//!
//! While replicas are down the coordinator stores hints for them; each
//! destination has a `Hints_created-<address>` counter. A delivery check
//! waits for every counter to reach the expected number of hints and,
//! optionally, for all of them to drain back to zero once the replicas
//! return.

use crate::errors::{HarnessError, Result};
use crate::jmx::{make_mbean, MetricsProbe};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub timeout: Duration,
    pub interval: Duration,
    /// Extra hints tolerated above the expected count (system tables add some)
    pub skew: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            interval: Duration::from_millis(500),
            skew: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HintDelivery {
    pub created: bool,
    pub delivered: bool,
}

pub fn hints_created_mbean(destination: &str) -> String {
    let name = format!("Hints_created-{}", destination);
    make_mbean("metrics", "HintedHandOffManager", &[("name", name.as_str())])
}

fn as_count(mbean: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
        .ok_or_else(|| HarnessError::Jolokia(format!("non-numeric Count for {}: {}", mbean, value)))
}

async fn read_counts<P: MetricsProbe>(probe: &P, mbeans: &[String]) -> Result<Vec<u64>> {
    let mut counts = Vec::with_capacity(mbeans.len());
    for mbean in mbeans {
        let value = probe.read_attribute(mbean, "Count", None).await?;
        counts.push(as_count(mbean, &value)?);
    }
    Ok(counts)
}

/// Wait for hints to be created for every destination, then optionally delivered
///
/// Probe errors are logged and retried until the timeout elapses; the
/// result reports how far the check got.
pub async fn check_delivery<P: MetricsProbe>(
    probe: &P,
    destinations: &[String],
    num_hints: u64,
    wait_for_delivery: bool,
    options: &PollOptions,
) -> HintDelivery {
    let mbeans: Vec<String> = destinations.iter().map(|d| hints_created_mbean(d)).collect();
    let deadline = Instant::now() + options.timeout;
    let mut result = HintDelivery::default();
    let ceiling = num_hints.saturating_add(options.skew);

    while Instant::now() < deadline {
        match read_counts(probe, &mbeans).await {
            Ok(counts) => {
                if counts.iter().all(|c| num_hints <= *c && *c <= ceiling) {
                    result.created = true;
                    break;
                }
                debug!(?counts, expected = num_hints, "hints not yet created");
            }
            Err(e) => warn!(error = %e, "failed to read hint counters"),
        }
        sleep(options.interval).await;
    }

    if !result.created || !wait_for_delivery {
        return result;
    }

    while Instant::now() < deadline {
        match read_counts(probe, &mbeans).await {
            Ok(counts) if counts.iter().all(|c| *c == 0) => {
                result.delivered = true;
                break;
            }
            Ok(counts) => debug!(?counts, "hints not yet delivered"),
            Err(e) => warn!(error = %e, "failed to read hint counters"),
        }
        sleep(options.interval).await;
    }

    result
}
