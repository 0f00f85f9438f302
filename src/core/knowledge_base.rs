//! Findings store and the static catalog that explains each finding kind.
//!
//! Scanners append findings under a `(plugin, kind)` key. The store is shared
//! between the scan task and the front end, so every operation takes `&self`.

use crate::core::models::{Finding, Severity};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Human-readable explanation of one finding kind.
pub struct FindingDetail {
    /// Machine-readable finding kind, as used in the store key.
    pub kind: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    /// What the finding means for the target.
    pub description: &'static str,
    /// What an analyst can do with it.
    pub next_steps: &'static str,
}

static FINDINGS: &[FindingDetail] = &[FindingDetail {
    kind: "http_vs_https_dist",
    title: "HTTP traceroute",
    severity: Severity::Info,
    description: "TCP traceroutes to the standard HTTP port and to the port of the scanned request crossed the same sequence of hops. Traffic on both ports appears to be routed through the same network devices.",
    next_steps: "No middlebox specific to either port was observed on the path. If the ports are expected to be handled differently (load balancer, TLS terminator, WAF), the separation happens at or behind the final hop.",
}];

/// Retrieves the catalog entry for a finding kind.
pub fn get_finding_detail(kind: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.kind == kind)
}

type StoreKey = (String, String);

/// Thread-safe in-memory findings store.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    findings: RwLock<BTreeMap<StoreKey, Vec<Finding>>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding. Returns false when an equal finding is already stored.
    pub fn append(&self, plugin: &str, kind: &str, finding: Finding) -> bool {
        let mut findings = match self.findings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = findings
            .entry((plugin.to_string(), kind.to_string()))
            .or_default();

        if entry.iter().any(|existing| existing.same_as(&finding)) {
            debug!(plugin, kind, name = %finding.name, "Duplicate finding ignored.");
            return false;
        }

        info!(plugin, kind, name = %finding.name, "Finding recorded.");
        entry.push(finding);
        true
    }

    pub fn get(&self, plugin: &str, kind: &str) -> Vec<Finding> {
        let findings = match self.findings.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        findings
            .get(&(plugin.to_string(), kind.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// All findings, ordered by key then insertion.
    pub fn all(&self) -> Vec<Finding> {
        let findings = match self.findings.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        findings.values().flatten().cloned().collect()
    }

    pub fn cleanup(&self) {
        match self.findings.write() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Writes every finding as a pretty-printed JSON array.
    pub fn export_json(&self, path: &Path) -> std::io::Result<usize> {
        let findings = self.all();
        let json = serde_json::to_string_pretty(&findings)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), count = findings.len(), "Findings exported.");
        Ok(findings.len())
    }
}
