// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;
use url::Url;

use crate::core::error::TargetError;

// --- Modelli Traceroute ---
// Traceroute Models

/// A single hop discovered by a traceroute: the responding address and whether
/// the destination itself answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub address: String,
    pub reached: bool,
}

impl Hop {
    pub fn new(address: impl Into<String>, reached: bool) -> Self {
        Self { address: address.into(), reached }
    }
}

/// Hops of one traceroute keyed by the TTL that produced them.
///
/// Hop numbers are not necessarily contiguous: a TTL that got no answer has no
/// entry. The map carries no ordering of its own, use
/// [`crate::core::route::extract_sequence`] to get the hops in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopMap {
    hops: HashMap<u8, Hop>,
}

impl HopMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ttl: u8, hop: Hop) {
        self.hops.insert(ttl, hop);
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// True when any hop is flagged as the destination.
    pub fn reached(&self) -> bool {
        self.hops.values().any(|hop| hop.reached)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u8, &Hop)> {
        self.hops.iter()
    }
}

impl FromIterator<(u8, Hop)> for HopMap {
    fn from_iter<I: IntoIterator<Item = (u8, Hop)>>(iter: I) -> Self {
        Self { hops: iter.into_iter().collect() }
    }
}

/// Hop addresses in path order. Index 0 is the hop with the lowest TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopSequence(Vec<String>);

impl HopSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for HopSequence {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

/// The two ports whose routes get compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPair {
    pub standard_port: u16,
    pub target_port: u16,
}

impl PortPair {
    pub fn new(standard_port: u16, target_port: u16) -> Result<Self, TargetError> {
        for port in [standard_port, target_port] {
            if port == 0 {
                return Err(TargetError::InvalidPort(port));
            }
        }
        Ok(Self { standard_port, target_port })
    }
}

/// Outcome of comparing the standard-port route with the target-port route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonResult {
    Identical,
    /// Both full sequences, standard port first.
    Divergent {
        standard: HopSequence,
        target: HopSequence,
    },
}

/// The request under test, reduced to what route analysis needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub host: String,
    pub port: u16,
}

impl TargetRequest {
    /// Builds the request from a URL. An explicit port wins, otherwise the
    /// scheme's well-known port is used, and `fallback_port` covers schemes
    /// with no known default.
    pub fn from_url(url: &Url, fallback_port: u16) -> Result<Self, TargetError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(url.to_string()))?;
        // `host_str` keeps the brackets around IPv6 literals.
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

        let port = url.port_or_known_default().unwrap_or(fallback_port);
        if port == 0 {
            return Err(TargetError::InvalidPort(port));
        }

        Ok(Self { host, port })
    }

    /// Parses free-form user input, assuming `https://` when no scheme is given.
    pub fn parse(input: &str, fallback_port: u16) -> Result<Self, TargetError> {
        let input = input.trim();
        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };
        let url = Url::parse(&with_scheme)
            .map_err(|e| TargetError::InvalidUrl { input: input.to_string(), source: e })?;
        Self::from_url(&url, fallback_port)
    }
}

// --- Modelli Knowledge Base ---
// Knowledge Base Models

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
pub enum Severity {
    Info,
}

/// A finding recorded in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub plugin: String,
    pub kind: String,
    /// Host the finding is about.
    pub host: String,
    pub discovered_at: DateTime<Utc>,
}

impl Finding {
    pub fn new(
        name: &str,
        description: &str,
        severity: Severity,
        plugin: &str,
        kind: &str,
        host: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            severity,
            plugin: plugin.to_string(),
            kind: kind.to_string(),
            host: host.to_string(),
            discovered_at: Utc::now(),
        }
    }

    /// Two findings are duplicates when everything but the timestamp matches.
    pub fn same_as(&self, other: &Finding) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.severity == other.severity
            && self.plugin == other.plugin
            && self.kind == other.kind
            && self.host == other.host
    }
}

/// Normal completions of a route analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteVerdict {
    Identical,
    Divergent,
    /// Raw sockets unavailable, nothing was probed.
    PermissionDenied,
}

// --- Report Principale ---
// Main Report

/// How a single route scan ended, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ScanStatus {
    #[strum(to_string = "Routes identical")]
    Identical,
    #[strum(to_string = "Routes divergent")]
    Divergent,
    #[strum(to_string = "Already analysed")]
    AlreadyRan,
    #[strum(to_string = "Missing privileges")]
    PermissionDenied,
    #[strum(to_string = "Probe failed")]
    Failed(String),
}

/// Message written to the output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMessage {
    Information(String),
    Error(String),
}

/// Everything the front end needs to render one finished scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub target: TargetRequest,
    /// Absent when the target port could not form a valid pair.
    pub ports: Option<PortPair>,
    /// Name and description of the plugin that ran.
    pub plugin: &'static str,
    pub plugin_description: &'static str,
    /// When the analysis of this host was admitted.
    pub analysed_at: Option<DateTime<Utc>>,
    pub status: ScanStatus,
    pub messages: Vec<OutputMessage>,
    pub findings: Vec<Finding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_uses_explicit_port() {
        let url = Url::parse("https://host.tld:4444/").unwrap();
        let target = TargetRequest::from_url(&url, 443).unwrap();
        assert_eq!(target.host, "host.tld");
        assert_eq!(target.port, 4444);
    }

    #[test]
    fn target_uses_scheme_port() {
        let https = TargetRequest::parse("https://host.tld/", 8443).unwrap();
        assert_eq!(https.port, 443);

        let http = TargetRequest::parse("http://host.tld/", 8443).unwrap();
        assert_eq!(http.port, 80);
    }

    #[test]
    fn target_falls_back_for_unknown_scheme() {
        let target = TargetRequest::parse("gopher2://host.tld/", 8443).unwrap();
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn bare_host_assumes_https() {
        let target = TargetRequest::parse("  example.com ", 8443).unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 443);
    }

    #[test]
    fn ipv6_literal_loses_brackets() {
        let target = TargetRequest::parse("http://[::1]:8080/", 443).unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.port, 8080);
    }

    #[test]
    fn url_without_host_is_rejected() {
        let url = Url::parse("data:text/plain,Stuff").unwrap();
        assert!(matches!(
            TargetRequest::from_url(&url, 443),
            Err(TargetError::MissingHost(_))
        ));
    }

    #[test]
    fn port_pair_rejects_zero() {
        assert!(PortPair::new(80, 0).is_err());
        assert!(PortPair::new(0, 443).is_err());
        let pair = PortPair::new(80, 80).unwrap();
        assert_eq!(pair.standard_port, pair.target_port);
    }

    #[test]
    fn hop_map_reports_reached() {
        let mut map = HopMap::new();
        map.insert(1, Hop::new("10.0.0.1", false));
        assert!(!map.reached());
        map.insert(4, Hop::new("10.0.0.9", true));
        assert!(map.reached());
        assert_eq!(map.len(), 2);
        let last = map.iter().max_by_key(|(ttl, _)| **ttl).map(|(_, hop)| hop.address.as_str());
        assert_eq!(last, Some("10.0.0.9"));
    }

    #[test]
    fn duplicate_findings_ignore_timestamp() {
        let a = Finding::new("HTTP traceroute", "same", Severity::Info, "p", "k", "host.tld");
        let mut b = a.clone();
        b.discovered_at = Utc::now() + chrono::Duration::seconds(5);
        assert!(a.same_as(&b));
        b.host = "other.tld".to_string();
        assert!(!a.same_as(&b));
    }
}
