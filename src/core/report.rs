// src/core/report.rs

use std::sync::Arc;
use tracing::debug;

use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{ComparisonResult, Finding, HopSequence, PortPair, Severity};
use crate::core::output::OutputSink;

pub const FINDING_NAME: &str = "HTTP traceroute";

/// Emits the outcome of a route comparison: divergent routes go to the output
/// sink, identical routes become a finding.
pub struct ResultReporter {
    plugin: &'static str,
    kind: &'static str,
    output: Arc<dyn OutputSink>,
    kb: Arc<KnowledgeBase>,
}

impl ResultReporter {
    pub fn new(
        plugin: &'static str,
        kind: &'static str,
        output: Arc<dyn OutputSink>,
        kb: Arc<KnowledgeBase>,
    ) -> Self {
        Self { plugin, kind, output, kb }
    }

    pub fn report(&self, ports: PortPair, result: &ComparisonResult, host: &str) {
        match result {
            ComparisonResult::Identical => {
                debug!(host, "Routes identical, recording finding.");
                let finding = Finding::new(
                    FINDING_NAME,
                    &same_routes_description(host, ports),
                    Severity::Info,
                    self.plugin,
                    self.kind,
                    host,
                );
                self.kb.append(self.plugin, self.kind, finding);
            }
            ComparisonResult::Divergent { standard, target } => {
                debug!(host, standard_hops = standard.len(), target_hops = target.len(), "Routes divergent.");
                self.output
                    .information(&format_divergence(host, ports, standard, target));
            }
        }
    }
}

pub fn same_routes_description(host: &str, ports: PortPair) -> String {
    format!(
        "The routes to target \"{host}\" using ports {} and {} are the same.",
        ports.standard_port, ports.target_port
    )
}

/// Renders the divergence message. Hops are renumbered from 0 and the standard
/// port always comes first.
pub fn format_divergence(
    host: &str,
    ports: PortPair,
    standard: &HopSequence,
    target: &HopSequence,
) -> String {
    format!(
        "Routes to target \"{host}\" using ports {} and {} are different:\n{}\n{}",
        ports.standard_port,
        ports.target_port,
        format_trace(host, ports.standard_port, standard),
        format_trace(host, ports.target_port, target),
    )
}

fn format_trace(host: &str, port: u16, sequence: &HopSequence) -> String {
    let mut block = format!("  TCP trace to {host}:{port}");
    for (index, address) in sequence.iter().enumerate() {
        block.push_str(&format!("\n    {index} {address}"));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::BufferedOutput;
    use crate::core::models::OutputMessage;

    fn seq(addrs: &[&str]) -> HopSequence {
        addrs.iter().map(|a| a.to_string()).collect::<Vec<_>>().into()
    }

    fn reporter() -> (ResultReporter, Arc<BufferedOutput>, Arc<KnowledgeBase>) {
        let output = Arc::new(BufferedOutput::new());
        let kb = Arc::new(KnowledgeBase::new());
        let reporter = ResultReporter::new("plugin", "kind", output.clone(), kb.clone());
        (reporter, output, kb)
    }

    #[test]
    fn divergence_layout() {
        let ports = PortPair::new(80, 443).unwrap();
        let message = format_divergence(
            "host.tld",
            ports,
            &seq(&["192.168.1.1", "200.200.0.0", "207.46.47.14"]),
            &seq(&["192.168.1.1", "200.115.195.33", "207.46.47.14"]),
        );
        assert_eq!(
            message,
            "Routes to target \"host.tld\" using ports 80 and 443 are different:\n\
             \x20 TCP trace to host.tld:80\n    0 192.168.1.1\n    1 200.200.0.0\n    2 207.46.47.14\n\
             \x20 TCP trace to host.tld:443\n    0 192.168.1.1\n    1 200.115.195.33\n    2 207.46.47.14"
        );
    }

    #[test]
    fn empty_trace_has_header_only() {
        let ports = PortPair::new(80, 8080).unwrap();
        let message = format_divergence("h", ports, &seq(&[]), &seq(&["a"]));
        assert_eq!(
            message,
            "Routes to target \"h\" using ports 80 and 8080 are different:\n  TCP trace to h:80\n  TCP trace to h:8080\n    0 a"
        );
    }

    #[test]
    fn identical_records_finding_only() {
        let (reporter, output, kb) = reporter();
        reporter.report(PortPair::new(80, 443).unwrap(), &ComparisonResult::Identical, "host.tld");

        assert!(output.drain().is_empty());
        let findings = kb.get("plugin", "kind");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "HTTP traceroute");
        assert_eq!(findings[0].host, "host.tld");
        assert_eq!(
            findings[0].description,
            "The routes to target \"host.tld\" using ports 80 and 443 are the same."
        );
    }

    #[test]
    fn divergent_writes_message_only() {
        let (reporter, output, kb) = reporter();
        let result = ComparisonResult::Divergent {
            standard: seq(&["a"]),
            target: seq(&["b"]),
        };
        reporter.report(PortPair::new(80, 443).unwrap(), &result, "host.tld");

        let messages = output.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], OutputMessage::Information(m) if m.starts_with("Routes to target")));
        assert!(kb.all().is_empty());
    }
}
