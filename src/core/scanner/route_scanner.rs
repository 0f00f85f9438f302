// src/core/scanner/route_scanner.rs

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::core::error::DiscoverError;
use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{ComparisonResult, HopMap, PortPair, RouteVerdict, TargetRequest};
use crate::core::output::OutputSink;
use crate::core::permission::PermissionGate;
use crate::core::report::ResultReporter;
use crate::core::route::{compare_routes, extract_sequence};
use crate::core::run_once::RunOnceGuard;
use crate::core::trace::TraceProbe;

pub const PLUGIN_NAME: &str = "http_vs_https_dist";
pub const FINDING_KIND: &str = "http_vs_https_dist";

/// Written to the output sink when raw sockets cannot be opened.
pub const PERM_ERROR_MSG: &str = "vanguard won't be able to run the http_vs_https_dist route analysis. \
It seems that the user running the process does not have enough privileges to open raw sockets.";

const LONG_DESCRIPTION: &str = "\
This plugin analyzes the network distance between the HTTP port and the port of the
scanned request, giving a detailed report of the traversed hosts in transit to
<target:port>.

You need root/admin privileges (or CAP_NET_RAW) to run this plugin successfully.

Explicitly declared ports in the entered target override the configured https_port.
For example, if the target is 'https://host.tld:444' and http_port is 80, the
analysis is performed on ports 80 and 444.

Two configurable parameters exist:
    - http_port
    - https_port
";

/// Compares the route to a target's standard port with the route to the port
/// of the request under test.
///
/// One instance is bound to one target: `discover` does its work once and
/// answers every later call with [`DiscoverError::AlreadyRan`].
pub struct RouteDivergenceScanner {
    standard_port: u16,
    concurrent_probes: bool,
    guard: RunOnceGuard,
    permission: Arc<dyn PermissionGate>,
    probe: Arc<dyn TraceProbe>,
    output: Arc<dyn OutputSink>,
    reporter: ResultReporter,
}

impl RouteDivergenceScanner {
    pub fn new(
        settings: &Settings,
        permission: Arc<dyn PermissionGate>,
        probe: Arc<dyn TraceProbe>,
        output: Arc<dyn OutputSink>,
        kb: Arc<KnowledgeBase>,
    ) -> Self {
        Self {
            standard_port: settings.http_port,
            concurrent_probes: settings.concurrent_probes,
            guard: RunOnceGuard::new(),
            permission,
            probe,
            reporter: ResultReporter::new(PLUGIN_NAME, FINDING_KIND, Arc::clone(&output), kb),
            output,
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn long_description(&self) -> &'static str {
        LONG_DESCRIPTION
    }

    /// When `discover` was admitted, if it has been.
    pub fn ran_at(&self) -> Option<DateTime<Utc>> {
        self.guard.ran_at()
    }

    /// Runs the analysis for `request`.
    ///
    /// Permission denial is handled here (error message, no probes) and still
    /// returns `Ok`. Probe failures propagate unchanged with no partial report.
    pub async fn discover(&self, request: &TargetRequest) -> Result<RouteVerdict, DiscoverError> {
        self.guard.admit()?;

        if !self.permission.has_permission() {
            warn!(host = %request.host, "Raw socket privileges missing, skipping route analysis.");
            self.output.error(PERM_ERROR_MSG);
            return Ok(RouteVerdict::PermissionDenied);
        }

        let ports = PortPair::new(self.standard_port, request.port)?;
        let host = request.host.as_str();
        info!(host, standard_port = ports.standard_port, target_port = ports.target_port, "Starting route analysis.");

        let (target_hops, standard_hops) = self.trace_both(host, ports).await?;

        let result = compare_routes(extract_sequence(&standard_hops), extract_sequence(&target_hops));
        let verdict = match result {
            ComparisonResult::Identical => RouteVerdict::Identical,
            ComparisonResult::Divergent { .. } => RouteVerdict::Divergent,
        };
        self.reporter.report(ports, &result, host);

        info!(host, verdict = ?verdict, "Route analysis finished.");
        Ok(verdict)
    }

    /// Traces the target port first, then the standard port. Returns the hop
    /// maps in that order.
    async fn trace_both(&self, host: &str, ports: PortPair) -> Result<(HopMap, HopMap), DiscoverError> {
        if self.concurrent_probes {
            debug!(host, "Tracing both ports concurrently.");
            let hops = tokio::try_join!(
                self.probe.probe(host, ports.target_port),
                self.probe.probe(host, ports.standard_port)
            )?;
            return Ok(hops);
        }

        debug!(host, "Tracing ports sequentially.");
        let target_hops = self.probe.probe(host, ports.target_port).await?;
        let standard_hops = self.probe.probe(host, ports.standard_port).await?;
        Ok((target_hops, standard_hops))
    }
}
