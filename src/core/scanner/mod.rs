// src/core/scanner/mod.rs

// Public interface of the `scanner` module: the route divergence scanner
// itself and the per-target session the front end drives it through.
pub mod route_scanner;

use std::sync::Arc;
use tracing::{error, info};

use crate::config::Settings;
use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{PortPair, RouteVerdict, ScanOutcome, ScanStatus, TargetRequest};
use crate::core::output::BufferedOutput;
use crate::core::permission::{PermissionGate, RawSocketPermission};
use crate::core::trace::{TcpTraceProbe, TraceProbe};
use self::route_scanner::{FINDING_KIND, PLUGIN_NAME, RouteDivergenceScanner};

/// A scanner bound to one target host, with its own output buffer.
///
/// Sessions are kept for the whole run of the application, so scanning the
/// same host again hits the scanner's run-once guard.
pub struct RouteScanSession {
    standard_port: u16,
    scanner: RouteDivergenceScanner,
    output: Arc<BufferedOutput>,
    kb: Arc<KnowledgeBase>,
}

impl RouteScanSession {
    /// Session using the real raw-socket permission check and TCP traceroute.
    pub fn new(settings: &Settings, kb: Arc<KnowledgeBase>) -> Self {
        Self::with_collaborators(
            settings,
            Arc::new(RawSocketPermission),
            Arc::new(TcpTraceProbe::new(settings)),
            kb,
        )
    }

    pub fn with_collaborators(
        settings: &Settings,
        permission: Arc<dyn PermissionGate>,
        probe: Arc<dyn TraceProbe>,
        kb: Arc<KnowledgeBase>,
    ) -> Self {
        let output = Arc::new(BufferedOutput::new());
        let scanner = RouteDivergenceScanner::new(
            settings,
            permission,
            probe,
            output.clone(),
            Arc::clone(&kb),
        );
        Self {
            standard_port: settings.http_port,
            scanner,
            output,
            kb,
        }
    }

    /// Runs the analysis and collects what it produced for display.
    pub async fn run(&self, target: &TargetRequest) -> ScanOutcome {
        info!(host = %target.host, port = target.port, "Route scan requested.");

        let status = match self.scanner.discover(target).await {
            Ok(RouteVerdict::Identical) => ScanStatus::Identical,
            Ok(RouteVerdict::Divergent) => ScanStatus::Divergent,
            Ok(RouteVerdict::PermissionDenied) => ScanStatus::PermissionDenied,
            Err(e) if e.is_run_once() => {
                info!(host = %target.host, "Route analysis already ran for this host.");
                ScanStatus::AlreadyRan
            }
            Err(e) => {
                error!(host = %target.host, error = %e, "Route analysis failed.");
                ScanStatus::Failed(e.to_string())
            }
        };

        let findings = self
            .kb
            .get(PLUGIN_NAME, FINDING_KIND)
            .into_iter()
            .filter(|f| f.host == target.host)
            .collect();

        ScanOutcome {
            target: target.clone(),
            ports: PortPair::new(self.standard_port, target.port).ok(),
            plugin: self.scanner.name(),
            plugin_description: self.scanner.long_description(),
            analysed_at: self.scanner.ran_at(),
            status,
            messages: self.output.drain(),
            findings,
        }
    }
}
