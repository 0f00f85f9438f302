// src/core/trace/mod.rs

pub mod icmp;
pub mod tcp_probe;

pub use tcp_probe::TcpTraceProbe;

use async_trait::async_trait;

use crate::core::error::ProbeFailure;
use crate::core::models::HopMap;

/// One traceroute towards `host:port`.
///
/// Implementations own their timing and retry behaviour. A failure means the
/// trace could not be carried out at all, not that some hops stayed silent.
#[async_trait]
pub trait TraceProbe: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> Result<HopMap, ProbeFailure>;
}
