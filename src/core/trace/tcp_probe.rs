// src/core/trace/tcp_probe.rs

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use super::TraceProbe;
use super::icmp::{IcmpKind, parse_icmp_reply};
use crate::config::Settings;
use crate::core::error::ProbeFailure;
use crate::core::models::{Hop, HopMap};

/// Upper bound for a single blocking read on the ICMP socket, so the TCP
/// socket state is checked regularly while waiting for a hop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP SYN traceroute built from ordinary connect attempts with a limited TTL.
///
/// Each TTL gets its own TCP socket. Routers that drop the SYN answer with ICMP
/// Time Exceeded, which is read from a raw ICMPv4 socket and matched on the
/// quoted ports. A connection that completes or is refused means the target
/// itself answered. Requires raw socket privilege; IPv4 only.
pub struct TcpTraceProbe {
    resolver: TokioAsyncResolver,
    max_ttl: u8,
    hop_timeout: Duration,
}

impl TcpTraceProbe {
    pub fn new(settings: &Settings) -> Self {
        Self {
            resolver: system_resolver(),
            max_ttl: settings.max_ttl,
            hop_timeout: Duration::from_millis(settings.probe_timeout_ms),
        }
    }

    async fn resolve(&self, host: &str) -> Result<Ipv4Addr, ProbeFailure> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return match ip {
                IpAddr::V4(v4) => Ok(v4),
                IpAddr::V6(_) => Err(ProbeFailure::NoUsableAddress(host.to_string())),
            };
        }

        debug!(host, "Resolving target.");
        let lookup = self.resolver.ipv4_lookup(host).await.map_err(|e| {
            warn!(host, error = %e, "Target resolution failed.");
            ProbeFailure::Resolution { host: host.to_string(), reason: e.to_string() }
        })?;

        lookup
            .iter()
            .next()
            .map(|record| record.0)
            .ok_or_else(|| ProbeFailure::NoUsableAddress(host.to_string()))
    }
}

/// Resolver following the host's own configuration, so internal names resolve
/// the same way they do for the scanned request.
fn system_resolver() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        warn!(error = %e, "System resolver configuration unavailable, using defaults.");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    })
}

#[async_trait]
impl TraceProbe for TcpTraceProbe {
    async fn probe(&self, host: &str, port: u16) -> Result<HopMap, ProbeFailure> {
        let target = self.resolve(host).await?;
        info!(host, %target, port, "Starting TCP traceroute.");

        let (max_ttl, hop_timeout) = (self.max_ttl, self.hop_timeout);
        let host_owned = host.to_string();
        let hops = spawn_blocking(move || run_trace(&host_owned, target, port, max_ttl, hop_timeout))
            .await
            .map_err(|e| ProbeFailure::Task(e.to_string()))??;

        info!(host, port, hops = hops.len(), reached = hops.reached(), "TCP traceroute finished.");
        Ok(hops)
    }
}

/// What came back for one TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HopAnswer {
    /// A router on the path dropped the probe.
    Router(Ipv4Addr),
    /// A router refused to forward the probe, nothing further will answer.
    Unreachable(Ipv4Addr),
    /// The target itself answered.
    Destination,
}

fn run_trace(
    host: &str,
    target: Ipv4Addr,
    port: u16,
    max_ttl: u8,
    hop_timeout: Duration,
) -> Result<HopMap, ProbeFailure> {
    let icmp = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
        .map_err(ProbeFailure::SocketCreation)?;
    let io_err = |source: io::Error| ProbeFailure::Io { host: host.to_string(), port, source };

    let mut hops = HopMap::new();
    for ttl in 1..=max_ttl {
        let answer = probe_hop(&icmp, target, port, ttl, hop_timeout).map_err(io_err)?;
        match answer {
            Some(HopAnswer::Router(router)) => {
                debug!(ttl, %router, "Hop answered.");
                hops.insert(ttl, Hop::new(router.to_string(), false));
            }
            Some(HopAnswer::Unreachable(router)) => {
                debug!(ttl, %router, "Hop reported destination unreachable.");
                hops.insert(ttl, Hop::new(router.to_string(), router == target));
                break;
            }
            Some(HopAnswer::Destination) => {
                debug!(ttl, %target, "Target reached.");
                hops.insert(ttl, Hop::new(target.to_string(), true));
                break;
            }
            None => debug!(ttl, "No answer for hop."),
        }
    }
    finish_trace(host, port, hops)
}

/// A trace in which nothing answered says nothing about the route.
fn finish_trace(host: &str, port: u16, hops: HopMap) -> Result<HopMap, ProbeFailure> {
    if hops.is_empty() {
        warn!(host, port, "No hop answered, target unreachable.");
        return Err(ProbeFailure::Unreachable { host: host.to_string(), port });
    }
    Ok(hops)
}

fn probe_hop(
    icmp: &Socket,
    target: Ipv4Addr,
    port: u16,
    ttl: u8,
    hop_timeout: Duration,
) -> io::Result<Option<HopAnswer>> {
    let tcp = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    tcp.set_ttl(u32::from(ttl))?;
    tcp.set_nonblocking(true)?;
    tcp.bind(&SockAddr::from(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))))?;
    let local_port = tcp
        .local_addr()?
        .as_socket()
        .map(|addr| addr.port())
        .unwrap_or_default();

    match tcp.connect(&SockAddr::from(SocketAddr::from((target, port)))) {
        Ok(()) => return Ok(Some(HopAnswer::Destination)),
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            return Ok(Some(HopAnswer::Destination));
        }
        Err(e) if connect_in_progress(&e) => {}
        Err(e) => return Err(e),
    }

    let deadline = Instant::now() + hop_timeout;
    let mut buf = [0u8; 1500];
    loop {
        if connection_answered(&tcp) {
            return Ok(Some(HopAnswer::Destination));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        icmp.set_read_timeout(Some((deadline - now).min(POLL_INTERVAL)))?;

        match (&*icmp).read(&mut buf) {
            Ok(len) => {
                let Some(reply) = parse_icmp_reply(&buf[..len]) else {
                    continue;
                };
                if !reply.quotes(target, local_port, port) {
                    continue;
                }
                return Ok(Some(match reply.kind {
                    IcmpKind::TimeExceeded => HopAnswer::Router(reply.responder),
                    IcmpKind::DestinationUnreachable if reply.responder == target => HopAnswer::Destination,
                    IcmpKind::DestinationUnreachable => HopAnswer::Unreachable(reply.responder),
                }));
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e),
        }
    }
}

fn connect_in_progress(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EINPROGRESS)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// A SYN-ACK (connected) or RST (refused) both come from the target.
fn connection_answered(tcp: &Socket) -> bool {
    match tcp.take_error() {
        Ok(Some(e)) if e.kind() == io::ErrorKind::ConnectionRefused => true,
        Ok(Some(e)) => {
            debug!(error = %e, "Pending connection reported an error.");
            false
        }
        _ => tcp.peer_addr().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_trace_is_unreachable() {
        let err = finish_trace("silent.tld", 443, HopMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ProbeFailure::Unreachable { ref host, port: 443 } if host == "silent.tld"
        ));
    }

    #[test]
    fn answered_trace_is_kept() {
        let hops: HopMap = [(2, Hop::new("10.0.0.2", false))].into_iter().collect();
        let kept = finish_trace("host.tld", 80, hops.clone()).unwrap();
        assert_eq!(kept, hops);
    }

    #[test]
    fn in_progress_connect_is_not_an_error() {
        assert!(connect_in_progress(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!connect_in_progress(&io::Error::from(io::ErrorKind::PermissionDenied)));
        #[cfg(unix)]
        assert!(connect_in_progress(&io::Error::from_raw_os_error(libc::EINPROGRESS)));
    }
}
