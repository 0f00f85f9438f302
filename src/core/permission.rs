// src/core/permission.rs

use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

/// Answers whether the process may open raw probe sockets.
pub trait PermissionGate: Send + Sync {
    fn has_permission(&self) -> bool;
}

/// Checks privilege by actually opening a raw ICMPv4 socket, the same socket
/// the TCP traceroute listens on. Covers root as well as `CAP_NET_RAW`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSocketPermission;

impl PermissionGate for RawSocketPermission {
    fn has_permission(&self) -> bool {
        match Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Raw socket creation refused.");
                false
            }
        }
    }
}
