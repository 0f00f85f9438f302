//! ICMPv4 error parsing for TCP traceroute.
//!
//! Routers answer an expired or undeliverable TCP SYN with an ICMP error that
//! quotes the original IP header plus at least the first 8 bytes of the TCP
//! header. The quoted ports tell which probe the answer belongs to.

use pnet::packet::Packet;
use pnet::packet::icmp::destination_unreachable::DestinationUnreachablePacket;
use pnet::packet::icmp::time_exceeded::TimeExceededPacket;
use pnet::packet::icmp::{IcmpPacket, IcmpTypes};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpKind {
    TimeExceeded,
    DestinationUnreachable,
}

/// An ICMP error quoting a TCP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpReply {
    pub responder: Ipv4Addr,
    pub kind: IcmpKind,
    pub quoted_dst: Ipv4Addr,
    pub quoted_src_port: u16,
    pub quoted_dst_port: u16,
}

impl IcmpReply {
    /// True if the quoted packet is the probe sent from `src_port` to `target:dst_port`.
    pub fn quotes(&self, target: Ipv4Addr, src_port: u16, dst_port: u16) -> bool {
        self.quoted_dst == target && self.quoted_src_port == src_port && self.quoted_dst_port == dst_port
    }
}

/// Validates an IPv4 header carrying `protocol` and returns it with the
/// bytes following its header (options included).
fn ipv4_with_payload(data: &[u8], protocol: IpNextHeaderProtocol) -> Option<(Ipv4Packet<'_>, &[u8])> {
    let ip = Ipv4Packet::new(data)?;
    if ip.get_version() != 4 || ip.get_next_level_protocol() != protocol {
        return None;
    }
    let header_len = usize::from(ip.get_header_length()) * 4;
    if header_len < Ipv4Packet::minimum_packet_size() {
        return None;
    }
    let rest = data.get(header_len..)?;
    Some((ip, rest))
}

/// Parses a packet read from a raw ICMPv4 socket (IP header included).
///
/// Returns `None` for anything that is not a Time Exceeded or Destination
/// Unreachable message quoting a TCP packet.
pub fn parse_icmp_reply(packet: &[u8]) -> Option<IcmpReply> {
    let (outer, icmp_data) = ipv4_with_payload(packet, IpNextHeaderProtocols::Icmp)?;
    let icmp = IcmpPacket::new(icmp_data)?;

    let (kind, quoted) = match icmp.get_icmp_type() {
        IcmpTypes::TimeExceeded => (
            IcmpKind::TimeExceeded,
            TimeExceededPacket::new(icmp_data)?.payload().to_vec(),
        ),
        IcmpTypes::DestinationUnreachable => (
            IcmpKind::DestinationUnreachable,
            DestinationUnreachablePacket::new(icmp_data)?.payload().to_vec(),
        ),
        _ => return None,
    };

    let (inner, tcp) = ipv4_with_payload(&quoted, IpNextHeaderProtocols::Tcp)?;
    // only the first 8 bytes of the TCP header are guaranteed to be quoted
    let ports = tcp.get(..4)?;

    Some(IcmpReply {
        responder: outer.get_source(),
        kind,
        quoted_dst: inner.get_destination(),
        quoted_src_port: u16::from_be_bytes([ports[0], ports[1]]),
        quoted_dst_port: u16::from_be_bytes([ports[2], ports[3]]),
    })
}
