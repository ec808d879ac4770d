//! ARP classification.

use std::net::Ipv4Addr;

use macaddr::MacAddr6;
use pnet::packet::arp::{ArpHardwareType, ArpHardwareTypes, ArpOperations, ArpPacket};
use pnet::packet::ethernet::{EtherType, EtherTypes};
use tracing::debug;

use super::{truncated, FrameMeta};
use crate::domain::{Observation, ObservationKind};
use crate::error::DecodeError;
use crate::wire::{ByteReader, ARP_PACKET_LEN, BROADCAST_MAC, ZERO_MAC};

/// How an ARP request or reply is classified. Checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArpClass {
    /// Sender has no address yet and is asking who owns the target.
    Probe,
    /// Sender announces (or defends) its own address.
    Gratuitous,
    Normal,
}

fn classify(sha: [u8; 6], spa: Ipv4Addr, tha: [u8; 6], tpa: Ipv4Addr) -> ArpClass {
    if spa.is_unspecified() && tha == ZERO_MAC {
        return ArpClass::Probe;
    }
    if spa == tpa && (tha == BROADCAST_MAC || tha == ZERO_MAC || tha == sha) {
        return ArpClass::Gratuitous;
    }
    ArpClass::Normal
}

pub(crate) fn dissect(
    payload: &[u8],
    meta: &FrameMeta,
    out: &mut Vec<Observation>,
) -> Result<(), DecodeError> {
    // The address fields are only laid out as expected for Ethernet/IPv4,
    // so the fixed header is checked on its own before the full body.
    let mut header = ByteReader::new("arp", payload);
    let htype = ArpHardwareType::new(header.read_u16_be()?);
    let ptype = EtherType::new(header.read_u16_be()?);
    let hlen = header.read_u8()?;
    let plen = header.read_u8()?;

    if htype != ArpHardwareTypes::Ethernet || ptype != EtherTypes::Ipv4 || hlen != 6 || plen != 4
    {
        debug!(
            "Non Ethernet/IPv4 ARP from {} (hlen {}, plen {})",
            meta.src_mac, hlen, plen
        );
        out.push(meta.unknown());
        return Ok(());
    }

    let arp = ArpPacket::new(payload)
        .ok_or_else(|| truncated("arp", 0, ARP_PACKET_LEN, payload.len()))?;

    let operation = arp.get_operation();
    if operation != ArpOperations::Request && operation != ArpOperations::Reply {
        return Ok(());
    }

    let sha = arp.get_sender_hw_addr().octets();
    let spa = arp.get_sender_proto_addr();
    let tha = arp.get_target_hw_addr().octets();
    let tpa = arp.get_target_proto_addr();

    let sender = |kind| {
        Observation::new(MacAddr6::from(sha), spa, meta.timestamp, meta.vlan, kind)
    };

    match classify(sha, spa, tha, tpa) {
        ArpClass::Probe => out.push(sender(ObservationKind::ArpProbe)),
        ArpClass::Gratuitous => out.push(sender(ObservationKind::ArpGratuitous)),
        ArpClass::Normal => {
            out.push(sender(ObservationKind::ArpSource));
            if operation == ArpOperations::Reply {
                out.push(Observation::new(
                    MacAddr6::from(tha),
                    tpa,
                    meta.timestamp,
                    meta.vlan,
                    ObservationKind::ArpDestination,
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissector::testutil::*;
    use crate::domain::CaptureTimestamp;

    fn meta() -> FrameMeta {
        FrameMeta {
            src_mac: MacAddr6::from(MAC_A),
            vlan: Some(10),
            timestamp: CaptureTimestamp::new(100, 5),
        }
    }

    fn run(body: &[u8]) -> (Vec<Observation>, Result<(), DecodeError>) {
        let mut out = Vec::new();
        let result = dissect(body, &meta(), &mut out);
        (out, result)
    }

    #[test]
    fn test_classify_priority() {
        let zero = Ipv4Addr::UNSPECIFIED;
        // Probe wins even though sender and target IP are both zero.
        assert_eq!(classify(MAC_A, zero, ZERO_MAC, zero), ArpClass::Probe);
        assert_eq!(classify(MAC_A, IP_A, ZERO_MAC, IP_A), ArpClass::Gratuitous);
        assert_eq!(classify(MAC_A, IP_A, BROADCAST, IP_A), ArpClass::Gratuitous);
        assert_eq!(classify(MAC_A, IP_A, MAC_A, IP_A), ArpClass::Gratuitous);
        // Same IPs but a different, real target is an ordinary exchange.
        assert_eq!(classify(MAC_A, IP_A, MAC_B, IP_A), ArpClass::Normal);
        assert_eq!(classify(MAC_A, IP_A, ZERO_MAC, IP_B), ArpClass::Normal);
    }

    #[test]
    fn test_request_yields_sender_only() {
        let (out, result) = run(&arp_body(ARP_REQUEST, MAC_A, IP_A, ZERO_MAC, IP_B));
        assert!(result.is_ok());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ObservationKind::ArpSource);
        assert_eq!(out[0].hw_addr, MacAddr6::from(MAC_A));
        assert_eq!(out[0].ip_addr, IP_A);
        assert_eq!(out[0].vlan, Some(10));
        assert_eq!(out[0].timestamp, CaptureTimestamp::new(100, 5));
    }

    #[test]
    fn test_reply_yields_sender_and_target() {
        let (out, _) = run(&arp_body(ARP_REPLY, MAC_B, IP_B, MAC_A, IP_A));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, ObservationKind::ArpSource);
        assert_eq!((out[0].hw_addr, out[0].ip_addr), (MacAddr6::from(MAC_B), IP_B));
        assert_eq!(out[1].kind, ObservationKind::ArpDestination);
        assert_eq!((out[1].hw_addr, out[1].ip_addr), (MacAddr6::from(MAC_A), IP_A));
    }

    #[test]
    fn test_probe() {
        let (out, _) = run(&arp_body(
            ARP_REQUEST,
            MAC_A,
            Ipv4Addr::UNSPECIFIED,
            ZERO_MAC,
            IP_B,
        ));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ObservationKind::ArpProbe);
        assert_eq!(out[0].hw_addr, MacAddr6::from(MAC_A));
    }

    #[test]
    fn test_gratuitous_reply_yields_single_record() {
        let (out, _) = run(&arp_body(ARP_REPLY, MAC_A, IP_A, BROADCAST, IP_A));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ObservationKind::ArpGratuitous);
        assert_eq!(out[0].ip_addr, IP_A);
    }

    #[test]
    fn test_other_operation_yields_nothing() {
        // RARP request
        let (out, result) = run(&arp_body(3, MAC_A, IP_A, ZERO_MAC, IP_B));
        assert!(result.is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn test_wrong_hardware_length_yields_unknown() {
        let mut body = arp_body(ARP_REQUEST, MAC_B, IP_A, ZERO_MAC, IP_B);
        body[4] = 8;
        let (out, result) = run(&body);
        assert!(result.is_ok());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ObservationKind::Unknown);
        assert_eq!(out[0].hw_addr, MacAddr6::from(MAC_A));
        assert_eq!(out[0].ip_addr, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_wrong_protocol_yields_unknown() {
        let mut body = arp_body(ARP_REQUEST, MAC_A, IP_A, ZERO_MAC, IP_B);
        body[2..4].copy_from_slice(&0x86ddu16.to_be_bytes());
        let (out, _) = run(&body);
        assert_eq!(out[0].kind, ObservationKind::Unknown);

        let mut body = arp_body(ARP_REQUEST, MAC_A, IP_A, ZERO_MAC, IP_B);
        body[0..2].copy_from_slice(&6u16.to_be_bytes());
        let (out, _) = run(&body);
        assert_eq!(out[0].kind, ObservationKind::Unknown);
    }

    #[test]
    fn test_short_non_ethernet_body_yields_unknown() {
        // hlen 2, plen 4: a complete 20-byte body for its own address sizes.
        let mut body = vec![0, 6, 0x08, 0x00, 2, 4, 0, 1];
        body.extend_from_slice(&[0xab; 12]);
        let (out, result) = run(&body);
        assert!(result.is_ok());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ObservationKind::Unknown);
        assert_eq!(out[0].hw_addr, MacAddr6::from(MAC_A));
    }

    #[test]
    fn test_truncated_fixed_header() {
        let (out, result) = run(&[0, 1, 0x08, 0x00, 6]);
        assert!(out.is_empty());
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                layer: "arp",
                offset: 5,
                needed: 1,
                available: 0,
            })
        );
    }

    #[test]
    fn test_truncated_body() {
        let body = arp_body(ARP_REPLY, MAC_A, IP_A, MAC_B, IP_B);
        let (out, result) = run(&body[..20]);
        assert!(out.is_empty());
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                layer: "arp",
                offset: 0,
                needed: 28,
                available: 20,
            })
        );
    }
}
