//! IPv4 and UDP dispatch.

use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::udp::UdpPacket;
use tracing::debug;

use super::{dhcp, epics, netbios, truncated, FrameMeta};
use crate::domain::{Observation, ObservationKind};
use crate::error::DecodeError;
use crate::wire::{
    DHCP_CLIENT_PORT, DHCP_SERVER_PORT, EPICS_CA_PORT, EPICS_PVA_PORT, IPV4_MIN_HEADER_LEN,
    NETBIOS_NS_PORT, UDP_HEADER_LEN,
};

/// Every IPv4 frame produces one record for its source. The record starts
/// as a plain broadcast sighting and is refined by whatever the UDP layer
/// reveals. It is emitted even if a deeper layer turns out truncated.
pub(crate) fn dissect(
    payload: &[u8],
    meta: &FrameMeta,
    out: &mut Vec<Observation>,
) -> Result<(), DecodeError> {
    let ip = Ipv4Packet::new(payload)
        .ok_or_else(|| truncated("ipv4", 0, IPV4_MIN_HEADER_LEN, payload.len()))?;

    let mut record = Observation::new(
        meta.src_mac,
        ip.get_source(),
        meta.timestamp,
        meta.vlan,
        ObservationKind::IpBroadcast,
    );

    let result = if ip.get_next_level_protocol() == IpNextHeaderProtocols::Udp {
        datagram(payload, &ip).and_then(|udp| inspect_udp(udp, &mut record))
    } else {
        Ok(())
    };

    out.push(record);
    result
}

/// Locate the IPv4 payload, bounded by both the header's total length and
/// what was actually captured.
fn datagram<'a>(packet: &'a [u8], ip: &Ipv4Packet<'_>) -> Result<&'a [u8], DecodeError> {
    let header_len = usize::from(ip.get_header_length()) * 4;
    if header_len < IPV4_MIN_HEADER_LEN {
        debug!("Bogus IPv4 header length {} from {}", header_len, ip.get_source());
        return Ok(&[]);
    }
    if header_len > packet.len() {
        return Err(truncated("ipv4", 0, header_len, packet.len()));
    }
    let end = usize::from(ip.get_total_length()).clamp(header_len, packet.len());
    Ok(&packet[header_len..end])
}

fn inspect_udp(datagram: &[u8], record: &mut Observation) -> Result<(), DecodeError> {
    if datagram.is_empty() {
        return Ok(());
    }
    let udp = UdpPacket::new(datagram)
        .ok_or_else(|| truncated("udp", 0, UDP_HEADER_LEN, datagram.len()))?;
    record.kind = ObservationKind::UdpGeneric;

    let source = udp.get_source();
    let destination = udp.get_destination();
    let body = &datagram[UDP_HEADER_LEN..];

    if source == DHCP_CLIENT_PORT && destination == DHCP_SERVER_PORT {
        dhcp::scan(body, record)
    } else if destination == NETBIOS_NS_PORT {
        netbios::scan(body, record)
    } else if destination == EPICS_CA_PORT {
        record.kind = ObservationKind::EpicsCa;
        epics::scan(body, record)
    } else if destination == EPICS_PVA_PORT {
        record.kind = ObservationKind::EpicsPva;
        Ok(())
    } else {
        Ok(())
    }
}
