//! Frame builders for dissector tests.

use std::net::Ipv4Addr;

use crate::wire::dhcp::{CHADDR_OFFSET, COOKIE_OFFSET, MAGIC_COOKIE, OPTIONS_OFFSET};
pub use crate::wire::ZERO_MAC;

pub const MAC_A: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const MAC_B: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];
pub const BROADCAST: [u8; 6] = [0xff; 6];

pub const IP_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const IP_B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_VLAN: u16 = 0x8100;

pub const ARP_REQUEST: u16 = 1;
pub const ARP_REPLY: u16 = 2;

pub fn ethernet(dst: [u8; 6], src: [u8; 6], ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    frame.extend_from_slice(&dst);
    frame.extend_from_slice(&src);
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn tagged(
    dst: [u8; 6],
    src: [u8; 6],
    vlan_id: u16,
    inner_ethertype: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut inner = Vec::with_capacity(4 + payload.len());
    inner.extend_from_slice(&(vlan_id & 0x0fff).to_be_bytes());
    inner.extend_from_slice(&inner_ethertype.to_be_bytes());
    inner.extend_from_slice(payload);
    ethernet(dst, src, ETHERTYPE_VLAN, &inner)
}

/// Ethernet/IPv4 ARP body.
pub fn arp_body(op: u16, sha: [u8; 6], spa: Ipv4Addr, tha: [u8; 6], tpa: Ipv4Addr) -> Vec<u8> {
    let mut body = Vec::with_capacity(28);
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    body.push(6);
    body.push(4);
    body.extend_from_slice(&op.to_be_bytes());
    body.extend_from_slice(&sha);
    body.extend_from_slice(&spa.octets());
    body.extend_from_slice(&tha);
    body.extend_from_slice(&tpa.octets());
    body
}

/// IPv4 header (no options) carrying a UDP datagram.
pub fn ipv4_udp(src: Ipv4Addr, dst: Ipv4Addr, sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
    let udp_len = 8 + payload.len();
    let total_len = 20 + udp_len;

    let mut packet = Vec::with_capacity(total_len);
    packet.push(0x45);
    packet.push(0);
    packet.extend_from_slice(&(total_len as u16).to_be_bytes());
    packet.extend_from_slice(&[0, 0, 0, 0]);
    packet.push(64);
    packet.push(17);
    packet.extend_from_slice(&[0, 0]);
    packet.extend_from_slice(&src.octets());
    packet.extend_from_slice(&dst.octets());

    packet.extend_from_slice(&sport.to_be_bytes());
    packet.extend_from_slice(&dport.to_be_bytes());
    packet.extend_from_slice(&(udp_len as u16).to_be_bytes());
    packet.extend_from_slice(&[0, 0]);
    packet.extend_from_slice(payload);
    packet
}

/// BOOTREQUEST fixed header, magic cookie, then the raw option bytes.
pub fn dhcp_payload(chaddr: [u8; 6], options: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8; OPTIONS_OFFSET];
    payload[0] = 1;
    payload[1] = 1;
    payload[2] = 6;
    payload[CHADDR_OFFSET..CHADDR_OFFSET + 6].copy_from_slice(&chaddr);
    payload[COOKIE_OFFSET..OPTIONS_OFFSET].copy_from_slice(&MAGIC_COOKIE);
    payload.extend_from_slice(options);
    payload
}

pub fn hostname_option(name: &[u8]) -> Vec<u8> {
    let mut option = vec![12, name.len() as u8];
    option.extend_from_slice(name);
    option
}

/// A CA message with a 16-byte header and the given payload.
pub fn ca_message(command: u16, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(16 + payload.len());
    message.extend_from_slice(&command.to_be_bytes());
    message.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    message.extend_from_slice(&[0u8; 12]);
    message.extend_from_slice(payload);
    message
}

/// A CA search request for `name`, NUL-padded to a multiple of 8.
pub fn ca_search(name: &str) -> Vec<u8> {
    let mut payload = name.as_bytes().to_vec();
    payload.push(0);
    while payload.len() % 8 != 0 {
        payload.push(0);
    }
    ca_message(6, &payload)
}

/// First-level encoding of a NetBIOS name: padded to 15 bytes with
/// spaces, then the service suffix, each byte as two letters.
pub fn netbios_encode(name: &str, suffix: u8) -> Vec<u8> {
    let mut raw = name.as_bytes().to_vec();
    raw.resize(15, b' ');
    raw.push(suffix);
    raw.iter()
        .flat_map(|b| [b'A' + (b >> 4), b'A' + (b & 0x0f)])
        .collect()
}

/// A name query with one question whose name label is `label`.
pub fn netbios_query(label: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x12, 0x34, 0x01, 0x10, 0, 1, 0, 0, 0, 0, 0, 0];
    packet.push(label.len() as u8);
    packet.extend_from_slice(label);
    packet.push(0);
    packet.extend_from_slice(&[0x00, 0x20, 0x00, 0x01]);
    packet
}
