//! Wire layouts for the protocols the dissector understands.
//!
//! Ethernet, 802.1Q, ARP, IPv4 and UDP header views come from
//! `pnet::packet`; this module adds the constants they do not carry,
//! the DHCP, NetBIOS and EPICS Channel Access layouts, and a
//! bounds-checked reader for walking variable-length payloads.

pub mod dhcp;
pub mod epics;
pub mod netbios;
mod reader;

pub use reader::ByteReader;

/// Untagged Ethernet II header: dst(6) src(6) type(2).
pub const ETHERNET_HEADER_LEN: usize = 14;

/// 802.1Q tag following the outer ether-type: TCI(2) inner type(2).
pub const VLAN_TAG_LEN: usize = 4;

/// Mask for the VLAN id within the tag control field.
pub const VLAN_ID_MASK: u16 = 0x0fff;

/// Fixed ARP body for Ethernet/IPv4.
pub const ARP_PACKET_LEN: usize = 28;

/// Minimum IPv4 header (no options).
pub const IPV4_MIN_HEADER_LEN: usize = 20;

pub const UDP_HEADER_LEN: usize = 8;

/// DHCP client port (source of client messages).
pub const DHCP_CLIENT_PORT: u16 = 68;

/// DHCP server port.
pub const DHCP_SERVER_PORT: u16 = 67;

/// NetBIOS name service port.
pub const NETBIOS_NS_PORT: u16 = 137;

/// EPICS Channel Access search (server) port.
pub const EPICS_CA_PORT: u16 = 5064;

/// EPICS pvAccess broadcast search port.
pub const EPICS_PVA_PORT: u16 = 5076;

pub const BROADCAST_MAC: [u8; 6] = [0xff; 6];

/// Unset hardware address, as sent in ARP probes and requests.
pub const ZERO_MAC: [u8; 6] = [0; 6];
