//! Software frame filter applied before dissection.

use std::str::FromStr;

use crate::wire::{BROADCAST_MAC, ETHERNET_HEADER_LEN};

const ETHERTYPE_ARP: [u8; 2] = [0x08, 0x06];
const ETHERTYPE_VLAN: [u8; 2] = [0x81, 0x00];

/// Which frames the capture hands to the dissector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureFilter {
    /// Link-layer broadcasts plus ARP (tagged or not).
    #[default]
    BroadcastOrArp,
    All,
}

impl CaptureFilter {
    pub fn matches(&self, frame: &[u8]) -> bool {
        match self {
            Self::All => true,
            Self::BroadcastOrArp => is_broadcast(frame) || is_arp(frame),
        }
    }
}

impl FromStr for CaptureFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast-or-arp" => Ok(Self::BroadcastOrArp),
            "all" => Ok(Self::All),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

fn is_broadcast(frame: &[u8]) -> bool {
    frame.get(..6) == Some(&BROADCAST_MAC[..])
}

fn is_arp(frame: &[u8]) -> bool {
    let outer = frame.get(12..ETHERNET_HEADER_LEN);
    if outer == Some(&ETHERTYPE_ARP[..]) {
        return true;
    }
    outer == Some(&ETHERTYPE_VLAN[..]) && frame.get(16..18) == Some(&ETHERTYPE_ARP[..])
}
