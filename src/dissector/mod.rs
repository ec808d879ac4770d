//! Frame dissection.
//!
//! Turns one captured link-layer frame into zero, one or two
//! [`Observation`]s. Decoding is a single forward pass; every read is
//! bounds-checked against the captured bytes, and malformed protocol data
//! degrades to a less specific classification instead of failing.

mod arp;
mod dhcp;
mod epics;
mod ip;
mod netbios;
#[cfg(test)]
pub(crate) mod testutil;

use macaddr::MacAddr6;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::vlan::VlanPacket;
use tracing::debug;

use crate::domain::{CaptureTimestamp, Observation};
use crate::error::DecodeError;
use crate::wire::{ETHERNET_HEADER_LEN, VLAN_ID_MASK, VLAN_TAG_LEN};

/// Per-interface VLAN policy applied while dissecting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VlanContext {
    /// VLAN assigned to untagged frames.
    pub native_vlan: Option<u16>,
    /// Drop 802.1Q-tagged frames entirely.
    pub ignore_tagged: bool,
}

/// Result of dissecting a single frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dissection {
    /// Records decoded before any error.
    pub observations: Vec<Observation>,
    /// Set when decoding stopped because a read would pass the end of
    /// the captured frame (or a field overflowed its capacity).
    pub error: Option<DecodeError>,
}

/// Layer-2 facts shared by every record decoded from one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameMeta {
    pub src_mac: MacAddr6,
    pub vlan: Option<u16>,
    pub timestamp: CaptureTimestamp,
}

impl FrameMeta {
    pub(crate) fn unknown(&self) -> Observation {
        Observation::unknown(self.src_mac, self.timestamp, self.vlan)
    }
}

pub(crate) fn truncated(
    layer: &'static str,
    offset: usize,
    needed: usize,
    available: usize,
) -> DecodeError {
    DecodeError::Truncated {
        layer,
        offset,
        needed,
        available,
    }
}

/// Classifies raw Ethernet frames.
///
/// Holds no per-frame state, so the same frame always produces the same
/// records.
#[derive(Debug, Clone, Default)]
pub struct Dissector {
    context: VlanContext,
}

impl Dissector {
    pub fn new(context: VlanContext) -> Self {
        Self { context }
    }

    /// Set the VLAN reported for untagged frames.
    pub fn with_native_vlan(mut self, vlan: Option<u16>) -> Self {
        self.context.native_vlan = vlan;
        self
    }

    /// Configure whether tagged frames are ignored.
    pub fn with_ignore_tagged(mut self, ignore: bool) -> Self {
        self.context.ignore_tagged = ignore;
        self
    }

    /// Classify a frame, discarding any decode error.
    pub fn classify(&self, frame: &[u8], timestamp: CaptureTimestamp) -> Vec<Observation> {
        let dissection = self.dissect(frame, timestamp);
        if let Some(err) = &dissection.error {
            debug!("Frame decode stopped: {}", err);
        }
        dissection.observations
    }

    /// Classify a frame, keeping the decode error (if any) alongside
    /// whatever was decoded before it.
    pub fn dissect(&self, frame: &[u8], timestamp: CaptureTimestamp) -> Dissection {
        let mut observations = Vec::new();
        let error = self.dissect_into(frame, timestamp, &mut observations).err();
        Dissection {
            observations,
            error,
        }
    }

    fn dissect_into(
        &self,
        frame: &[u8],
        timestamp: CaptureTimestamp,
        out: &mut Vec<Observation>,
    ) -> Result<(), DecodeError> {
        let ethernet = EthernetPacket::new(frame)
            .ok_or_else(|| truncated("ethernet", 0, ETHERNET_HEADER_LEN, frame.len()))?;

        let src_mac = MacAddr6::from(ethernet.get_source().octets());
        let mut ethertype = ethernet.get_ethertype();
        let mut offset = ETHERNET_HEADER_LEN;
        let mut vlan = self.context.native_vlan;

        if ethertype == EtherTypes::Vlan {
            if self.context.ignore_tagged {
                return Ok(());
            }
            let tag = VlanPacket::new(&frame[offset..]).ok_or_else(|| {
                truncated("802.1q", offset, VLAN_TAG_LEN, frame.len() - offset)
            })?;
            vlan = Some(tag.get_vlan_identifier() & VLAN_ID_MASK);
            ethertype = tag.get_ethertype();
            offset += VLAN_TAG_LEN;
        }

        let meta = FrameMeta {
            src_mac,
            vlan,
            timestamp,
        };
        let payload = &frame[offset..];

        match ethertype {
            EtherTypes::Arp => arp::dissect(payload, &meta, out),
            EtherTypes::Ipv4 => ip::dissect(payload, &meta, out),
            _ => {
                out.push(meta.unknown());
                Ok(())
            }
        }
    }
}
