//! Observation records produced by the dissector.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use macaddr::MacAddr6;

/// Maximum number of EPICS PV names kept on a single observation.
pub const MAX_PV_NAMES: usize = 32;

/// Capture time of a frame, as reported by the packet source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CaptureTimestamp {
    pub secs: i64,
    pub micros: u32,
}

impl CaptureTimestamp {
    pub fn new(secs: i64, micros: u32) -> Self {
        Self { secs, micros }
    }

    /// Convert a wall-clock time. Times before the epoch clamp to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs() as i64,
                micros: d.subsec_micros(),
            },
            Err(_) => Self::default(),
        }
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// What a frame told us about the host that sent it.
///
/// The dissector always emits exactly one kind per record. Accumulating
/// several kinds for one host is left to the persistence layer, which can
/// OR together [`ObservationKind::bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationKind {
    Unknown,
    ArpSource,
    ArpDestination,
    ArpProbe,
    ArpGratuitous,
    UdpGeneric,
    DhcpDiscover,
    DhcpOffer,
    DhcpRequest,
    DhcpDecline,
    DhcpAck,
    DhcpNack,
    DhcpRelease,
    /// DHCP traffic whose subtype could not be determined.
    DhcpMalformed,
    IpBroadcast,
    EpicsCa,
    EpicsPva,
}

/// Bit shared by every DHCP kind.
pub const KIND_BIT_DHCP: u32 = 0x0020;

/// DHCP message types 1..=7, indexed by `value - 1`.
const DHCP_MESSAGE_KINDS: [ObservationKind; 7] = [
    ObservationKind::DhcpDiscover,
    ObservationKind::DhcpOffer,
    ObservationKind::DhcpRequest,
    ObservationKind::DhcpDecline,
    ObservationKind::DhcpAck,
    ObservationKind::DhcpNack,
    ObservationKind::DhcpRelease,
];

impl ObservationKind {
    /// Map a DHCP MESSAGE-TYPE option value to a kind.
    pub fn from_dhcp_message_type(value: u8) -> Option<Self> {
        let index = usize::from(value).checked_sub(1)?;
        DHCP_MESSAGE_KINDS.get(index).copied()
    }

    /// Bit pattern used when persisting kinds as an accumulating mask.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Unknown => 0x0000,
            Self::ArpSource => 0x0001,
            Self::ArpDestination => 0x0002,
            Self::ArpProbe => 0x0004,
            Self::ArpGratuitous => 0x0008,
            Self::UdpGeneric => 0x0010,
            Self::IpBroadcast => 0x0040,
            Self::EpicsCa => 0x0080,
            Self::EpicsPva => 0x0100,
            Self::DhcpDiscover => KIND_BIT_DHCP | 0x0200,
            Self::DhcpOffer => KIND_BIT_DHCP | 0x0400,
            Self::DhcpRequest => KIND_BIT_DHCP | 0x0800,
            Self::DhcpDecline => KIND_BIT_DHCP | 0x1000,
            Self::DhcpAck => KIND_BIT_DHCP | 0x2000,
            Self::DhcpNack => KIND_BIT_DHCP | 0x4000,
            Self::DhcpRelease => KIND_BIT_DHCP | 0x8000,
            Self::DhcpMalformed => KIND_BIT_DHCP | 0x1_0000,
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "UNKNOWN",
            Self::ArpSource => "ARP SRC",
            Self::ArpDestination => "ARP DST",
            Self::ArpProbe => "ARP PROBE",
            Self::ArpGratuitous => "ARP GRAT",
            Self::UdpGeneric => "UDP",
            Self::DhcpDiscover => "DHCP DISCOVER",
            Self::DhcpOffer => "DHCP OFFER",
            Self::DhcpRequest => "DHCP REQUEST",
            Self::DhcpDecline => "DHCP DECLINE",
            Self::DhcpAck => "DHCP ACK",
            Self::DhcpNack => "DHCP NACK",
            Self::DhcpRelease => "DHCP RELEASE",
            Self::DhcpMalformed => "DHCP ?",
            Self::IpBroadcast => "IP",
            Self::EpicsCa => "EPICS CA",
            Self::EpicsPva => "EPICS PVA",
        };
        f.write_str(label)
    }
}

/// A self-contained snapshot of one host sighting.
///
/// Everything is owned: the frame the record came from is gone as soon as
/// the dissector returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub hw_addr: MacAddr6,
    /// `0.0.0.0` when the frame carried no usable address.
    pub ip_addr: Ipv4Addr,
    pub timestamp: CaptureTimestamp,
    /// 12-bit VLAN id, `None` when untagged with no native VLAN configured.
    pub vlan: Option<u16>,
    pub kind: ObservationKind,
    pub dhcp_hostname: Option<String>,
    /// Name from a NetBIOS name service packet, suffix byte dropped.
    pub netbios_name: Option<String>,
    /// EPICS PV names from CA search requests, at most [`MAX_PV_NAMES`].
    pub pv_names: Vec<String>,
}

impl Observation {
    pub fn new(
        hw_addr: MacAddr6,
        ip_addr: Ipv4Addr,
        timestamp: CaptureTimestamp,
        vlan: Option<u16>,
        kind: ObservationKind,
    ) -> Self {
        Self {
            hw_addr,
            ip_addr,
            timestamp,
            vlan,
            kind,
            dhcp_hostname: None,
            netbios_name: None,
            pv_names: Vec::new(),
        }
    }

    /// A bare MAC sighting with no usable layer-3 information.
    pub fn unknown(hw_addr: MacAddr6, timestamp: CaptureTimestamp, vlan: Option<u16>) -> Self {
        Self::new(
            hw_addr,
            Ipv4Addr::UNSPECIFIED,
            timestamp,
            vlan,
            ObservationKind::Unknown,
        )
    }

    /// Append a PV name unless the list is already full.
    ///
    /// Returns `false` when the name was dropped.
    pub fn push_pv_name(&mut self, name: String) -> bool {
        if self.pv_names.len() >= MAX_PV_NAMES {
            return false;
        }
        self.pv_names.push(name);
        true
    }

    /// Whether two records describe the same sighting for duplicate
    /// suppression: same IP, same kind, same hardware address.
    pub fn same_sighting(&self, other: &Observation) -> bool {
        self.ip_addr == other.ip_addr && self.kind == other.kind && self.hw_addr == other.hw_addr
    }
}
