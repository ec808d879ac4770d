//! Passive network watcher.
//!
//! Captures link-layer frames, classifies them into host sightings
//! (ARP, DHCP, NetBIOS, EPICS Channel Access, IP broadcast) and queues them in a
//! bounded buffer for a persistence sink.

pub mod buffer;
pub mod capture;
pub mod config;
pub mod dissector;
pub mod domain;
pub mod error;
pub mod sink;
pub mod wire;

pub use buffer::{BufferStats, ObservationBuffer, PushOutcome};
pub use capture::{CaptureLoop, PacketSource, PnetCapture, ReplaySource};
pub use config::Config;
pub use dissector::{Dissection, Dissector, VlanContext};
pub use domain::{CaptureTimestamp, Observation, ObservationKind};
pub use sink::{drain, ConsoleSink, HostResolver, ObservationSink, ReverseDns, SqlSink};
