//! Domain models for passive host discovery.
//!
//! These types are independent of how frames are captured or where
//! observations end up.

mod observation;

pub use observation::{
    CaptureTimestamp, Observation, ObservationKind, KIND_BIT_DHCP, MAX_PV_NAMES,
};
