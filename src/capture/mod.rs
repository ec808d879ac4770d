//! Packet capture.
//!
//! This module defines the `PacketSource` trait, a pnet-based live
//! implementation, an in-memory replay source, and the loop that feeds
//! captured frames through the dissector into an observation buffer.

mod filter;
mod pnet_capture;
mod replay;
mod runner;

pub use filter::CaptureFilter;
pub use pnet_capture::{CaptureOptions, PnetCapture};
pub use replay::ReplaySource;
pub use runner::{CaptureHandle, CaptureLoop, CaptureSummary, StopHandle};

use crate::domain::CaptureTimestamp;
use crate::error::CaptureError;

/// A captured frame, borrowed from the source's receive buffer.
///
/// The borrow ends before the next frame is requested, so anything kept
/// from it must be copied out.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub timestamp: CaptureTimestamp,
    pub data: &'a [u8],
}

/// Result of asking a source for the next frame.
#[derive(Debug)]
pub enum Delivery<'a> {
    Frame(Frame<'a>),
    /// Nothing to hand out right now (read timeout or filtered frame).
    /// Gives the caller a chance to check for shutdown.
    Idle,
    /// The source has no more frames.
    Closed,
}

/// Anything that can deliver link-layer frames.
///
/// Allows the capture loop to run against a live interface or a
/// prepared list of frames in tests.
pub trait PacketSource: Send {
    /// Wait (at most the source's read timeout) for the next frame.
    fn next_frame(&mut self) -> Result<Delivery<'_>, CaptureError>;

    /// Name of the interface (or replay label) frames come from.
    fn interface_name(&self) -> &str;
}
