//! In-memory packet source.

use super::{CaptureFilter, Delivery, Frame, PacketSource};
use crate::domain::CaptureTimestamp;
use crate::error::CaptureError;

/// Replays a prepared list of frames, then reports `Closed`.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    name: String,
    frames: Vec<(CaptureTimestamp, Vec<u8>)>,
    next: usize,
    filter: CaptureFilter,
}

impl ReplaySource {
    pub fn new(name: impl Into<String>, frames: Vec<(CaptureTimestamp, Vec<u8>)>) -> Self {
        Self {
            name: name.into(),
            frames,
            next: 0,
            filter: CaptureFilter::All,
        }
    }

    /// Apply a capture filter; rejected frames are delivered as `Idle`.
    pub fn with_filter(mut self, filter: CaptureFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl PacketSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Delivery<'_>, CaptureError> {
        let Some((timestamp, data)) = self.frames.get(self.next) else {
            return Ok(Delivery::Closed);
        };
        self.next += 1;

        if !self.filter.matches(data) {
            return Ok(Delivery::Idle);
        }
        Ok(Delivery::Frame(Frame {
            timestamp: *timestamp,
            data,
        }))
    }

    fn interface_name(&self) -> &str {
        &self.name
    }
}
