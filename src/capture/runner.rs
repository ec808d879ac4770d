//! Capture loop: source -> dissector -> buffer.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{Delivery, PacketSource};
use crate::buffer::{ObservationBuffer, PushOutcome};
use crate::dissector::Dissector;
use crate::error::{CaptureError, DecodeError};

const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(120);

/// Counters for one capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: u64,
    pub observations: u64,
    /// Frames whose decoding ran past the captured bytes.
    pub truncated: u64,
    /// Frames with a field too long for its record.
    pub malformed: u64,
    pub duplicates: u64,
    pub dropped: u64,
    pub evicted: u64,
}

impl CaptureSummary {
    fn record_push(&mut self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Stored => {}
            PushOutcome::Evicted => self.evicted += 1,
            PushOutcome::Dropped => self.dropped += 1,
            PushOutcome::Duplicate => self.duplicates += 1,
        }
    }
}

/// Drives a packet source until stopped or exhausted.
///
/// Never blocks on the buffer: a full buffer drops or overwrites, so a
/// slow sink cannot stall frame reception.
pub struct CaptureLoop<S> {
    source: S,
    dissector: Dissector,
    buffer: Arc<ObservationBuffer>,
    stats_interval: Duration,
}

impl<S: PacketSource> CaptureLoop<S> {
    pub fn new(source: S, dissector: Dissector, buffer: Arc<ObservationBuffer>) -> Self {
        Self {
            source,
            dissector,
            buffer,
            stats_interval: DEFAULT_STATS_INTERVAL,
        }
    }

    /// How often buffer statistics are logged. Zero disables them.
    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Run on the current thread until `running` clears or the source
    /// closes. A source error ends the session.
    pub fn run(&mut self, running: &AtomicBool) -> Result<CaptureSummary, CaptureError> {
        info!("Capturing on {}", self.source.interface_name());

        let mut summary = CaptureSummary::default();
        let mut last_stats = Instant::now();

        while running.load(Ordering::SeqCst) {
            match self.source.next_frame()? {
                Delivery::Frame(frame) => {
                    summary.frames += 1;
                    let dissection = self.dissector.dissect(frame.data, frame.timestamp);
                    match &dissection.error {
                        Some(err @ DecodeError::Truncated { .. }) => {
                            summary.truncated += 1;
                            debug!("Frame decode stopped: {}", err);
                        }
                        Some(err @ DecodeError::FieldTooLong { .. }) => {
                            summary.malformed += 1;
                            warn!("Frame decode stopped: {}", err);
                        }
                        None => {}
                    }
                    for record in dissection.observations {
                        summary.observations += 1;
                        summary.record_push(self.buffer.push(record, true));
                    }
                }
                Delivery::Idle => {}
                Delivery::Closed => {
                    info!("Source {} closed", self.source.interface_name());
                    break;
                }
            }

            if !self.stats_interval.is_zero() && last_stats.elapsed() >= self.stats_interval {
                log_buffer_stats(&self.buffer);
                last_stats = Instant::now();
            }
        }

        info!(
            "Capture on {} finished: {} frames, {} observations",
            self.source.interface_name(),
            summary.frames,
            summary.observations
        );
        Ok(summary)
    }
}

impl<S: PacketSource + 'static> CaptureLoop<S> {
    /// Run the loop on its own thread.
    pub fn spawn(mut self) -> io::Result<CaptureHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = thread::Builder::new()
            .name(format!("capture-{}", self.source.interface_name()))
            .spawn(move || self.run(&flag))?;

        Ok(CaptureHandle { running, thread })
    }
}

fn log_buffer_stats(buffer: &ObservationBuffer) {
    let stats = buffer.stats();
    info!(
        "Buffer: {}/{} pending ({:.1}% full)",
        stats.pending, stats.capacity, stats.percent_full
    );
    if stats.full {
        let action = if buffer.is_ring() {
            "evicting oldest"
        } else {
            "dropping new"
        };
        warn!("Buffer full, {} sightings", action);
    }
    if stats.overruns > 0 {
        warn!("Buffer overruns so far: {}", stats.overruns);
    }
}

/// Stops a running capture loop. Cheap to clone into a signal handler.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// The loop notices within one read timeout.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

/// A capture loop running on its own thread.
pub struct CaptureHandle {
    running: Arc<AtomicBool>,
    thread: JoinHandle<Result<CaptureSummary, CaptureError>>,
}

impl CaptureHandle {
    pub fn stopper(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    /// Wait for the loop to finish.
    pub fn join(self) -> Result<CaptureSummary, CaptureError> {
        self.thread.join().map_err(|_| CaptureError::WorkerPanicked)?
    }
}
