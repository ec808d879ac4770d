//! Observation sinks.
//!
//! A sink receives each observation drained from the buffer. The
//! `ObservationSink` trait keeps the drain worker independent of where
//! records end up (console, SQL statement stream, ...).

mod console_sink;
mod resolver;
mod sql_sink;

pub use console_sink::ConsoleSink;
pub use resolver::{HostResolver, ReverseDns};
pub use sql_sink::SqlSink;

use tracing::{debug, error};

use crate::buffer::ObservationBuffer;
use crate::domain::Observation;
use crate::error::SinkError;

/// Destination for drained observations.
pub trait ObservationSink: Send {
    /// Persist or print one observation.
    fn report(&mut self, observation: &Observation) -> Result<(), SinkError>;

    /// Called before the first observation.
    fn on_start(&mut self, interface: &str);

    /// Called after the last observation.
    fn on_stop(&mut self);
}

/// Feed every buffered observation to `sink` until the buffer is closed
/// and empty. Returns the number of records handled.
///
/// A failed report is logged and the record released anyway, so one bad
/// write cannot wedge the buffer.
pub fn drain(buffer: &ObservationBuffer, sink: &mut dyn ObservationSink) -> u64 {
    let mut handled = 0;
    while let Some(observation) = buffer.pop(true) {
        if let Err(e) = sink.report(&observation) {
            error!("Failed to report {} {}: {}", observation.kind, observation.hw_addr, e);
        }
        buffer.advance_tail();
        handled += 1;
    }
    debug!("Drained {} observations", handled);
    handled
}
