//! Console-based observation sink.

use std::io::{self, Write};

use crate::domain::Observation;
use crate::error::SinkError;
use crate::sink::ObservationSink;

/// Prints one line per observation to stdout.
pub struct ConsoleSink {
    /// Whether to show the capture timestamp
    verbose: bool,
}

impl ConsoleSink {
    /// Create a new console sink.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_observation(&self, observation: &Observation) -> String {
        let vlan = observation
            .vlan
            .map(|vlan| vlan.to_string())
            .unwrap_or_else(|| "none".to_string());

        let mut output = format!(
            "[{}] MAC: {} | IP: {} | VLAN: {}",
            observation.kind, observation.hw_addr, observation.ip_addr, vlan
        );

        if let Some(hostname) = &observation.dhcp_hostname {
            output.push_str(&format!(" | Host: {}", hostname));
        }

        if let Some(name) = &observation.netbios_name {
            output.push_str(&format!(" | NetBIOS: {}", name));
        }

        if !observation.pv_names.is_empty() {
            output.push_str(&format!(" | PVs: {}", observation.pv_names.join(", ")));
        }

        if self.verbose {
            output.push_str(&format!(" | Seen: {}", observation.timestamp));
        }

        output
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationSink for ConsoleSink {
    fn report(&mut self, observation: &Observation) -> Result<(), SinkError> {
        let output = self.format_observation(observation);
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", output)?;
        Ok(())
    }

    fn on_start(&mut self, interface: &str) {
        println!("Watching interface: {}", interface);
        println!("Press Ctrl+C to stop.\n");
    }

    fn on_stop(&mut self) {
        println!("\nStopping watcher.");
    }
}
