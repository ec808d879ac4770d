//! SQL upsert statement sink.
//!
//! Renders each observation as one MySQL `INSERT ... ON DUPLICATE KEY
//! UPDATE` statement against the `arpdata` table, whose unique key is
//! (hw_address, vlan, location). Statements are written one per line to
//! any `Write`, typically a file or a pipe into the `mysql` client.
//!
//! Repeated sightings of the same host OR their kind bits into `type`, so
//! the row accumulates every way the host has been seen.
//!
//! With a [`HostResolver`] attached, sightings that carry an address also
//! set `hostname`, or `(none)` when the lookup finds nothing.

use std::io::Write;

use tracing::{debug, error};

use crate::domain::Observation;
use crate::error::SinkError;
use crate::sink::{HostResolver, ObservationSink};

const NO_HOSTNAME: &str = "(none)";

pub struct SqlSink<W: Write> {
    out: W,
    location: String,
    label: String,
    resolver: Option<Box<dyn HostResolver>>,
}

impl<W: Write> SqlSink<W> {
    pub fn new(out: W, location: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            out,
            location: location.into(),
            label: label.into(),
            resolver: None,
        }
    }

    /// Look up a host name for every sighting with an address.
    pub fn with_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Build the upsert for one observation.
    pub fn statement(&self, observation: &Observation) -> String {
        let hw_address = quote(&observation.hw_addr.to_string());
        let location = quote(&self.location);
        let label = quote(&self.label);
        let last_seen = format!("FROM_UNIXTIME({})", observation.timestamp);
        let vlan = observation
            .vlan
            .map(|vlan| vlan.to_string())
            .unwrap_or_else(|| "NULL".to_string());
        let bits = observation.kind.bits();

        let mut columns = vec!["hw_address", "location", "label", "last_seen", "vlan", "type"];
        let mut values = vec![
            hw_address,
            location,
            label.clone(),
            last_seen.clone(),
            vlan.clone(),
            bits.to_string(),
        ];
        let mut updates = vec![
            format!("last_seen = {}", last_seen),
            format!("label = {}", label),
            format!("vlan = {}", vlan),
            format!("type = type | {}", bits),
        ];

        if !observation.ip_addr.is_unspecified() {
            let ip = quote(&observation.ip_addr.to_string());
            columns.push("ip_address");
            values.push(ip.clone());
            updates.push(format!("ip_address = {}", ip));

            if let Some(resolver) = &self.resolver {
                let hostname = resolver.resolve(observation.ip_addr);
                let hostname = quote(hostname.as_deref().unwrap_or(NO_HOSTNAME));
                columns.push("hostname");
                values.push(hostname.clone());
                updates.push(format!("hostname = {}", hostname));
            }
        }

        if let Some(hostname) = &observation.dhcp_hostname {
            let name = quote(hostname);
            columns.push("dhcp_name");
            values.push(name.clone());
            updates.push(format!("dhcp_name = {}", name));
        }

        if let Some(netbios) = &observation.netbios_name {
            let name = quote(netbios);
            columns.push("netbios_name");
            values.push(name.clone());
            updates.push(format!("netbios_name = {}", name));
        }

        if !observation.pv_names.is_empty() {
            let pvs = quote(&observation.pv_names.join(" "));
            columns.push("epics_pvs");
            values.push(pvs.clone());
            updates.push(format!("epics_pvs = {}", pvs));
        }

        format!(
            "INSERT INTO arpdata ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {};",
            columns.join(", "),
            values.join(", "),
            updates.join(", ")
        )
    }
}

impl<W: Write + Send> ObservationSink for SqlSink<W> {
    fn report(&mut self, observation: &Observation) -> Result<(), SinkError> {
        let sql = self.statement(observation);
        debug!("SQL: {}", sql);
        writeln!(self.out, "{}", sql)?;
        Ok(())
    }

    fn on_start(&mut self, interface: &str) {
        if let Err(e) = writeln!(self.out, "-- arpwatch on {} ({})", interface, self.location) {
            error!("Failed to write SQL header: {}", e);
        }
    }

    fn on_stop(&mut self) {
        if let Err(e) = self.out.flush() {
            error!("Failed to flush SQL output: {}", e);
        }
    }
}

/// Single-quote a string literal, escaping backslashes and quotes.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
