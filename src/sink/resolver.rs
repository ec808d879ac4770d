//! Host name lookup for persisted sightings.

use std::net::{IpAddr, Ipv4Addr};

use tracing::debug;

/// Maps an address to a host name.
pub trait HostResolver: Send {
    fn resolve(&self, ip: Ipv4Addr) -> Option<String>;
}

impl<F> HostResolver for F
where
    F: Fn(Ipv4Addr) -> Option<String> + Send,
{
    fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        self(ip)
    }
}

/// Reverse DNS through the system resolver.
///
/// Lookups block, so this belongs on the sink thread, never the capture
/// thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseDns;

impl HostResolver for ReverseDns {
    fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        match dns_lookup::lookup_addr(&IpAddr::V4(ip)) {
            // getnameinfo falls back to the numeric form when there is no
            // PTR record.
            Ok(name) if name != ip.to_string() => Some(name),
            Ok(_) => None,
            Err(e) => {
                debug!("Reverse lookup of {} failed: {}", ip, e);
                None
            }
        }
    }
}
