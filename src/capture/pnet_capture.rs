//! pnet-based live capture.

use std::io::ErrorKind;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};
use tracing::debug;

use super::{CaptureFilter, Delivery, Frame, PacketSource};
use crate::domain::CaptureTimestamp;
use crate::error::CaptureError;

/// Settings for opening a live capture.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub read_timeout: Duration,
    pub promiscuous: bool,
    pub filter: CaptureFilter,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            promiscuous: true,
            filter: CaptureFilter::default(),
        }
    }
}

/// Packet capture using the pnet datalink layer.
///
/// pnet does not hand out kernel timestamps, so frames are stamped with
/// the time they were received from the channel.
pub struct PnetCapture {
    interface: NetworkInterface,
    rx: Box<dyn DataLinkReceiver>,
    filter: CaptureFilter,
}

impl PnetCapture {
    /// Open a receive channel on the named interface.
    pub fn open(interface_name: &str, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        let config = Config {
            read_timeout: Some(options.read_timeout),
            promiscuous: options.promiscuous,
            ..Config::default()
        };

        let rx = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => {
                let msg = e.to_string();
                if e.kind() == ErrorKind::PermissionDenied
                    || msg.contains("permission")
                    || msg.contains("Operation not permitted")
                {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(msg));
            }
        };

        debug!(
            "Opened capture on {} (filter {:?}, timeout {:?})",
            interface.name, options.filter, options.read_timeout
        );

        Ok(Self {
            interface,
            rx,
            filter: options.filter,
        })
    }

    /// Name of the first interface that is up, not loopback, and has an
    /// address.
    pub fn default_interface() -> Option<String> {
        datalink::interfaces()
            .into_iter()
            .find(|iface| iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty())
            .map(|iface| iface.name)
    }

    /// List all available network interfaces.
    pub fn list_interfaces() -> Vec<String> {
        datalink::interfaces()
            .into_iter()
            .map(|iface| {
                let status = if iface.is_up() { "UP" } else { "DOWN" };
                let ips: Vec<_> = iface.ips.iter().map(|ip| ip.to_string()).collect();
                format!(
                    "{}: {} [{}]",
                    iface.name,
                    status,
                    if ips.is_empty() {
                        "no IP".to_string()
                    } else {
                        ips.join(", ")
                    }
                )
            })
            .collect()
    }
}

impl PacketSource for PnetCapture {
    fn next_frame(&mut self) -> Result<Delivery<'_>, CaptureError> {
        match self.rx.next() {
            Ok(data) => {
                if !self.filter.matches(data) {
                    return Ok(Delivery::Idle);
                }
                Ok(Delivery::Frame(Frame {
                    timestamp: CaptureTimestamp::now(),
                    data,
                }))
            }
            Err(e) if is_transient(e.kind()) => Ok(Delivery::Idle),
            Err(e) => Err(CaptureError::Receive(e)),
        }
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }
}

/// Read timeouts and signal interruptions are part of normal operation.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}
