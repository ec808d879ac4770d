//! DHCP option scanning.
//!
//! Only client-to-server messages are scanned. We care about two options:
//! the client's hostname and the message type.

use tracing::debug;

use crate::domain::{Observation, ObservationKind};
use crate::error::DecodeError;
use crate::wire::dhcp::{option_codes, COOKIE_OFFSET, HOSTNAME_MAX, MAGIC_COOKIE};
use crate::wire::ByteReader;

/// Scan a DHCP message (the UDP payload) into `record`.
///
/// The record is marked [`ObservationKind::DhcpMalformed`] up front and
/// only upgraded once a valid MESSAGE-TYPE option is seen, so an early
/// return leaves it as "DHCP of unknown subtype".
pub(crate) fn scan(payload: &[u8], record: &mut Observation) -> Result<(), DecodeError> {
    record.kind = ObservationKind::DhcpMalformed;

    let mut reader = ByteReader::new("dhcp", payload);
    reader.skip(COOKIE_OFFSET)?;
    let cookie = reader.read_bytes(MAGIC_COOKIE.len())?;
    if cookie != MAGIC_COOKIE {
        debug!("DHCP from {} without magic cookie", record.hw_addr);
        return Ok(());
    }

    while !reader.is_empty() {
        let code = reader.read_u8()?;
        match code {
            option_codes::PAD => continue,
            option_codes::END => break,
            _ => {}
        }

        let len = usize::from(reader.read_u8()?);
        let value = reader.read_bytes(len)?;

        match code {
            option_codes::HOSTNAME => {
                record.dhcp_hostname = Some(decode_hostname(value)?);
            }
            option_codes::MESSAGE_TYPE => apply_message_type(value, record),
            _ => {}
        }
    }

    Ok(())
}

fn decode_hostname(value: &[u8]) -> Result<String, DecodeError> {
    if value.len() > HOSTNAME_MAX {
        return Err(DecodeError::FieldTooLong {
            field: "dhcp hostname",
            length: value.len(),
            capacity: HOSTNAME_MAX,
        });
    }
    // Some clients include a terminating NUL in the option.
    let end = value.iter().position(|&b| b == 0).unwrap_or(value.len());
    Ok(String::from_utf8_lossy(&value[..end]).into_owned())
}

fn apply_message_type(value: &[u8], record: &mut Observation) {
    let [message_type] = value else {
        debug!(
            "DHCP message type option from {} has length {}",
            record.hw_addr,
            value.len()
        );
        return;
    };

    match ObservationKind::from_dhcp_message_type(*message_type) {
        Some(kind) => record.kind = kind,
        None => debug!(
            "DHCP message type {} from {} out of range",
            message_type, record.hw_addr
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissector::testutil::*;
    use crate::domain::CaptureTimestamp;
    use macaddr::MacAddr6;
    use std::net::Ipv4Addr;

    fn record() -> Observation {
        Observation::new(
            MacAddr6::from(MAC_A),
            Ipv4Addr::UNSPECIFIED,
            CaptureTimestamp::default(),
            None,
            ObservationKind::UdpGeneric,
        )
    }

    fn run(payload: &[u8]) -> (Observation, Result<(), DecodeError>) {
        let mut record = record();
        let result = scan(payload, &mut record);
        (record, result)
    }

    #[test]
    fn test_hostname_and_discover() {
        let mut options = hostname_option(b"node01");
        options.extend_from_slice(&[53, 1, 1, 255]);
        let (record, result) = run(&dhcp_payload(MAC_A, &options));

        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpDiscover);
        assert_eq!(record.dhcp_hostname.as_deref(), Some("node01"));
    }

    #[test]
    fn test_all_message_types() {
        let expected = [
            ObservationKind::DhcpDiscover,
            ObservationKind::DhcpOffer,
            ObservationKind::DhcpRequest,
            ObservationKind::DhcpDecline,
            ObservationKind::DhcpAck,
            ObservationKind::DhcpNack,
            ObservationKind::DhcpRelease,
        ];
        for (value, kind) in (1u8..=7).zip(expected) {
            let (record, _) = run(&dhcp_payload(MAC_A, &[53, 1, value, 255]));
            assert_eq!(record.kind, kind, "message type {value}");
        }
    }

    #[test]
    fn test_out_of_range_message_type() {
        // 8 (INFORM) is outside the tracked table.
        let (record, result) = run(&dhcp_payload(MAC_A, &[53, 1, 8, 255]));
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpMalformed);

        let (record, _) = run(&dhcp_payload(MAC_A, &[53, 1, 0, 255]));
        assert_eq!(record.kind, ObservationKind::DhcpMalformed);
    }

    #[test]
    fn test_message_type_wrong_length_ignored() {
        let (record, result) = run(&dhcp_payload(MAC_A, &[53, 2, 1, 1, 255]));
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpMalformed);
    }

    #[test]
    fn test_unknown_options_and_pad_are_skipped() {
        let options = [
            0, 0, // pad
            61, 7, 1, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // client id
            55, 3, 1, 3, 6, // parameter request list
            12, 4, b'b', b'o', b'x', b'1', // hostname
            53, 1, 3, // request
            255,
        ];
        let (record, result) = run(&dhcp_payload(MAC_A, &options));
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpRequest);
        assert_eq!(record.dhcp_hostname.as_deref(), Some("box1"));
    }

    #[test]
    fn test_end_stops_scan() {
        // Garbage after END would be truncated if read.
        let (record, result) = run(&dhcp_payload(MAC_A, &[53, 1, 5, 255, 12, 200]));
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpAck);
        assert!(record.dhcp_hostname.is_none());
    }

    #[test]
    fn test_missing_end_stops_at_payload_end() {
        let (record, result) = run(&dhcp_payload(MAC_A, &[53, 1, 7]));
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpRelease);
    }

    #[test]
    fn test_later_hostname_overwrites() {
        let mut options = hostname_option(b"first");
        options.extend(hostname_option(b"second"));
        options.push(255);
        let (record, _) = run(&dhcp_payload(MAC_A, &options));
        assert_eq!(record.dhcp_hostname.as_deref(), Some("second"));
    }

    #[test]
    fn test_hostname_trailing_nul_stripped() {
        let mut options = hostname_option(b"node02\0");
        options.push(255);
        let (record, _) = run(&dhcp_payload(MAC_A, &options));
        assert_eq!(record.dhcp_hostname.as_deref(), Some("node02"));
    }

    #[test]
    fn test_oversized_hostname_is_error() {
        let name = vec![b'a'; HOSTNAME_MAX + 1];
        let mut options = vec![53, 1, 1];
        options.extend(hostname_option(&name));
        options.push(255);
        let (record, result) = run(&dhcp_payload(MAC_A, &options));

        assert_eq!(
            result,
            Err(DecodeError::FieldTooLong {
                field: "dhcp hostname",
                length: HOSTNAME_MAX + 1,
                capacity: HOSTNAME_MAX,
            })
        );
        assert!(record.dhcp_hostname.is_none());
        // The message type decoded before the bad option is kept.
        assert_eq!(record.kind, ObservationKind::DhcpDiscover);
    }

    #[test]
    fn test_option_overrunning_payload() {
        let (record, result) = run(&dhcp_payload(MAC_A, &[53, 1, 1, 12, 10, b'a', b'b']));
        assert!(matches!(
            result,
            Err(DecodeError::Truncated {
                layer: "dhcp",
                offset: 245,
                needed: 10,
                available: 2,
            })
        ));
        assert_eq!(record.kind, ObservationKind::DhcpDiscover);
        assert!(record.dhcp_hostname.is_none());
    }

    #[test]
    fn test_short_fixed_header() {
        let (record, result) = run(&[0u8; 100]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
        assert_eq!(record.kind, ObservationKind::DhcpMalformed);
    }

    #[test]
    fn test_bad_cookie() {
        let mut payload = dhcp_payload(MAC_A, &[53, 1, 1, 255]);
        payload[COOKIE_OFFSET] = 0;
        let (record, result) = run(&payload);
        assert!(result.is_ok());
        assert_eq!(record.kind, ObservationKind::DhcpMalformed);
    }
}
