//! EPICS Channel Access search scanning.

use tracing::debug;

use crate::domain::Observation;
use crate::error::DecodeError;
use crate::wire::epics::{CMD_SEARCH, CMD_VERSION, HEADER_LEN, PV_NAME_MAX};
use crate::wire::ByteReader;

/// Walk a CA datagram collecting the PV names of search requests.
///
/// A datagram normally opens with a VERSION message followed by one or
/// more SEARCHes. Any other command means this is not a search stream and
/// the rest is left alone.
pub(crate) fn scan(payload: &[u8], record: &mut Observation) -> Result<(), DecodeError> {
    let mut reader = ByteReader::new("epics-ca", payload);

    while !reader.is_empty() {
        let header = reader.read_bytes(HEADER_LEN)?;
        let command = u16::from_be_bytes([header[0], header[1]]);
        let payload_size = usize::from(u16::from_be_bytes([header[2], header[3]]));

        match command {
            CMD_VERSION => reader.skip(payload_size)?,
            CMD_SEARCH => {
                let name = pv_name(reader.read_bytes(payload_size)?);
                if name.is_empty() {
                    continue;
                }
                if !record.push_pv_name(name) {
                    debug!("PV name list full for {}", record.hw_addr);
                }
            }
            _ => break,
        }
    }

    Ok(())
}

/// The name ends at the first NUL (the rest is padding).
fn pv_name(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(raw.len())
        .min(PV_NAME_MAX);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissector::testutil::*;
    use crate::domain::{CaptureTimestamp, ObservationKind, MAX_PV_NAMES};
    use macaddr::MacAddr6;

    fn run(payload: &[u8]) -> (Observation, Result<(), DecodeError>) {
        let mut record = Observation::new(
            MacAddr6::from(MAC_A),
            IP_A,
            CaptureTimestamp::default(),
            None,
            ObservationKind::EpicsCa,
        );
        let result = scan(payload, &mut record);
        (record, result)
    }

    #[test]
    fn test_version_then_searches() {
        let mut payload = ca_message(CMD_VERSION, &[]);
        payload.extend(ca_search("SR:C01-BI{BPM:1}Pos:X-I"));
        payload.extend(ca_search("SR:C01-BI{BPM:1}Pos:Y-I"));

        let (record, result) = run(&payload);
        assert!(result.is_ok());
        assert_eq!(
            record.pv_names,
            vec![
                "SR:C01-BI{BPM:1}Pos:X-I".to_string(),
                "SR:C01-BI{BPM:1}Pos:Y-I".to_string(),
            ]
        );
    }

    #[test]
    fn test_other_command_stops_scan() {
        let mut payload = ca_search("FIRST");
        // CA_PROTO_EVENT_ADD is not part of a search stream.
        payload.extend(ca_message(1, &[0u8; 16]));
        payload.extend(ca_search("NEVER"));

        let (record, result) = run(&payload);
        assert!(result.is_ok());
        assert_eq!(record.pv_names, vec!["FIRST".to_string()]);
    }

    #[test]
    fn test_long_name_truncated() {
        let long = "X".repeat(PV_NAME_MAX + 40);
        let (record, result) = run(&ca_search(&long));
        assert!(result.is_ok());
        assert_eq!(record.pv_names.len(), 1);
        assert_eq!(record.pv_names[0].len(), PV_NAME_MAX);
    }

    #[test]
    fn test_declared_payload_past_end() {
        let mut payload = ca_search("GOOD");
        let mut bad = ca_message(CMD_SEARCH, b"SHORT\0\0\0");
        bad[2..4].copy_from_slice(&64u16.to_be_bytes());
        payload.extend(bad);

        let (record, result) = run(&payload);
        assert!(matches!(
            result,
            Err(DecodeError::Truncated {
                layer: "epics-ca",
                needed: 64,
                available: 8,
                ..
            })
        ));
        assert_eq!(record.pv_names, vec!["GOOD".to_string()]);
    }

    #[test]
    fn test_partial_header() {
        let mut payload = ca_search("ONE");
        payload.extend_from_slice(&[0, 6, 0]);
        let (record, result) = run(&payload);
        assert!(matches!(
            result,
            Err(DecodeError::Truncated {
                needed: HEADER_LEN,
                available: 3,
                ..
            })
        ));
        assert_eq!(record.pv_names.len(), 1);
    }

    #[test]
    fn test_name_list_is_bounded() {
        let mut payload = Vec::new();
        for i in 0..MAX_PV_NAMES + 5 {
            payload.extend(ca_search(&format!("PV:{i}")));
        }
        let (record, result) = run(&payload);
        assert!(result.is_ok());
        assert_eq!(record.pv_names.len(), MAX_PV_NAMES);
        assert_eq!(record.pv_names.last().unwrap(), &format!("PV:{}", MAX_PV_NAMES - 1));
    }

    #[test]
    fn test_empty_payload() {
        let (record, result) = run(&[]);
        assert!(result.is_ok());
        assert!(record.pv_names.is_empty());
    }
}
