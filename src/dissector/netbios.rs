//! NetBIOS name service scanning.
//!
//! Windows hosts announce and look up their names with broadcast name
//! service packets, which makes them a cheap source of host names.

use tracing::debug;

use crate::domain::Observation;
use crate::error::DecodeError;
use crate::wire::netbios::{ENCODED_NAME_LEN, HEADER_LEN, NAME_LEN, SCOPE_SEPARATOR};
use crate::wire::ByteReader;

/// Top two bits of a label length mark a compression pointer.
const LABEL_POINTER: u8 = 0xc0;

/// Scan a name service packet (the UDP payload) into `record`.
///
/// An undecodable name leaves the record without a NetBIOS name.
pub(crate) fn scan(payload: &[u8], record: &mut Observation) -> Result<(), DecodeError> {
    let mut reader = ByteReader::new("netbios", payload);
    reader.skip(4)?; // transaction id, flags
    let questions = reader.read_u16_be()?;
    let answers = reader.read_u16_be()?;
    reader.skip(HEADER_LEN - 8)?;

    if questions == 0 && answers == 0 {
        return Ok(());
    }

    let len = reader.read_u8()?;
    if len & LABEL_POINTER != 0 {
        debug!("NetBIOS packet from {} starts with a pointer", record.hw_addr);
        return Ok(());
    }
    let encoded = reader.read_bytes(usize::from(len))?;

    match decode_name(encoded) {
        Some(name) if !name.is_empty() => record.netbios_name = Some(name),
        Some(_) => {}
        None => debug!("Undecodable NetBIOS name from {}", record.hw_addr),
    }
    Ok(())
}

/// Undo the first-level encoding. Decoding stops at a NUL or at the start
/// of a dotted scope id; the service suffix and space padding are dropped.
fn decode_name(encoded: &[u8]) -> Option<String> {
    let end = encoded
        .iter()
        .position(|&b| b == 0 || b == SCOPE_SEPARATOR)
        .unwrap_or(encoded.len())
        .min(ENCODED_NAME_LEN);
    let encoded = &encoded[..end];

    // Each byte takes two letters; a dangling half is not a name.
    if encoded.len() % 2 != 0 {
        return None;
    }

    let mut name = Vec::with_capacity(encoded.len() / 2);
    for pair in encoded.chunks_exact(2) {
        name.push((nibble(pair[0])? << 4) | nibble(pair[1])?);
    }
    name.truncate(NAME_LEN);

    let name = String::from_utf8_lossy(&name).into_owned();
    Some(name.trim_end_matches([' ', '\0']).to_string())
}

fn nibble(letter: u8) -> Option<u8> {
    matches!(letter, b'A'..=b'P').then(|| letter - b'A')
}
