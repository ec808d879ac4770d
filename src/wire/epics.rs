//! EPICS Channel Access message header.
//!
//! Every CA message starts with a 16-byte big-endian header:
//!
//! ```text
//! 0   command       u16
//! 2   payload_size  u16
//! 4   data_type     u16   (search: reply flag)
//! 6   data_count    u16   (search: minor version)
//! 8   parameter1    u32   (search: client channel id)
//! 12  parameter2    u32   (search: client channel id)
//! ```
//!
//! A search request's payload is the NUL-padded PV name.

pub const HEADER_LEN: usize = 16;

pub const CMD_VERSION: u16 = 0;
pub const CMD_SEARCH: u16 = 6;

/// Longest PV name kept; longer names are truncated.
pub const PV_NAME_MAX: usize = 255;
