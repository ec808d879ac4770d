//! NetBIOS name service layout (RFC 1002).
//!
//! ```text
//!  0      trans id | flags
//!  4      qdcount | ancount
//!  8      nscount | arcount
//! 12      name length | encoded name ... | scope labels ... | 0
//! ```
//!
//! The first name in the packet is the question name for queries and
//! registrations, and the answer owner name for responses.

/// Fixed header preceding the first name.
pub const HEADER_LEN: usize = 12;

/// Each name byte is sent as two letters, `'A' + high nibble` then
/// `'A' + low nibble`.
pub const ENCODED_NAME_LEN: usize = 32;

/// Decoded name bytes before the one-byte service suffix.
pub const NAME_LEN: usize = 15;

/// Separator between the encoded name and a dotted scope id.
pub const SCOPE_SEPARATOR: u8 = b'.';
