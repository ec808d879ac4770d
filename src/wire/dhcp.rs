//! DHCP fixed header layout (RFC 2131).
//!
//! ```text
//!  0      op | htype | hlen | hops
//!  4      xid
//!  8      secs | flags
//! 12      ciaddr
//! 16      yiaddr
//! 20      siaddr
//! 24      giaddr
//! 28      chaddr (16)
//! 44      sname (64)
//! 108     file (128)
//! 236     magic cookie
//! 240     options ...
//! ```

pub const CHADDR_OFFSET: usize = 28;
pub const COOKIE_OFFSET: usize = 236;

/// Fixed header plus magic cookie; options start here.
pub const OPTIONS_OFFSET: usize = 240;

pub const MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// Longest hostname we keep (the DNS name limit).
pub const HOSTNAME_MAX: usize = 253;

/// DHCP option codes
pub mod option_codes {
    pub const PAD: u8 = 0;
    pub const HOSTNAME: u8 = 12;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const END: u8 = 255;
}
