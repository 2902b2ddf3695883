//! VS2 protocol implementation
//!
//! This module defines the telegram framing, the request/response payloads,
//! the handshake state machine and the locked session built on top of them.

pub mod codec;
pub mod message;
pub mod session;
pub mod state;

pub use self::codec::TelegramCodec;
pub use self::message::{Request, Response, Service, Status};
pub use self::session::{Outcome, RegisterAccess, Session};
pub use self::state::{Link, LinkFault, LinkState, ProtocolConfig};

// Link control bytes, never wrapped in a telegram
/// End of transmission, resets the controller's link
pub const EOT: u8 = 0x04;
/// Enquiry, sent by an idle controller
pub const ENQ: u8 = 0x05;
/// Acknowledge
pub const ACK: u8 = 0x06;
/// Negative acknowledge
pub const NAK: u8 = 0x15;

/// First byte of every data telegram
pub const TELEGRAM_START: u8 = 0x41;

/// Switches an idle controller into VS2 mode
pub const VS2_INIT: [u8; 3] = [0x16, 0x00, 0x00];
