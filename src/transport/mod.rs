//! Byte transports underneath the protocol session
//!
//! The session only needs bounded-time reads, unbuffered writes and a way to
//! drop stale input. A read that times out returns fewer bytes than asked
//! for, possibly none, rather than an error.

mod serial;

#[cfg(test)]
pub(crate) mod mock;

pub use self::serial::SerialTransport;

use std::io;

/// Duplex byte channel owned by a [`crate::protocol::Session`]
pub trait Transport: Send {
    /// Writes all bytes to the line
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads up to `max_len` bytes, returning early on timeout
    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>>;

    /// Discards anything received but not yet read
    fn reset_input_buffer(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read(max_len)
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        (**self).reset_input_buffer()
    }
}
