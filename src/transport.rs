//! Transport definition for a PakBus peer.
//!
//! PakBus only asks its transport for a full-duplex byte stream with a
//! settable read timeout (spec §6); framing, quoting, and signatures are
//! layered on top by [`crate::framer`].

use super::error::Error;

/// An abstract byte-stream connection used by the client to exchange raw
/// (unframed) bytes with a peer.
///
/// ## How can I implement `Transport`?
///
/// Implementors only need to move bytes; all PakBus semantics (framing,
/// quoting, signatures, transaction correlation) live above this trait.
pub trait Transport {
    /// Write `bytes` to the peer.
    fn send(&mut self, bytes: &[u8]) -> Result<(), Error>;
    /// Read and return exactly one byte from the peer.
    fn read_byte(&mut self) -> Result<u8, Error>;
    /// Set the read timeout, in seconds.
    fn set_timeout(&mut self, secs: f64) -> Result<(), Error>;
    /// Close the connection.
    fn close(&mut self) -> Result<(), Error>;
}
