//! Packet buffer views
//!
//! [`Bytes`] is the buffer handle passed across the driver boundary. It never
//! owns memory: a received packet aliases a slot of the receive ring and a
//! transmitted packet aliases caller memory. The view handed out by
//! [`Device::receive`](crate::Device::receive) keeps the device borrowed, so the
//! ring slot cannot be recycled while the view is alive. Use
//! [`Bytes::to_packet`] to keep the data past the next receive.

use core::fmt;
use core::ops::Deref;

use crate::queue::MAX_PACKET_LENGTH;

/// Owned copy of a packet, sized for the largest packet the radio accepts.
pub type Packet = heapless::Vec<u8, MAX_PACKET_LENGTH>;

/// Non-owning view of a packet buffer.
///
/// An empty view produced by a failed receive has no buffer at all, which is
/// distinguishable from a zero-length packet through [`Bytes::is_null`].
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Bytes<'a> {
    buffer: Option<&'a [u8]>,
}

impl<'a> Bytes<'a> {
    /// The null buffer with zero length.
    pub const fn empty() -> Self {
        Self { buffer: None }
    }

    /// Wraps an existing byte slice.
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer: Some(buffer),
        }
    }

    /// Returns true if this view has no backing buffer.
    pub fn is_null(&self) -> bool {
        self.buffer.is_none()
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if there are no valid bytes, whether or not a buffer is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The viewed bytes, or an empty slice for the null buffer.
    pub fn as_slice(&self) -> &'a [u8] {
        self.buffer.unwrap_or(&[])
    }

    /// Copies the viewed bytes into an owned packet.
    ///
    /// Bytes beyond [`MAX_PACKET_LENGTH`] are dropped.
    pub fn to_packet(&self) -> Packet {
        let bytes = self.as_slice();
        let len = bytes.len().min(MAX_PACKET_LENGTH);
        let mut packet = Packet::new();
        // cannot fail, the length is clamped to the capacity
        let _ = packet.extend_from_slice(&bytes[..len]);
        packet
    }
}

impl Deref for Bytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<'a> From<&'a [u8]> for Bytes<'a> {
    fn from(buffer: &'a [u8]) -> Self {
        Self::new(buffer)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Bytes<'a> {
    fn from(buffer: &'a [u8; N]) -> Self {
        Self::new(buffer.as_slice())
    }
}

impl fmt::Debug for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.buffer {
            Some(buffer) => f.debug_tuple("Bytes").field(&buffer).finish(),
            None => f.write_str("Bytes(null)"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Bytes<'_> {
    fn format(&self, f: defmt::Formatter) {
        match self.buffer {
            Some(buffer) => defmt::write!(f, "Bytes({=[u8]})", buffer),
            None => defmt::write!(f, "Bytes(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_null_and_zero_length() {
        let bytes = Bytes::empty();
        assert!(bytes.is_null());
        assert_eq!(bytes.len(), 0);
        assert_eq!(&*bytes, &[] as &[u8]);
    }

    #[test]
    fn zero_length_slice_is_not_null() {
        let bytes = Bytes::new(&[]);
        assert!(!bytes.is_null());
        assert!(bytes.is_empty());
    }

    #[test]
    fn to_packet_copies_view() {
        let data = [0xAA, 0xBB, 0xCC];
        let bytes = Bytes::from(&data);
        let packet = bytes.to_packet();
        assert_eq!(packet.as_slice(), &data);
    }

    #[test]
    fn to_packet_clamps_to_capacity() {
        let data = [0x55u8; MAX_PACKET_LENGTH + 10];
        let packet = Bytes::from(&data[..]).to_packet();
        assert_eq!(packet.len(), MAX_PACKET_LENGTH);
    }
}
