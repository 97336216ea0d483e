mod udp;

pub use udp::UdpTransport;

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

use crate::address::Destination;
use crate::error::InvalidArgument;

/// Datagram I/O consumed by [`crate::Sender`] and [`crate::Receiver`].
///
/// Implementations own the socket; the codec never performs I/O itself.
/// Errors are forwarded to callers untouched.
pub trait Transport {
    fn bind(&mut self, port: u16) -> Result<(), TransportError>;

    /// Joins the multicast group of `universe` on `iface`.
    fn join_multicast(&self, universe: u16, iface: Ipv4Addr) -> Result<(), TransportError>;

    fn send(&self, bytes: &[u8], dest: &Destination) -> Result<usize, TransportError>;

    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("transport is not bound")]
    NotBound,
    #[error("transport is already bound")]
    AlreadyBound,
}
