use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use crate::address::{Destination, multicast_group};

use super::{Transport, TransportError};

/// [`Transport`] over a standard UDP socket.
///
/// The socket is created on [`Transport::bind`] (or [`UdpTransport::ensure_bound`]
/// for send-only use); I/O on an unbound transport fails with `NotBound`.
#[derive(Debug, Default)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    read_timeout: Option<Duration>,
}

impl UdpTransport {
    pub fn open() -> Self {
        Self::default()
    }

    /// Bounds each `recv`; a timeout surfaces as an I/O error.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket()?.local_addr()?)
    }

    /// Binds an ephemeral port if nothing is bound yet.
    pub fn ensure_bound(&mut self) -> Result<(), TransportError> {
        if self.socket.is_none() {
            self.bind_addr(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))?;
        }
        Ok(())
    }

    fn bind_addr(&mut self, addr: SocketAddrV4) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyBound);
        }
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(self.read_timeout)?;
        log::debug!("udp: bound {}", socket.local_addr()?);
        self.socket = Some(socket);
        Ok(())
    }

    fn socket(&self) -> Result<&UdpSocket, TransportError> {
        self.socket.as_ref().ok_or(TransportError::NotBound)
    }
}

impl Transport for UdpTransport {
    fn bind(&mut self, port: u16) -> Result<(), TransportError> {
        self.bind_addr(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
    }

    fn join_multicast(&self, universe: u16, iface: Ipv4Addr) -> Result<(), TransportError> {
        let group = multicast_group(universe)?;
        self.socket()?.join_multicast_v4(&group, &iface)?;
        log::debug!("udp: joined {} on {}", group, iface);
        Ok(())
    }

    fn send(&self, bytes: &[u8], dest: &Destination) -> Result<usize, TransportError> {
        let sent = self.socket()?.send_to(bytes, dest.socket_addr())?;
        log::trace!("udp: sent {} bytes to {}", sent, dest);
        Ok(sent)
    }

    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        Ok(self.socket()?.recv_from(buf)?)
    }
}
