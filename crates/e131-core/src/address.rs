//! Destination addressing for outbound packets.
//!
//! Unicast destinations resolve a host name (the only operation in this
//! crate that may consult DNS); multicast destinations are derived from the
//! universe number as `239.255.<hi>.<lo>`.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

use thiserror::Error;

use crate::error::InvalidArgument;
use crate::packet::builder::check_universe;

/// Default E1.31 UDP port.
pub const DEFAULT_PORT: u16 = 5568;

/// Base of the E1.31 multicast range (`239.255.0.0/16`).
pub const MULTICAST_BASE: u32 = 0xEFFF_0000;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("no IPv4 address found for host '{host}'")]
    AddressNotFound { host: String },
}

/// Resolved send destination; immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Unicast(SocketAddrV4),
    Multicast { universe: u16, addr: SocketAddrV4 },
}

impl Destination {
    /// Resolves `host` (literal IPv4 address or name) to a unicast target.
    ///
    /// # Examples
    /// ```
    /// use e131_core::Destination;
    ///
    /// let dest = Destination::unicast("127.0.0.1", 5568)?;
    /// assert_eq!(dest.to_string(), "127.0.0.1:5568");
    /// # Ok::<(), e131_core::ResolutionError>(())
    /// ```
    pub fn unicast(host: &str, port: u16) -> Result<Self, ResolutionError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(InvalidArgument::EmptyHost.into());
        }
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(Self::Unicast(SocketAddrV4::new(ip, port)));
        }
        let resolved = (host, port).to_socket_addrs().ok().and_then(first_ipv4);
        match resolved {
            Some(addr) => {
                log::debug!("addr: resolved {} -> {}", host, addr);
                Ok(Self::Unicast(addr))
            }
            None => Err(ResolutionError::AddressNotFound {
                host: host.to_string(),
            }),
        }
    }

    /// Multicast group for `universe`.
    ///
    /// # Examples
    /// ```
    /// use e131_core::Destination;
    ///
    /// let dest = Destination::multicast(300, 5568)?;
    /// assert_eq!(dest.to_string(), "239.255.1.44:5568");
    /// # Ok::<(), e131_core::InvalidArgument>(())
    /// ```
    pub fn multicast(universe: u16, port: u16) -> Result<Self, InvalidArgument> {
        let group = multicast_group(universe)?;
        Ok(Self::Multicast {
            universe,
            addr: SocketAddrV4::new(group, port),
        })
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        match self {
            Destination::Unicast(addr) => *addr,
            Destination::Multicast { addr, .. } => *addr,
        }
    }

    pub fn is_multicast(&self) -> bool {
        matches!(self, Destination::Multicast { .. })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// `239.255.<hi>.<lo>` group carrying `universe`.
pub fn multicast_group(universe: u16) -> Result<Ipv4Addr, InvalidArgument> {
    let universe = check_universe(universe)?;
    Ok(Ipv4Addr::from(MULTICAST_BASE | universe as u32))
}

fn first_ipv4(addrs: impl Iterator<Item = SocketAddr>) -> Option<SocketAddrV4> {
    addrs.into_iter().find_map(|addr| match addr {
        SocketAddr::V4(v4) => Some(v4),
        SocketAddr::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    use super::*;

    #[test]
    fn multicast_maps_universe_into_low_bytes() {
        let dest = Destination::multicast(1, DEFAULT_PORT).unwrap();
        assert_eq!(
            dest.socket_addr(),
            SocketAddrV4::new(Ipv4Addr::new(239, 255, 0, 1), 5568)
        );
        assert!(dest.is_multicast());
        assert_eq!(
            multicast_group(63999).unwrap(),
            Ipv4Addr::new(239, 255, 249, 255)
        );
    }

    #[test]
    fn multicast_rejects_out_of_range_universe() {
        assert_eq!(
            Destination::multicast(0, DEFAULT_PORT),
            Err(InvalidArgument::Universe(0))
        );
        assert_eq!(
            Destination::multicast(64000, DEFAULT_PORT),
            Err(InvalidArgument::Universe(64000))
        );
    }

    #[test]
    fn unicast_accepts_literal_address() {
        let dest = Destination::unicast("10.1.2.3", 6000).unwrap();
        assert_eq!(dest, Destination::Unicast("10.1.2.3:6000".parse().unwrap()));
        assert!(!dest.is_multicast());
    }

    #[test]
    fn unicast_rejects_empty_host() {
        let err = Destination::unicast("  ", DEFAULT_PORT).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::InvalidArgument(InvalidArgument::EmptyHost)
        ));
    }

    #[test]
    fn resolution_skips_ipv6_results() {
        let v6: SocketAddr = "[::1]:5568".parse().unwrap();
        let v4: SocketAddr = "127.0.0.1:5568".parse().unwrap();
        assert_eq!(first_ipv4(vec![v6].into_iter()), None);
        assert_eq!(
            first_ipv4(vec![v6, v4].into_iter()),
            Some("127.0.0.1:5568".parse().unwrap())
        );
    }
}
