//! Outbound tag datagrams.
//!
//! The sink is fire-and-forget: one `send_to` per frame, no retries. A lost
//! datagram is replaced by a fresher one on the next frame tick.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::info;

use crate::error::{AppError, Result};

/// Where encoded tag messages go.
pub trait TagSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<usize>;
}

pub struct UdpTagSink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpTagSink {
    /// Binds an ephemeral local port and targets `dest`. Failing here is fatal.
    pub fn bind(dest: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if dest.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(AppError::Bind)?;
        info!(local = ?socket.local_addr().ok(), %dest, "Tag socket bound");
        Ok(Self { socket, dest })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

impl TagSink for UdpTagSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.socket.send_to(payload, self.dest)
    }
}

/// Resolves `host:port` to the first address it maps to.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|source| AppError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| AppError::NoAddress(host.to_string()))
}
