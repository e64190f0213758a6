use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// UDP transport with a bounded blocking receive. The timeout is the only
/// scheduling heartbeat the router has; hitting it is a control signal, not
/// an error.
pub struct Transport {
    socket: UdpSocket,
    recv_timeout: Duration,
}

impl Transport {
    pub async fn bind(addr: SocketAddr, recv_timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("binding UDP socket to {}", addr))?;
        info!("bound to {} (UDP)", addr);
        Ok(Self {
            socket,
            recv_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("reading local address")
    }

    pub async fn send_to(&self, payload: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket
            .send_to(payload, addr)
            .await
            .with_context(|| format!("sending datagram to {}", addr))?;
        Ok(())
    }

    /// Receive one datagram, or `None` on timeout.
    pub async fn recv_timeout(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match timeout(self.recv_timeout, self.socket.recv_from(buf)).await {
            Ok(received) => {
                let (len, from) = received.context("receiving datagram")?;
                Ok(Some((len, from)))
            }
            Err(_) => Ok(None),
        }
    }
}
