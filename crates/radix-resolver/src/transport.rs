//! The wire transport: one DNS message out, one message back.
//!
//! The resolver speaks plain DNS over UDP with EDNS(0) advertising a
//! 4096-byte payload. Truncated responses are returned as parsed; the
//! caller records the TC bit and processes what arrived.

use async_trait::async_trait;
use radix_proto::Message;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::trace;

/// Transport failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The response did not parse as a DNS message.
    #[error("malformed response: {0}")]
    Malformed(#[from] radix_proto::Error),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Sends one query and receives one response.
///
/// Implementations must be safe for concurrent use; the resolver shares
/// one exchanger across all in-flight lookups. Deadlines are imposed by
/// the caller.
#[async_trait]
pub trait Exchanger: Send + Sync {
    /// Exchanges `query` with the server at `addr`.
    async fn exchange(&self, query: &Message, addr: SocketAddr) -> Result<Message>;
}

/// UDP exchanger: an ephemeral socket per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpExchanger;

#[async_trait]
impl Exchanger for UdpExchanger {
    async fn exchange(&self, query: &Message, addr: SocketAddr) -> Result<Message> {
        let socket = if addr.is_ipv4() {
            UdpSocket::bind("0.0.0.0:0").await?
        } else {
            UdpSocket::bind("[::]:0").await?
        };
        socket.connect(addr).await?;

        let wire = query.to_wire();
        socket.send(&wire).await?;
        trace!(%addr, bytes = wire.len(), "sent query");

        let mut buf = vec![0u8; radix_proto::DEFAULT_EDNS_UDP_SIZE as usize];
        loop {
            let len = socket.recv(&mut buf).await?;
            let response = Message::parse(&buf[..len])?;
            // A datagram with the wrong ID is not our answer; keep
            // listening until the caller's deadline fires.
            if response.id() == query.id() {
                trace!(%addr, bytes = len, "received response");
                return Ok(response);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::{Name, Question};
    use std::str::FromStr;

    #[tokio::test]
    async fn exchanges_over_a_local_socket() {
        // Stand up a one-shot fake server on localhost.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let query = Message::parse(&buf[..len]).unwrap();
            let response = Message::response_from(&query);
            server.send_to(&response.to_wire(), peer).await.unwrap();
        });

        let query = Message::query(
            Question::a(Name::from_str("example.com").unwrap()),
            false,
        );
        let response = UdpExchanger.exchange(&query, server_addr).await.unwrap();
        assert_eq!(response.id(), query.id());
        handle.await.unwrap();
    }
}
