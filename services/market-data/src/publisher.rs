//! Depth feed publisher
//!
//! The publisher assigns sequence numbers and timestamps synchronously:
//! packet construction is atomic with respect to the sequence counter,
//! so feed order always equals book event order. Finished datagrams go
//! onto a queue that a sender task drains to the multicast socket.
//! Sequence numbers start at 1 and never gap.

use crate::messages::{FeedMessage, Packet};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use types::prelude::{SequenceNumber, TimeSource};

/// Sequences and packetizes book events for the multicast feed
pub struct Publisher {
    /// the sequence number for the next outbound packet
    sequence: SequenceNumber,
    /// timestamp source, injectable for tests
    clock: TimeSource,
    /// outbound packet queue drained by the sender task
    tx: mpsc::UnboundedSender<Packet>,
}

impl Publisher {
    /// Create a publisher writing packets into the given queue
    pub fn new(tx: mpsc::UnboundedSender<Packet>, clock: TimeSource) -> Self {
        Self {
            sequence: 1,
            clock,
            tx,
        }
    }

    /// The sequence number the next packet will carry
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Packetize one event and queue it for sending.
    ///
    /// The sequence number is consumed here even if the sender side has
    /// gone away, keeping the counter authoritative.
    pub fn publish(&mut self, message: FeedMessage) {
        let packet = message.encode(self.sequence, (self.clock)());
        let kind = message.kind() as char;
        debug!(sequence = self.sequence, %kind, "feed packet queued");
        self.sequence += 1;
        if self.tx.send(packet).is_err() {
            warn!("feed sender task is gone; dropping packet");
        }
    }
}

/// Bind a socket for multicast publishing.
///
/// The socket binds to an ephemeral local port; `ttl` limits how many
/// hops the datagrams survive.
pub async fn bind_sender(ttl: Option<u32>) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    if let Some(hops) = ttl {
        socket.set_multicast_ttl_v4(hops)?;
    }
    socket.set_multicast_loop_v4(true)?;
    Ok(socket)
}

/// Drain the packet queue onto the multicast group.
///
/// Runs until the queue closes; a send failure is fatal for the feed.
pub async fn run_sender(
    socket: UdpSocket,
    group: SocketAddrV4,
    mut rx: mpsc::UnboundedReceiver<Packet>,
) -> io::Result<()> {
    while let Some(packet) = rx.recv().await {
        socket.send_to(&packet, group).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::FeedFrame;

    fn fixed_clock() -> u64 {
        1_700_000_000_000_000_000
    }

    fn make_publisher() -> (Publisher, mpsc::UnboundedReceiver<Packet>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Publisher::new(tx, fixed_clock), rx)
    }

    fn decode(packet: Packet) -> FeedFrame {
        FeedMessage::decode(&packet).unwrap()
    }

    #[test]
    fn test_sequences_start_at_one_and_never_gap() {
        let (mut publisher, mut rx) = make_publisher();
        publisher.publish(FeedMessage::StartOfSession);
        publisher.publish(FeedMessage::Clear);
        publisher.publish(FeedMessage::EndOfSession);

        for expected in 1..=3 {
            let frame = decode(rx.try_recv().unwrap());
            assert_eq!(frame.sequence, expected);
        }
        assert_eq!(publisher.sequence(), 4);
    }

    #[test]
    fn test_packets_carry_the_clock() {
        let (mut publisher, mut rx) = make_publisher();
        publisher.publish(FeedMessage::Clear);
        let frame = decode(rx.try_recv().unwrap());
        assert_eq!(frame.time, fixed_clock());
    }

    #[test]
    fn test_sequence_consumed_even_without_receiver() {
        let (mut publisher, rx) = make_publisher();
        drop(rx);
        publisher.publish(FeedMessage::Clear);
        publisher.publish(FeedMessage::Clear);
        assert_eq!(publisher.sequence(), 3);
    }

    #[test]
    fn test_emission_order_matches_publish_order() {
        let (mut publisher, mut rx) = make_publisher();
        publisher.publish(FeedMessage::AddOrder {
            uid: 1,
            price: 100,
            quantity: 10,
            side: types::prelude::Side::Buy,
        });
        publisher.publish(FeedMessage::DeleteOrder { uid: 1 });

        let first = decode(rx.try_recv().unwrap());
        let second = decode(rx.try_recv().unwrap());
        assert!(matches!(first.message, FeedMessage::AddOrder { .. }));
        assert!(matches!(second.message, FeedMessage::DeleteOrder { .. }));
    }
}
