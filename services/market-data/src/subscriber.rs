//! Depth feed subscriber
//!
//! Joins the multicast group and replays the event stream into a local
//! mirror of the venue's book. The feed is best-effort: a skipped or
//! out-of-order sequence is logged and the subscriber resynchronizes by
//! adopting the observed value; a delete or trade for an order it never
//! saw is tolerated. Malformed datagrams are counted and dropped.

use crate::messages::{FeedFrame, FeedMessage, Packet, PACKET_LEN};
use matching_engine::accounts::AccountId;
use matching_engine::book::LimitOrderBook;
use std::io;
use std::net::Ipv4Addr;
use tokio::net::UdpSocket;
use tracing::{debug, warn};
use types::prelude::SequenceNumber;

/// Replays feed packets into a mirror book
pub struct Subscriber {
    /// the rebuilt limit order book
    book: LimitOrderBook,
    /// every mirrored order is parked under this account
    feed_account: AccountId,
    /// whether the venue's trading session is open
    session_active: bool,
    /// the last applied sequence number (0 before the first packet)
    last_sequence: SequenceNumber,
    /// packets applied since creation
    packets_applied: u64,
    /// malformed datagrams dropped
    packets_dropped: u64,
    /// sequence discontinuities observed
    gaps_detected: u64,
}

impl Default for Subscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscriber {
    /// Create a subscriber with an empty mirror book
    pub fn new() -> Self {
        let mut book = LimitOrderBook::new();
        let feed_account = book.accounts_mut().create();
        Self {
            book,
            feed_account,
            session_active: false,
            last_sequence: 0,
            packets_applied: 0,
            packets_dropped: 0,
            gaps_detected: 0,
        }
    }

    /// Read access to the mirror book
    pub fn book(&self) -> &LimitOrderBook {
        &self.book
    }

    /// True while the venue's trading session is open
    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    /// The last applied sequence number
    pub fn last_sequence(&self) -> SequenceNumber {
        self.last_sequence
    }

    /// Packets applied since creation
    pub fn packets_applied(&self) -> u64 {
        self.packets_applied
    }

    /// Malformed datagrams dropped since creation
    pub fn packets_dropped(&self) -> u64 {
        self.packets_dropped
    }

    /// Sequence discontinuities observed since creation
    pub fn gaps_detected(&self) -> u64 {
        self.gaps_detected
    }

    /// Decode and apply one raw datagram
    pub fn handle_packet(&mut self, packet: &Packet) {
        match FeedMessage::decode(packet) {
            Ok(frame) => self.apply(frame),
            Err(err) => {
                self.packets_dropped += 1;
                warn!(%err, "dropping malformed feed packet");
            }
        }
    }

    /// Apply a decoded frame to the mirror book.
    ///
    /// Sequence tracking expects `last + 1`; anything else logs a gap and
    /// adopts the observed value. No replay is requested.
    pub fn apply(&mut self, frame: FeedFrame) {
        let expected = self.last_sequence.wrapping_add(1);
        if frame.sequence != expected {
            self.gaps_detected += 1;
            warn!(
                expected,
                got = frame.sequence,
                "feed sequence discontinuity; resynchronizing"
            );
        }
        self.last_sequence = frame.sequence;
        self.packets_applied += 1;

        match frame.message {
            FeedMessage::StartOfSession => {
                self.session_active = true;
                debug!("trading session opened");
            }
            FeedMessage::EndOfSession => {
                self.session_active = false;
                debug!("trading session closed");
            }
            FeedMessage::Clear => {
                self.book.clear();
            }
            FeedMessage::AddOrder {
                uid,
                price,
                quantity,
                side,
            } => {
                // the wire uid is authoritative; the mirror allocates nothing
                self.book
                    .limit_with_id(self.feed_account, uid, side, quantity, price);
            }
            FeedMessage::DeleteOrder { uid } => {
                if self.book.has(uid) {
                    let _ = self.book.cancel(uid);
                } else {
                    warn!(uid, "delete for unknown order; tolerated");
                }
            }
            FeedMessage::Trade { uid, quantity, .. } => {
                if self.book.has(uid) {
                    if let Err(err) = self.book.reduce(uid, quantity) {
                        warn!(uid, %err, "trade exceeds mirrored quantity; dropped");
                    }
                } else {
                    warn!(uid, "trade for unknown order; tolerated");
                }
            }
        }
    }
}

/// Join the multicast group on the given port.
pub async fn join(group: Ipv4Addr, port: u16) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
    Ok(socket)
}

/// Receive datagrams forever, applying each to the subscriber.
///
/// Datagrams that are not exactly one packet long are dropped.
pub async fn run(socket: UdpSocket, subscriber: &mut Subscriber) -> io::Result<()> {
    let mut buffer = [0u8; PACKET_LEN];
    loop {
        let (received, from) = socket.recv_from(&mut buffer).await?;
        if received != PACKET_LEN {
            warn!(received, %from, "undersized feed datagram dropped");
            continue;
        }
        subscriber.handle_packet(&buffer);
    }
}
