//! Depth feed message codec
//!
//! Every feed message is one fixed 40-byte datagram. The 16-byte header
//! carries the message length, a one-character kind, the publisher's
//! sequence number, and a nanosecond timestamp; the payload is the packed
//! little-endian concatenation of the kind's fields. Bytes past the
//! declared length are sent as zeros and ignored on receipt.
//!
//! # Wire Format
//! ```text
//! [length:    u16]  message length in bytes (header included)
//! [kind:      u8 ]  ASCII message id ('c','a','d','t','s','e')
//! [padding:   u8 ]  0
//! [sequence:  u32]  publisher sequence, starts at 1, no gaps
//! [timestamp: u64]  wall-clock Unix nanos, informational only
//! [payload...    ]  kind-specific fields, little-endian, packed
//! ```

use thiserror::Error;
use types::prelude::{OrderId, Price, Quantity, SequenceNumber, Side, TimeStamp};

/// Size of every feed datagram on the wire
pub const PACKET_LEN: usize = 40;

/// Size of the feed header
pub const HEADER_LEN: usize = 16;

/// A raw feed datagram
pub type Packet = [u8; PACKET_LEN];

/// Kind characters for the feed protocol
pub mod kind {
    pub const CLEAR: u8 = b'c';
    pub const ADD_ORDER: u8 = b'a';
    pub const DELETE_ORDER: u8 = b'd';
    pub const TRADE: u8 = b't';
    pub const START_OF_SESSION: u8 = b's';
    pub const END_OF_SESSION: u8 = b'e';
}

/// Feed codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedCodecError {
    #[error("unknown feed message kind: 0x{0:02x}")]
    UnknownKind(u8),

    #[error("length field {got} disagrees with kind 0x{kind:02x} (expected {expected})")]
    LengthMismatch { kind: u8, expected: u16, got: u16 },

    #[error("invalid side byte: 0x{0:02x}")]
    BadSide(u8),
}

/// One depth event on the multicast feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMessage {
    /// drop every order in the book
    Clear,
    /// a limit order rested on the book
    AddOrder {
        uid: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    },
    /// a resting order left the book without trading
    DeleteOrder { uid: OrderId },
    /// a resting order traded; `side` is the aggressor's side
    Trade {
        uid: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    },
    /// trading session opened
    StartOfSession,
    /// trading session closed
    EndOfSession,
}

/// A decoded datagram: header metadata plus the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedFrame {
    pub sequence: SequenceNumber,
    pub time: TimeStamp,
    pub message: FeedMessage,
}

impl FeedMessage {
    /// The wire kind character for this message
    pub fn kind(&self) -> u8 {
        match self {
            FeedMessage::Clear => kind::CLEAR,
            FeedMessage::AddOrder { .. } => kind::ADD_ORDER,
            FeedMessage::DeleteOrder { .. } => kind::DELETE_ORDER,
            FeedMessage::Trade { .. } => kind::TRADE,
            FeedMessage::StartOfSession => kind::START_OF_SESSION,
            FeedMessage::EndOfSession => kind::END_OF_SESSION,
        }
    }

    /// The declared message length for this kind (header included)
    pub fn wire_len(&self) -> u16 {
        wire_len_of(self.kind()).unwrap_or(HEADER_LEN as u16)
    }

    /// Pack the message into a 40-byte datagram
    pub fn encode(&self, sequence: SequenceNumber, time: TimeStamp) -> Packet {
        let mut packet = [0u8; PACKET_LEN];
        packet[0..2].copy_from_slice(&self.wire_len().to_le_bytes());
        packet[2] = self.kind();
        packet[3] = 0;
        packet[4..8].copy_from_slice(&sequence.to_le_bytes());
        packet[8..16].copy_from_slice(&time.to_le_bytes());
        match *self {
            FeedMessage::Clear | FeedMessage::StartOfSession | FeedMessage::EndOfSession => {}
            FeedMessage::AddOrder {
                uid,
                price,
                quantity,
                side,
            }
            | FeedMessage::Trade {
                uid,
                price,
                quantity,
                side,
            } => {
                packet[16..24].copy_from_slice(&uid.to_le_bytes());
                packet[24..32].copy_from_slice(&price.to_le_bytes());
                packet[32..36].copy_from_slice(&quantity.to_le_bytes());
                packet[36] = side.to_wire();
            }
            FeedMessage::DeleteOrder { uid } => {
                packet[16..24].copy_from_slice(&uid.to_le_bytes());
            }
        }
        packet
    }

    /// Unpack a 40-byte datagram, validating the length field against the
    /// kind's fixed message length.
    pub fn decode(packet: &Packet) -> Result<FeedFrame, FeedCodecError> {
        let length = u16::from_le_bytes([packet[0], packet[1]]);
        let kind_byte = packet[2];
        let sequence = SequenceNumber::from_le_bytes(packet[4..8].try_into().unwrap());
        let time = TimeStamp::from_le_bytes(packet[8..16].try_into().unwrap());

        let expected = wire_len_of(kind_byte).ok_or(FeedCodecError::UnknownKind(kind_byte))?;
        if length != expected {
            return Err(FeedCodecError::LengthMismatch {
                kind: kind_byte,
                expected,
                got: length,
            });
        }

        let message = match kind_byte {
            kind::CLEAR => FeedMessage::Clear,
            kind::START_OF_SESSION => FeedMessage::StartOfSession,
            kind::END_OF_SESSION => FeedMessage::EndOfSession,
            kind::DELETE_ORDER => FeedMessage::DeleteOrder {
                uid: OrderId::from_le_bytes(packet[16..24].try_into().unwrap()),
            },
            kind::ADD_ORDER | kind::TRADE => {
                let uid = OrderId::from_le_bytes(packet[16..24].try_into().unwrap());
                let price = Price::from_le_bytes(packet[24..32].try_into().unwrap());
                let quantity = Quantity::from_le_bytes(packet[32..36].try_into().unwrap());
                let side =
                    Side::from_wire(packet[36]).ok_or(FeedCodecError::BadSide(packet[36]))?;
                if kind_byte == kind::ADD_ORDER {
                    FeedMessage::AddOrder {
                        uid,
                        price,
                        quantity,
                        side,
                    }
                } else {
                    FeedMessage::Trade {
                        uid,
                        price,
                        quantity,
                        side,
                    }
                }
            }
            other => return Err(FeedCodecError::UnknownKind(other)),
        };

        Ok(FeedFrame {
            sequence,
            time,
            message,
        })
    }
}

/// Fixed message length for a kind character, `None` for unknown kinds
fn wire_len_of(kind_byte: u8) -> Option<u16> {
    match kind_byte {
        kind::CLEAR | kind::START_OF_SESSION | kind::END_OF_SESSION => Some(HEADER_LEN as u16),
        kind::ADD_ORDER | kind::TRADE => Some(37),
        kind::DELETE_ORDER => Some(24),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: FeedMessage) -> FeedFrame {
        let packet = message.encode(42, 1_708_123_456_789_000_000);
        FeedMessage::decode(&packet).unwrap()
    }

    #[test]
    fn test_header_fields_roundtrip() {
        let frame = roundtrip(FeedMessage::Clear);
        assert_eq!(frame.sequence, 42);
        assert_eq!(frame.time, 1_708_123_456_789_000_000);
        assert_eq!(frame.message, FeedMessage::Clear);
    }

    #[test]
    fn test_add_order_roundtrip() {
        let message = FeedMessage::AddOrder {
            uid: 7,
            price: 10_050,
            quantity: 250,
            side: Side::Buy,
        };
        assert_eq!(roundtrip(message).message, message);
    }

    #[test]
    fn test_trade_roundtrip() {
        let message = FeedMessage::Trade {
            uid: u64::MAX,
            price: u64::MAX,
            quantity: u32::MAX,
            side: Side::Sell,
        };
        assert_eq!(roundtrip(message).message, message);
    }

    #[test]
    fn test_delete_order_roundtrip() {
        let message = FeedMessage::DeleteOrder { uid: 99 };
        assert_eq!(roundtrip(message).message, message);
    }

    #[test]
    fn test_session_boundaries_roundtrip() {
        assert_eq!(
            roundtrip(FeedMessage::StartOfSession).message,
            FeedMessage::StartOfSession
        );
        assert_eq!(
            roundtrip(FeedMessage::EndOfSession).message,
            FeedMessage::EndOfSession
        );
    }

    #[test]
    fn test_declared_lengths() {
        assert_eq!(FeedMessage::Clear.wire_len(), 16);
        assert_eq!(FeedMessage::StartOfSession.wire_len(), 16);
        assert_eq!(FeedMessage::EndOfSession.wire_len(), 16);
        assert_eq!(FeedMessage::DeleteOrder { uid: 1 }.wire_len(), 24);
        let add = FeedMessage::AddOrder {
            uid: 1,
            price: 2,
            quantity: 3,
            side: Side::Buy,
        };
        assert_eq!(add.wire_len(), 37);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut packet = FeedMessage::Clear.encode(1, 0);
        packet[2] = b'z';
        assert_eq!(
            FeedMessage::decode(&packet),
            Err(FeedCodecError::UnknownKind(b'z'))
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut packet = FeedMessage::DeleteOrder { uid: 1 }.encode(1, 0);
        packet[0..2].copy_from_slice(&16u16.to_le_bytes());
        assert!(matches!(
            FeedMessage::decode(&packet),
            Err(FeedCodecError::LengthMismatch {
                kind: b'd',
                expected: 24,
                got: 16
            })
        ));
    }

    #[test]
    fn test_bad_side_rejected() {
        let message = FeedMessage::AddOrder {
            uid: 1,
            price: 2,
            quantity: 3,
            side: Side::Buy,
        };
        let mut packet = message.encode(1, 0);
        packet[36] = b'Q';
        assert_eq!(
            FeedMessage::decode(&packet),
            Err(FeedCodecError::BadSide(b'Q'))
        );
    }

    #[test]
    fn test_trailing_bytes_are_zero() {
        let packet = FeedMessage::DeleteOrder { uid: 1 }.encode(1, 0);
        assert!(packet[24..].iter().all(|&b| b == 0));
    }
}
