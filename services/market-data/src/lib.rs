//! Market data service
//!
//! The unidirectional half of the venue: book events become sequenced
//! 40-byte datagrams on a UDP multicast group, and any listener can
//! rebuild a read-only mirror of the book from the stream.
//!
//! - `messages`: the datagram codec
//! - `publisher`: sequence assignment and the multicast send queue
//! - `subscriber`: group membership, gap handling, and mirror replay
//! - `depth`: aggregated per-price views over a rebuilt book

pub mod depth;
pub mod messages;
pub mod publisher;
pub mod subscriber;

pub use depth::{DepthLevel, DepthSnapshot};
pub use messages::{FeedCodecError, FeedFrame, FeedMessage, Packet, HEADER_LEN, PACKET_LEN};
pub use publisher::Publisher;
pub use subscriber::Subscriber;
