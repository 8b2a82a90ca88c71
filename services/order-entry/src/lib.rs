//! Order-entry service
//!
//! The bidirectional half of the venue: an authenticated TCP channel
//! carrying fixed 40-byte frames. Clients log in, submit and manage
//! orders, and receive per-trade reports; the venue engine serializes
//! every session onto one task so request processing is atomic and the
//! depth feed sees events in book order.
//!
//! - `messages`: the frame codec
//! - `auth`: credential directory and the one-session-per-account rule
//! - `venue`: the engine task binding book, accounts, sessions, feed
//! - `server`: TCP accept loop and per-connection pumps
//! - `client`: the client half of the session protocol
//! - `config`: JSON venue configuration

pub mod auth;
pub mod client;
pub mod config;
pub mod messages;
pub mod server;
pub mod venue;

pub use auth::{AuthError, Authorizer};
pub use client::{Client, ClientError, ClientState};
pub use messages::{Frame, Request, Response, SessionCodecError, FRAME_LEN};
pub use venue::{AdminCommand, SessionId, Venue, VenueEvent};
