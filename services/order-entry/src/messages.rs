//! Order-entry message codec
//!
//! Every message travels as one fixed 40-byte frame. The 8-byte header
//! carries the message length, a one-character kind, and the sender's
//! per-session sequence number; the payload is the packed little-endian
//! concatenation of the kind's fields. Bytes past the declared length
//! are sent as zeros and ignored on receipt.
//!
//! # Wire Format
//! ```text
//! [length:   u16]  message length in bytes (header included)
//! [kind:     u8 ]  ASCII message id
//! [padding:  u8 ]  0
//! [sequence: u32]  per-session sequence, starts at 0
//! [payload...   ]  kind-specific fields, little-endian, packed
//! ```

use thiserror::Error;
use types::prelude::{
    OrderId, Price, Quantity, SequenceNumber, Side, PASSWORD_LEN, USERNAME_LEN,
};

/// Size of every order-entry frame on the wire
pub const FRAME_LEN: usize = 40;

/// Size of the order-entry header
pub const HEADER_LEN: usize = 8;

/// A raw order-entry frame
pub type Frame = [u8; FRAME_LEN];

/// A price of 0 in an order request marks a market order
pub const MARKET_ORDER_PRICE: Price = 0;

/// Sentinel order id for market orders and rejections
pub const NO_ORDER_ID: OrderId = 0;

/// Kind characters for the order-entry protocol
pub mod kind {
    pub const LOGIN_REQUEST: u8 = b'L';
    pub const LOGIN_RESPONSE: u8 = b'l';
    pub const LOGOUT_REQUEST: u8 = b'O';
    pub const LOGOUT_RESPONSE: u8 = b'o';
    pub const ORDER_REQUEST: u8 = b'N';
    pub const ORDER_RESPONSE: u8 = b'n';
    pub const CANCEL_REQUEST: u8 = b'C';
    pub const CANCEL_RESPONSE: u8 = b'c';
    pub const REPLACE_REQUEST: u8 = b'R';
    pub const REPLACE_RESPONSE: u8 = b'r';
    pub const PURGE_REQUEST: u8 = b'P';
    pub const PURGE_RESPONSE: u8 = b'p';
    pub const TRADE_RESPONSE: u8 = b't';
}

/// Order-entry codec errors. Any decode failure on the server side is a
/// protocol violation that ends the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionCodecError {
    #[error("unknown message kind: 0x{0:02x}")]
    UnknownKind(u8),

    #[error("invalid side byte: 0x{0:02x}")]
    BadSide(u8),

    #[error("invalid status byte: 0x{0:02x}")]
    BadStatus(u8),
}

/// Result of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    /// the session is now authenticated
    Accepted,
    /// the credentials are unknown or wrong
    NotAuthorized,
    /// this session is already authenticated
    AlreadyAuthorized,
    /// the account is logged in on another session
    SessionInUse,
}

impl LoginStatus {
    pub fn to_wire(self) -> u8 {
        match self {
            LoginStatus::Accepted => b'A',
            LoginStatus::NotAuthorized => b'N',
            LoginStatus::AlreadyAuthorized => b'C',
            LoginStatus::SessionInUse => b'B',
        }
    }

    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(LoginStatus::Accepted),
            b'N' => Some(LoginStatus::NotAuthorized),
            b'C' => Some(LoginStatus::AlreadyAuthorized),
            b'B' => Some(LoginStatus::SessionInUse),
            _ => None,
        }
    }
}

/// Why a session was logged out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// the client asked to log out
    UserRequested,
    /// the trading day ended
    EndOfDay,
    /// an operator intervened
    Administrative,
    /// the client broke the application protocol
    ProtocolViolation,
}

impl LogoutReason {
    pub fn to_wire(self) -> u8 {
        match self {
            LogoutReason::UserRequested => b'U',
            LogoutReason::EndOfDay => b'E',
            LogoutReason::Administrative => b'A',
            LogoutReason::ProtocolViolation => b'!',
        }
    }

    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'U' => Some(LogoutReason::UserRequested),
            b'E' => Some(LogoutReason::EndOfDay),
            b'A' => Some(LogoutReason::Administrative),
            b'!' => Some(LogoutReason::ProtocolViolation),
            _ => None,
        }
    }
}

/// Accepted / rejected flag carried by order, cancel, replace, and purge
/// responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Accepted,
    Rejected,
}

impl Status {
    pub fn to_wire(self) -> u8 {
        match self {
            Status::Accepted => b'A',
            Status::Rejected => b'R',
        }
    }

    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Status::Accepted),
            b'R' => Some(Status::Rejected),
            _ => None,
        }
    }
}

/// A client-to-server message.
///
/// Login credentials travel as raw bytes: malformed credentials are a
/// failed login, not a framing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Login {
        username: [u8; USERNAME_LEN],
        password: [u8; PASSWORD_LEN],
    },
    Logout,
    Order {
        price: Price,
        quantity: Quantity,
        side: Side,
    },
    Cancel {
        order_id: OrderId,
    },
    Replace {
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    },
    Purge,
}

/// A decoded inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub sequence: SequenceNumber,
    pub request: Request,
}

impl Request {
    /// The wire kind character for this request
    pub fn kind(&self) -> u8 {
        match self {
            Request::Login { .. } => kind::LOGIN_REQUEST,
            Request::Logout => kind::LOGOUT_REQUEST,
            Request::Order { .. } => kind::ORDER_REQUEST,
            Request::Cancel { .. } => kind::CANCEL_REQUEST,
            Request::Replace { .. } => kind::REPLACE_REQUEST,
            Request::Purge => kind::PURGE_REQUEST,
        }
    }

    /// The declared message length for this request (header included)
    pub fn wire_len(&self) -> u16 {
        match self {
            Request::Login { .. } => 24,
            Request::Logout => 8,
            Request::Order { .. } => 21,
            Request::Cancel { .. } => 16,
            Request::Replace { .. } => 29,
            Request::Purge => 8,
        }
    }

    /// Pack the request into a 40-byte frame
    pub fn encode(&self, sequence: SequenceNumber) -> Frame {
        let mut frame = [0u8; FRAME_LEN];
        frame[0..2].copy_from_slice(&self.wire_len().to_le_bytes());
        frame[2] = self.kind();
        frame[3] = 0;
        frame[4..8].copy_from_slice(&sequence.to_le_bytes());
        match *self {
            Request::Login { username, password } => {
                frame[8..12].copy_from_slice(&username);
                frame[12..24].copy_from_slice(&password);
            }
            Request::Logout | Request::Purge => {}
            Request::Order {
                price,
                quantity,
                side,
            } => {
                frame[8..16].copy_from_slice(&price.to_le_bytes());
                frame[16..20].copy_from_slice(&quantity.to_le_bytes());
                frame[20] = side.to_wire();
            }
            Request::Cancel { order_id } => {
                frame[8..16].copy_from_slice(&order_id.to_le_bytes());
            }
            Request::Replace {
                order_id,
                price,
                quantity,
                side,
            } => {
                frame[8..16].copy_from_slice(&order_id.to_le_bytes());
                frame[16..24].copy_from_slice(&price.to_le_bytes());
                frame[24..28].copy_from_slice(&quantity.to_le_bytes());
                frame[28] = side.to_wire();
            }
        }
        frame
    }

    /// Unpack a client frame
    pub fn decode(frame: &Frame) -> Result<RequestFrame, SessionCodecError> {
        let sequence = SequenceNumber::from_le_bytes(frame[4..8].try_into().unwrap());
        let request = match frame[2] {
            kind::LOGIN_REQUEST => {
                let mut username = [0u8; USERNAME_LEN];
                username.copy_from_slice(&frame[8..12]);
                let mut password = [0u8; PASSWORD_LEN];
                password.copy_from_slice(&frame[12..24]);
                Request::Login { username, password }
            }
            kind::LOGOUT_REQUEST => Request::Logout,
            kind::ORDER_REQUEST => Request::Order {
                price: Price::from_le_bytes(frame[8..16].try_into().unwrap()),
                quantity: Quantity::from_le_bytes(frame[16..20].try_into().unwrap()),
                side: Side::from_wire(frame[20]).ok_or(SessionCodecError::BadSide(frame[20]))?,
            },
            kind::CANCEL_REQUEST => Request::Cancel {
                order_id: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
            },
            kind::REPLACE_REQUEST => Request::Replace {
                order_id: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
                price: Price::from_le_bytes(frame[16..24].try_into().unwrap()),
                quantity: Quantity::from_le_bytes(frame[24..28].try_into().unwrap()),
                side: Side::from_wire(frame[28]).ok_or(SessionCodecError::BadSide(frame[28]))?,
            },
            kind::PURGE_REQUEST => Request::Purge,
            other => return Err(SessionCodecError::UnknownKind(other)),
        };
        Ok(RequestFrame { sequence, request })
    }
}

/// A server-to-client message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Login {
        status: LoginStatus,
    },
    Logout {
        reason: LogoutReason,
    },
    Order {
        order_id: OrderId,
        status: Status,
    },
    Cancel {
        order_id: OrderId,
        status: Status,
    },
    Replace {
        canceled: OrderId,
        new_order_id: OrderId,
        status: Status,
    },
    Purge {
        status: Status,
    },
    Trade {
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        leaves_quantity: Quantity,
        side: Side,
    },
}

/// A decoded outbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub sequence: SequenceNumber,
    pub response: Response,
}

impl Response {
    /// The wire kind character for this response
    pub fn kind(&self) -> u8 {
        match self {
            Response::Login { .. } => kind::LOGIN_RESPONSE,
            Response::Logout { .. } => kind::LOGOUT_RESPONSE,
            Response::Order { .. } => kind::ORDER_RESPONSE,
            Response::Cancel { .. } => kind::CANCEL_RESPONSE,
            Response::Replace { .. } => kind::REPLACE_RESPONSE,
            Response::Purge { .. } => kind::PURGE_RESPONSE,
            Response::Trade { .. } => kind::TRADE_RESPONSE,
        }
    }

    /// The declared message length for this response (header included)
    pub fn wire_len(&self) -> u16 {
        match self {
            Response::Login { .. } => 9,
            Response::Logout { .. } => 9,
            Response::Order { .. } => 17,
            Response::Cancel { .. } => 17,
            Response::Replace { .. } => 25,
            Response::Purge { .. } => 9,
            Response::Trade { .. } => 33,
        }
    }

    /// Pack the response into a 40-byte frame
    pub fn encode(&self, sequence: SequenceNumber) -> Frame {
        let mut frame = [0u8; FRAME_LEN];
        frame[0..2].copy_from_slice(&self.wire_len().to_le_bytes());
        frame[2] = self.kind();
        frame[3] = 0;
        frame[4..8].copy_from_slice(&sequence.to_le_bytes());
        match *self {
            Response::Login { status } => frame[8] = status.to_wire(),
            Response::Logout { reason } => frame[8] = reason.to_wire(),
            Response::Order { order_id, status } => {
                frame[8..16].copy_from_slice(&order_id.to_le_bytes());
                frame[16] = status.to_wire();
            }
            Response::Cancel { order_id, status } => {
                frame[8..16].copy_from_slice(&order_id.to_le_bytes());
                frame[16] = status.to_wire();
            }
            Response::Replace {
                canceled,
                new_order_id,
                status,
            } => {
                frame[8..16].copy_from_slice(&canceled.to_le_bytes());
                frame[16..24].copy_from_slice(&new_order_id.to_le_bytes());
                frame[24] = status.to_wire();
            }
            Response::Purge { status } => frame[8] = status.to_wire(),
            Response::Trade {
                order_id,
                price,
                quantity,
                leaves_quantity,
                side,
            } => {
                frame[8..16].copy_from_slice(&order_id.to_le_bytes());
                frame[16..24].copy_from_slice(&price.to_le_bytes());
                frame[24..28].copy_from_slice(&quantity.to_le_bytes());
                frame[28..32].copy_from_slice(&leaves_quantity.to_le_bytes());
                frame[32] = side.to_wire();
            }
        }
        frame
    }

    /// Unpack a server frame
    pub fn decode(frame: &Frame) -> Result<ResponseFrame, SessionCodecError> {
        let sequence = SequenceNumber::from_le_bytes(frame[4..8].try_into().unwrap());
        let status_at = |index: usize| {
            Status::from_wire(frame[index]).ok_or(SessionCodecError::BadStatus(frame[index]))
        };
        let response = match frame[2] {
            kind::LOGIN_RESPONSE => Response::Login {
                status: LoginStatus::from_wire(frame[8])
                    .ok_or(SessionCodecError::BadStatus(frame[8]))?,
            },
            kind::LOGOUT_RESPONSE => Response::Logout {
                reason: LogoutReason::from_wire(frame[8])
                    .ok_or(SessionCodecError::BadStatus(frame[8]))?,
            },
            kind::ORDER_RESPONSE => Response::Order {
                order_id: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
                status: status_at(16)?,
            },
            kind::CANCEL_RESPONSE => Response::Cancel {
                order_id: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
                status: status_at(16)?,
            },
            kind::REPLACE_RESPONSE => Response::Replace {
                canceled: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
                new_order_id: OrderId::from_le_bytes(frame[16..24].try_into().unwrap()),
                status: status_at(24)?,
            },
            kind::PURGE_RESPONSE => Response::Purge { status: status_at(8)? },
            kind::TRADE_RESPONSE => Response::Trade {
                order_id: OrderId::from_le_bytes(frame[8..16].try_into().unwrap()),
                price: Price::from_le_bytes(frame[16..24].try_into().unwrap()),
                quantity: Quantity::from_le_bytes(frame[24..28].try_into().unwrap()),
                leaves_quantity: Quantity::from_le_bytes(frame[28..32].try_into().unwrap()),
                side: Side::from_wire(frame[32]).ok_or(SessionCodecError::BadSide(frame[32]))?,
            },
            other => return Err(SessionCodecError::UnknownKind(other)),
        };
        Ok(ResponseFrame { sequence, response })
    }
}
