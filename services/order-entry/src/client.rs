//! Order-entry client connection
//!
//! The client half of the session protocol: frames requests with its own
//! outbound sequence, reads exact 40-byte responses, and keeps a local
//! mirror of what the server told it, including the authorization flag,
//! the set of its live orders, and a running position built from trade
//! reports. Trading shells and agents drive this type; the bookkeeping
//! lives in `ClientState` so it can be exercised without a socket.

use crate::messages::{
    Frame, LoginStatus, Request, Response, ResponseFrame, SessionCodecError, Status, FRAME_LEN,
    MARKET_ORDER_PRICE,
};
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::warn;
use types::prelude::{
    Capital, OrderId, Password, Price, Quantity, SequenceNumber, Shares, Side, Username,
};

/// Client transport and framing errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing failure: {0}")]
    Codec(#[from] SessionCodecError),
}

/// The client's local mirror of its session
#[derive(Debug, Default)]
pub struct ClientState {
    /// whether the server has accepted a login on this connection
    authorized: bool,
    /// ids of this client's orders believed to rest in the book
    active_orders: BTreeSet<OrderId>,
    /// shares accumulated from trade reports
    shares: Shares,
    /// capital accumulated from trade reports
    capital: Capital,
}

impl ClientState {
    /// True while the server considers this connection authenticated
    pub fn is_logged_in(&self) -> bool {
        self.authorized
    }

    /// The ids of this client's resting orders
    pub fn active_orders(&self) -> &BTreeSet<OrderId> {
        &self.active_orders
    }

    /// True if any order is believed to rest
    pub fn has_active_order(&self) -> bool {
        !self.active_orders.is_empty()
    }

    /// Net shares traded on this connection
    pub fn shares(&self) -> Shares {
        self.shares
    }

    /// Net capital traded on this connection
    pub fn capital(&self) -> Capital {
        self.capital
    }

    /// Fold one server response into the local mirror
    pub fn apply(&mut self, response: &Response) {
        match *response {
            Response::Login { status } => {
                self.authorized = matches!(
                    status,
                    LoginStatus::Accepted | LoginStatus::AlreadyAuthorized
                );
            }
            Response::Logout { .. } => {
                // any logout reason ends the session and the book state
                self.authorized = false;
                self.active_orders.clear();
            }
            Response::Order { order_id, status } => {
                if status == Status::Rejected {
                    warn!("order rejected");
                    return;
                }
                if order_id != 0 {
                    self.active_orders.insert(order_id);
                }
            }
            Response::Cancel { order_id, status } => {
                if status == Status::Rejected {
                    warn!(order_id, "cancel rejected");
                    return;
                }
                self.active_orders.remove(&order_id);
            }
            Response::Replace {
                canceled,
                new_order_id,
                status,
            } => {
                if status == Status::Rejected {
                    warn!("replace rejected");
                    return;
                }
                if canceled != 0 {
                    self.active_orders.remove(&canceled);
                }
                if new_order_id != 0 {
                    self.active_orders.insert(new_order_id);
                }
            }
            Response::Purge { status } => {
                if status == Status::Rejected {
                    warn!("purge rejected");
                    return;
                }
                self.active_orders.clear();
            }
            Response::Trade {
                order_id,
                price,
                quantity,
                leaves_quantity,
                side,
            } => {
                let notional = quantity as Capital * price as Capital;
                match side {
                    Side::Buy => {
                        self.shares += quantity as Shares;
                        self.capital -= notional;
                    }
                    Side::Sell => {
                        self.shares -= quantity as Shares;
                        self.capital += notional;
                    }
                }
                if order_id != 0 && leaves_quantity == 0 {
                    self.active_orders.remove(&order_id);
                }
            }
        }
    }
}

/// A connection to the order-entry server
pub struct Client {
    stream: TcpStream,
    /// outbound sequence number, starts at 0, one per frame
    sequence: SequenceNumber,
    state: ClientState,
}

impl Client {
    /// Connect to the venue's order-entry port
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            sequence: 0,
            state: ClientState::default(),
        })
    }

    /// The local session mirror
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Frame and send one request
    pub async fn send(&mut self, request: Request) -> Result<(), ClientError> {
        let frame = request.encode(self.sequence);
        self.sequence += 1;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Send a login request
    pub async fn login(
        &mut self,
        username: &Username,
        password: &Password,
    ) -> Result<(), ClientError> {
        self.send(Request::Login {
            username: *username.as_bytes(),
            password: *password.as_bytes(),
        })
        .await
    }

    /// Send a logout request
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.send(Request::Logout).await
    }

    /// Submit a limit order
    pub async fn limit(
        &mut self,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Result<(), ClientError> {
        self.send(Request::Order {
            price,
            quantity,
            side,
        })
        .await
    }

    /// Submit a market order
    pub async fn market(&mut self, side: Side, quantity: Quantity) -> Result<(), ClientError> {
        self.send(Request::Order {
            price: MARKET_ORDER_PRICE,
            quantity,
            side,
        })
        .await
    }

    /// Cancel a resting order
    pub async fn cancel(&mut self, order_id: OrderId) -> Result<(), ClientError> {
        self.send(Request::Cancel { order_id }).await
    }

    /// Atomically cancel and re-enter an order
    pub async fn replace(
        &mut self,
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Result<(), ClientError> {
        self.send(Request::Replace {
            order_id,
            price,
            quantity,
            side,
        })
        .await
    }

    /// Cancel every order this account has resting
    pub async fn purge(&mut self) -> Result<(), ClientError> {
        self.send(Request::Purge).await
    }

    /// Read, decode, and fold in the next server response.
    ///
    /// A short read means the server closed the connection and surfaces
    /// as an I/O error.
    pub async fn next_response(&mut self) -> Result<ResponseFrame, ClientError> {
        let mut frame: Frame = [0u8; FRAME_LEN];
        self.stream.read_exact(&mut frame).await?;
        let decoded = Response::decode(&frame)?;
        self.state.apply(&decoded.response);
        Ok(decoded)
    }
}
