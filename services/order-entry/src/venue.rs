//! The venue engine: one task owning all mutable state
//!
//! Every session task funnels its inbound frames into this engine over a
//! channel; the engine decodes, authorizes, dispatches to the book, and
//! fans the results back out as per-session responses on each session's
//! outbound queue and depth events on the multicast feed. Because a
//! single task owns the book, the accounts, and the publisher, request
//! processing is atomic with respect to message boundaries and the feed
//! sequence order always equals the logical book event order.

use crate::auth::{AuthError, Authorizer};
use crate::messages::{
    Frame, LoginStatus, LogoutReason, Request, Response, Status, MARKET_ORDER_PRICE, NO_ORDER_ID,
};
use market_data::messages::FeedMessage;
use market_data::publisher::Publisher;
use matching_engine::accounts::AccountId;
use matching_engine::book::LimitOrderBook;
use matching_engine::events::Fill;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use types::prelude::{OrderId, Password, Price, Quantity, SequenceNumber, Side, Username};

/// Identifies one TCP connection for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Operator commands driven from outside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// open the trading session on the feed
    StartSession,
    /// log out every client and close the trading session on the feed
    EndSession,
    /// erase the book and announce the wipe on the feed
    ClearBook,
}

/// Everything the engine task reacts to
#[derive(Debug)]
pub enum VenueEvent {
    /// a connection was accepted; `tx` is its outbound frame queue
    Connected {
        session: SessionId,
        tx: mpsc::UnboundedSender<Frame>,
    },
    /// a full frame arrived from a connection
    Frame { session: SessionId, frame: Frame },
    /// a connection hit EOF or a transport error
    Disconnected { session: SessionId },
    /// an operator command
    Admin(AdminCommand),
}

/// Per-connection state held by the engine
#[derive(Debug)]
struct Session {
    /// outbound sequence number, starts at 0, one per frame
    sequence: SequenceNumber,
    /// the logged-in user, `None` while unauthenticated
    account: Option<Username>,
    /// the connection's outbound frame queue
    tx: mpsc::UnboundedSender<Frame>,
}

/// The single-instrument venue: book, accounts, sessions, and feed
pub struct Venue {
    book: LimitOrderBook,
    authorizer: Authorizer,
    feed: Publisher,
    sessions: HashMap<SessionId, Session>,
    /// account → the session currently bound to it
    handlers: HashMap<AccountId, SessionId>,
}

impl Venue {
    /// Create a venue publishing depth events through `feed`
    pub fn new(feed: Publisher) -> Self {
        Self {
            book: LimitOrderBook::new(),
            authorizer: Authorizer::new(),
            feed,
            sessions: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a configured user: a position account plus credentials
    pub fn register_account(
        &mut self,
        username: Username,
        password: Password,
    ) -> Result<AccountId, AuthError> {
        let account = self.book.accounts_mut().create();
        self.authorizer.add_user(username, password, account)?;
        Ok(account)
    }

    /// The live order book
    pub fn book(&self) -> &LimitOrderBook {
        &self.book
    }

    /// The credential directory
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Number of open connections
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// React to one event
    pub fn handle_event(&mut self, event: VenueEvent) {
        match event {
            VenueEvent::Connected { session, tx } => self.connect(session, tx),
            VenueEvent::Frame { session, frame } => self.handle_frame(session, &frame),
            VenueEvent::Disconnected { session } => self.disconnect(session),
            VenueEvent::Admin(command) => self.admin(command),
        }
    }

    /// Track a freshly accepted connection
    pub fn connect(&mut self, session_id: SessionId, tx: mpsc::UnboundedSender<Frame>) {
        debug!(session = session_id.0, "session connected");
        self.sessions.insert(
            session_id,
            Session {
                sequence: 0,
                account: None,
                tx,
            },
        );
    }

    /// Release a connection that reached EOF or failed
    pub fn disconnect(&mut self, session_id: SessionId) {
        self.do_logout(session_id);
        self.sessions.remove(&session_id);
        debug!(session = session_id.0, "session disconnected");
    }

    /// Decode and dispatch one inbound frame. An unrecognized kind is a
    /// protocol violation: the session is logged out, told why, and
    /// closed.
    pub fn handle_frame(&mut self, session_id: SessionId, frame: &Frame) {
        // frames can still arrive from the read pump after a protocol
        // violation closed the session
        if !self.sessions.contains_key(&session_id) {
            return;
        }
        match Request::decode(frame) {
            Ok(decoded) => self.handle_request(session_id, decoded.request),
            Err(err) => {
                warn!(session = session_id.0, %err, "protocol violation");
                self.do_logout(session_id);
                self.send(
                    session_id,
                    Response::Logout {
                        reason: LogoutReason::ProtocolViolation,
                    },
                );
                // dropping the queue closes the connection after the
                // final response drains
                self.sessions.remove(&session_id);
            }
        }
    }

    /// Dispatch one decoded request
    pub fn handle_request(&mut self, session_id: SessionId, request: Request) {
        match request {
            Request::Login { username, password } => self.login(session_id, username, password),
            Request::Logout => self.logout(session_id),
            Request::Order {
                price,
                quantity,
                side,
            } => self.order(session_id, price, quantity, side),
            Request::Cancel { order_id } => self.cancel(session_id, order_id),
            Request::Replace {
                order_id,
                price,
                quantity,
                side,
            } => self.replace(session_id, order_id, price, quantity, side),
            Request::Purge => self.purge(session_id),
        }
    }

    /// Apply an operator command
    pub fn admin(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::StartSession => {
                info!("trading session opened");
                self.feed.publish(FeedMessage::StartOfSession);
            }
            AdminCommand::EndSession => {
                info!("trading session closed");
                let bound: Vec<SessionId> = self
                    .sessions
                    .iter()
                    .filter(|(_, session)| session.account.is_some())
                    .map(|(&id, _)| id)
                    .collect();
                for id in bound {
                    self.send(
                        id,
                        Response::Logout {
                            reason: LogoutReason::EndOfDay,
                        },
                    );
                    self.do_logout(id);
                }
                self.feed.publish(FeedMessage::EndOfSession);
            }
            AdminCommand::ClearBook => {
                info!("clearing the book");
                self.book.clear();
                self.feed.publish(FeedMessage::Clear);
            }
        }
    }

    // ── Request handlers ────────────────────────────────────────────

    fn login(
        &mut self,
        session_id: SessionId,
        username_bytes: [u8; types::creds::USERNAME_LEN],
        password_bytes: [u8; types::creds::PASSWORD_LEN],
    ) {
        if self.session_account(session_id).is_some() {
            // do not de-authorize an already bound session
            self.send_login(session_id, LoginStatus::AlreadyAuthorized);
            return;
        }
        let username = match Username::from_bytes(username_bytes) {
            Ok(username) => username,
            Err(_) => {
                self.send_login(session_id, LoginStatus::NotAuthorized);
                return;
            }
        };
        let password = match Password::from_bytes(password_bytes) {
            Ok(password) => password,
            Err(_) => {
                self.send_login(session_id, LoginStatus::NotAuthorized);
                return;
            }
        };
        if !self.authorizer.is_valid(&username, &password) {
            self.send_login(session_id, LoginStatus::NotAuthorized);
            return;
        }
        let Some(credentials) = self.authorizer.get_mut(&username) else {
            self.send_login(session_id, LoginStatus::NotAuthorized);
            return;
        };
        if credentials.connected {
            self.send_login(session_id, LoginStatus::SessionInUse);
            return;
        }
        credentials.connected = true;
        let account = credentials.account;
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.account = Some(username);
        }
        self.handlers.insert(account, session_id);
        info!(session = session_id.0, %username, "session authenticated");
        self.send_login(session_id, LoginStatus::Accepted);
    }

    fn logout(&mut self, session_id: SessionId) {
        if self.session_account(session_id).is_none() {
            self.send(
                session_id,
                Response::Logout {
                    reason: LogoutReason::ProtocolViolation,
                },
            );
            return;
        }
        self.do_logout(session_id);
        self.send(
            session_id,
            Response::Logout {
                reason: LogoutReason::UserRequested,
            },
        );
    }

    fn order(&mut self, session_id: SessionId, price: Price, quantity: Quantity, side: Side) {
        let Some(account) = self.authenticated_account(session_id) else {
            self.send(
                session_id,
                Response::Order {
                    order_id: NO_ORDER_ID,
                    status: Status::Rejected,
                },
            );
            return;
        };
        if price == MARKET_ORDER_PRICE {
            let fills = self.book.market(account, side, quantity);
            self.emit_fills(&fills);
            self.send(
                session_id,
                Response::Order {
                    order_id: NO_ORDER_ID,
                    status: Status::Accepted,
                },
            );
        } else {
            let result = self.book.limit(account, side, quantity, price);
            self.emit_fills(&result.fills);
            if result.rested() {
                self.publish_resting(result.uid, price, side);
            }
            self.send(
                session_id,
                Response::Order {
                    order_id: result.uid,
                    status: Status::Accepted,
                },
            );
        }
    }

    fn cancel(&mut self, session_id: SessionId, order_id: OrderId) {
        let rejected = Response::Cancel {
            order_id,
            status: Status::Rejected,
        };
        let Some(account) = self.authenticated_account(session_id) else {
            self.send(session_id, rejected);
            return;
        };
        if self.book.get(order_id).map(|o| o.account) != Some(account) {
            // unknown order or another account's order
            self.send(session_id, rejected);
            return;
        }
        if self.book.cancel(order_id).is_err() {
            self.send(session_id, rejected);
            return;
        }
        self.feed.publish(FeedMessage::DeleteOrder { uid: order_id });
        self.send(
            session_id,
            Response::Cancel {
                order_id,
                status: Status::Accepted,
            },
        );
    }

    fn replace(
        &mut self,
        session_id: SessionId,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    ) {
        let rejected = Response::Replace {
            canceled: order_id,
            new_order_id: NO_ORDER_ID,
            status: Status::Rejected,
        };
        let Some(account) = self.authenticated_account(session_id) else {
            self.send(session_id, rejected);
            return;
        };
        // the old order may have filled already; that is a legal replace
        let mut canceled = NO_ORDER_ID;
        if self.book.has(order_id) {
            if self.book.get(order_id).map(|o| o.account) != Some(account) {
                self.send(session_id, rejected);
                return;
            }
            if self.book.cancel(order_id).is_ok() {
                self.feed.publish(FeedMessage::DeleteOrder { uid: order_id });
                canceled = order_id;
            }
        }
        let result = self.book.limit(account, side, quantity, price);
        self.emit_fills(&result.fills);
        if result.rested() {
            self.publish_resting(result.uid, price, side);
        }
        self.send(
            session_id,
            Response::Replace {
                canceled,
                new_order_id: result.uid,
                status: Status::Accepted,
            },
        );
    }

    fn purge(&mut self, session_id: SessionId) {
        let Some(account) = self.authenticated_account(session_id) else {
            self.send(
                session_id,
                Response::Purge {
                    status: Status::Rejected,
                },
            );
            return;
        };
        // cancel the first still-present order until the set drains;
        // each cancel mutates the set being walked
        loop {
            let Some(&uid) = self.book.accounts().get(account).orders.first() else {
                break;
            };
            if self.book.cancel(uid).is_err() {
                break;
            }
            self.feed.publish(FeedMessage::DeleteOrder { uid });
        }
        self.send(
            session_id,
            Response::Purge {
                status: Status::Accepted,
            },
        );
    }

    // ── Fan-out ─────────────────────────────────────────────────────

    /// Report fills to the two owning sessions and the depth feed.
    ///
    /// The maker's report carries the maker's uid and leaves; the
    /// taker's carries the taker's own uid (0 for a market order). The
    /// feed trade names the maker's uid and the aggressor's side.
    fn emit_fills(&mut self, fills: &[Fill]) {
        for fill in fills {
            if let Some(&maker_session) = self.handlers.get(&fill.maker_account) {
                self.send(
                    maker_session,
                    Response::Trade {
                        order_id: fill.maker,
                        price: fill.price,
                        quantity: fill.quantity,
                        leaves_quantity: fill.maker_leaves,
                        side: fill.maker_side(),
                    },
                );
            }
            if let Some(&taker_session) = self.handlers.get(&fill.taker_account) {
                self.send(
                    taker_session,
                    Response::Trade {
                        order_id: fill.taker.unwrap_or(NO_ORDER_ID),
                        price: fill.price,
                        quantity: fill.quantity,
                        leaves_quantity: fill.taker_leaves,
                        side: fill.taker_side,
                    },
                );
            }
            self.feed.publish(FeedMessage::Trade {
                uid: fill.maker,
                price: fill.price,
                quantity: fill.quantity,
                side: fill.taker_side,
            });
        }
    }

    /// Announce a rested order with its post-crossing residual quantity
    fn publish_resting(&mut self, uid: OrderId, price: Price, side: Side) {
        let leaves = self.book.get(uid).map(|o| o.quantity).unwrap_or(0);
        self.feed.publish(FeedMessage::AddOrder {
            uid,
            price,
            quantity: leaves,
            side,
        });
    }

    // ── Session plumbing ────────────────────────────────────────────

    fn session_account(&self, session_id: SessionId) -> Option<&Username> {
        self.sessions
            .get(&session_id)
            .and_then(|session| session.account.as_ref())
    }

    fn authenticated_account(&self, session_id: SessionId) -> Option<AccountId> {
        let username = self.session_account(session_id)?;
        self.authorizer.get(username).map(|c| c.account)
    }

    fn do_logout(&mut self, session_id: SessionId) {
        let username = match self.sessions.get_mut(&session_id) {
            Some(session) => session.account.take(),
            None => None,
        };
        if let Some(username) = username {
            if let Some(credentials) = self.authorizer.get_mut(&username) {
                credentials.connected = false;
                self.handlers.remove(&credentials.account);
            }
            info!(session = session_id.0, %username, "session logged out");
        }
    }

    fn send_login(&mut self, session_id: SessionId, status: LoginStatus) {
        self.send(session_id, Response::Login { status });
    }

    /// Frame a response with the session's next sequence number and
    /// queue it on the connection's writer.
    fn send(&mut self, session_id: SessionId, response: Response) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };
        let frame = response.encode(session.sequence);
        session.sequence += 1;
        if session.tx.send(frame).is_err() {
            debug!(session = session_id.0, "writer gone; dropping frame");
        }
    }
}

/// Drive the venue until the event channel closes
pub async fn run(mut venue: Venue, mut events: mpsc::UnboundedReceiver<VenueEvent>) {
    while let Some(event) = events.recv().await {
        venue.handle_event(event);
    }
    info!("venue event channel closed; engine stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ResponseFrame;
    use market_data::messages::Packet;

    fn fixed_clock() -> u64 {
        1_700_000_000_000_000_000
    }

    struct Harness {
        venue: Venue,
        feed_rx: mpsc::UnboundedReceiver<Packet>,
        clients: HashMap<u64, mpsc::UnboundedReceiver<Frame>>,
    }

    impl Harness {
        fn new(users: &[(&str, &str)]) -> Self {
            let (feed_tx, feed_rx) = mpsc::unbounded_channel();
            let mut venue = Venue::new(Publisher::new(feed_tx, fixed_clock));
            for (name, pass) in users {
                venue
                    .register_account(
                        Username::new(name).unwrap(),
                        Password::new(pass).unwrap(),
                    )
                    .unwrap();
            }
            Self {
                venue,
                feed_rx,
                clients: HashMap::new(),
            }
        }

        fn connect(&mut self, id: u64) {
            let (tx, rx) = mpsc::unbounded_channel();
            self.venue.connect(SessionId(id), tx);
            self.clients.insert(id, rx);
        }

        fn request(&mut self, id: u64, request: Request) {
            let frame = request.encode(0);
            self.venue.handle_frame(SessionId(id), &frame);
        }

        fn login(&mut self, id: u64, name: &str, pass: &str) {
            let mut username = [0u8; 4];
            username.copy_from_slice(name.as_bytes());
            let mut password = [0u8; 12];
            password.copy_from_slice(pass.as_bytes());
            self.request(id, Request::Login { username, password });
        }

        fn responses(&mut self, id: u64) -> Vec<ResponseFrame> {
            let rx = self.clients.get_mut(&id).unwrap();
            let mut frames = Vec::new();
            while let Ok(frame) = rx.try_recv() {
                frames.push(Response::decode(&frame).unwrap());
            }
            frames
        }

        fn feed(&mut self) -> Vec<FeedMessage> {
            let mut messages = Vec::new();
            while let Ok(packet) = self.feed_rx.try_recv() {
                messages.push(FeedMessage::decode(&packet).unwrap().message);
            }
            messages
        }
    }

    const USER_A: (&str, &str) = ("AAAA", "aaaaaaaaaaaa");
    const USER_B: (&str, &str) = ("BBBB", "bbbbbbbbbbbb");

    #[test]
    fn test_login_accepted_then_already_authorized() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Login {
                status: LoginStatus::Accepted
            }
        );
        assert_eq!(
            responses[1].response,
            Response::Login {
                status: LoginStatus::AlreadyAuthorized
            }
        );
    }

    #[test]
    fn test_login_wrong_password() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "xxxxxxxxxxxx");
        assert_eq!(
            h.responses(1)[0].response,
            Response::Login {
                status: LoginStatus::NotAuthorized
            }
        );
    }

    #[test]
    fn test_second_session_sees_session_in_use() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "AAAA", "aaaaaaaaaaaa");
        assert_eq!(
            h.responses(2)[0].response,
            Response::Login {
                status: LoginStatus::SessionInUse
            }
        );

        // after A logs out, B may bind the account
        h.request(1, Request::Logout);
        h.login(2, "AAAA", "aaaaaaaaaaaa");
        assert_eq!(
            h.responses(2)[0].response,
            Response::Login {
                status: LoginStatus::Accepted
            }
        );
        assert_eq!(
            h.responses(1)[1].response,
            Response::Logout {
                reason: LogoutReason::UserRequested
            }
        );
    }

    #[test]
    fn test_unauthenticated_operations_rejected() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.request(1, Request::Cancel { order_id: 5 });
        h.request(1, Request::Purge);
        h.request(1, Request::Logout);

        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Order {
                order_id: 0,
                status: Status::Rejected
            }
        );
        assert_eq!(
            responses[1].response,
            Response::Cancel {
                order_id: 5,
                status: Status::Rejected
            }
        );
        assert_eq!(
            responses[2].response,
            Response::Purge {
                status: Status::Rejected
            }
        );
        assert_eq!(
            responses[3].response,
            Response::Logout {
                reason: LogoutReason::ProtocolViolation
            }
        );
    }

    #[test]
    fn test_outbound_sequences_count_from_zero() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.request(1, Request::Cancel { order_id: 1 });
        h.request(1, Request::Purge);

        let responses = h.responses(1);
        let sequences: Vec<u32> = responses.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_trades_fan_out_to_both_sessions_and_feed() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        h.responses(1);
        h.responses(2);
        h.feed();

        // A rests a buy, B crosses it with a smaller sell
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 100,
                side: Side::Buy,
            },
        );
        h.request(
            2,
            Request::Order {
                price: 100,
                quantity: 60,
                side: Side::Sell,
            },
        );

        // maker session: order response, then its trade report
        let maker = h.responses(1);
        assert_eq!(
            maker[0].response,
            Response::Order {
                order_id: 1,
                status: Status::Accepted
            }
        );
        assert_eq!(
            maker[1].response,
            Response::Trade {
                order_id: 1,
                price: 100,
                quantity: 60,
                leaves_quantity: 40,
                side: Side::Buy,
            }
        );

        // taker session: trade report precedes the order response
        let taker = h.responses(2);
        assert_eq!(
            taker[0].response,
            Response::Trade {
                order_id: 2,
                price: 100,
                quantity: 60,
                leaves_quantity: 0,
                side: Side::Sell,
            }
        );
        assert_eq!(
            taker[1].response,
            Response::Order {
                order_id: 0,
                status: Status::Accepted
            }
        );

        // feed: the add for the resting buy, then the trade
        let feed = h.feed();
        assert_eq!(
            feed,
            vec![
                FeedMessage::AddOrder {
                    uid: 1,
                    price: 100,
                    quantity: 100,
                    side: Side::Buy
                },
                FeedMessage::Trade {
                    uid: 1,
                    price: 100,
                    quantity: 60,
                    side: Side::Sell
                },
            ]
        );

        // positions moved symmetrically
        let book = h.venue.book();
        let accounts: Vec<_> = book.accounts().iter().map(|(_, a)| a.clone()).collect();
        assert_eq!(accounts[0].shares, 60);
        assert_eq!(accounts[0].capital, -6000);
        assert_eq!(accounts[1].shares, -60);
        assert_eq!(accounts[1].capital, 6000);
    }

    #[test]
    fn test_market_order_reports_zero_uid() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 50,
                side: Side::Sell,
            },
        );
        h.responses(1);
        h.responses(2);

        h.request(
            2,
            Request::Order {
                price: MARKET_ORDER_PRICE,
                quantity: 20,
                side: Side::Buy,
            },
        );
        let taker = h.responses(2);
        assert_eq!(
            taker[0].response,
            Response::Trade {
                order_id: 0,
                price: 100,
                quantity: 20,
                leaves_quantity: 0,
                side: Side::Buy,
            }
        );
        assert_eq!(
            taker[1].response,
            Response::Order {
                order_id: 0,
                status: Status::Accepted
            }
        );
    }

    #[test]
    fn test_cancel_ownership_enforced() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.responses(1);
        h.responses(2);

        // B may not cancel A's order
        h.request(2, Request::Cancel { order_id: 1 });
        assert_eq!(
            h.responses(2)[0].response,
            Response::Cancel {
                order_id: 1,
                status: Status::Rejected
            }
        );
        assert!(h.venue.book().has(1));

        // A may
        h.request(1, Request::Cancel { order_id: 1 });
        assert_eq!(
            h.responses(1)[0].response,
            Response::Cancel {
                order_id: 1,
                status: Status::Accepted
            }
        );
        assert!(!h.venue.book().has(1));
    }

    #[test]
    fn test_replace_of_live_order() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.responses(1);
        h.feed();

        h.request(
            1,
            Request::Replace {
                order_id: 1,
                price: 101,
                quantity: 20,
                side: Side::Buy,
            },
        );
        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Replace {
                canceled: 1,
                new_order_id: 2,
                status: Status::Accepted
            }
        );
        assert!(!h.venue.book().has(1));
        assert_eq!(h.venue.book().get(2).map(|o| o.quantity), Some(20));
        assert_eq!(
            h.feed(),
            vec![
                FeedMessage::DeleteOrder { uid: 1 },
                FeedMessage::AddOrder {
                    uid: 2,
                    price: 101,
                    quantity: 20,
                    side: Side::Buy
                },
            ]
        );
    }

    #[test]
    fn test_replace_of_filled_order_reports_zero_canceled() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        // B takes the whole order; uid 1 is gone
        h.request(
            2,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Sell,
            },
        );
        h.responses(1);
        h.responses(2);

        h.request(
            1,
            Request::Replace {
                order_id: 1,
                price: 99,
                quantity: 5,
                side: Side::Buy,
            },
        );
        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Replace {
                canceled: 0,
                new_order_id: 3,
                status: Status::Accepted
            }
        );
    }

    #[test]
    fn test_replace_ownership_mismatch_does_nothing() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.responses(1);
        h.responses(2);

        h.request(
            2,
            Request::Replace {
                order_id: 1,
                price: 101,
                quantity: 20,
                side: Side::Buy,
            },
        );
        assert_eq!(
            h.responses(2)[0].response,
            Response::Replace {
                canceled: 1,
                new_order_id: 0,
                status: Status::Rejected
            }
        );
        // untouched
        assert_eq!(h.venue.book().get(1).map(|o| o.quantity), Some(10));
        assert_eq!(h.venue.book().count(), 1);
    }

    #[test]
    fn test_purge_cancels_every_owned_order() {
        let mut h = Harness::new(&[USER_A, USER_B]);
        h.connect(1);
        h.connect(2);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.login(2, "BBBB", "bbbbbbbbbbbb");
        for price in [98, 99, 100] {
            h.request(
                1,
                Request::Order {
                    price,
                    quantity: 10,
                    side: Side::Buy,
                },
            );
        }
        h.request(
            2,
            Request::Order {
                price: 105,
                quantity: 10,
                side: Side::Sell,
            },
        );
        h.responses(1);
        h.responses(2);
        h.feed();

        h.request(1, Request::Purge);
        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Purge {
                status: Status::Accepted
            }
        );
        // only A's orders are gone
        assert_eq!(h.venue.book().count_buy(), 0);
        assert_eq!(h.venue.book().count_sell(), 1);
        assert_eq!(h.feed().len(), 3); // three deletes
    }

    #[test]
    fn test_unknown_kind_is_protocol_violation_and_closes() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.responses(1);

        let mut frame = Request::Logout.encode(0);
        frame[2] = b'z';
        h.venue.handle_frame(SessionId(1), &frame);

        let responses = h.responses(1);
        assert_eq!(
            responses[0].response,
            Response::Logout {
                reason: LogoutReason::ProtocolViolation
            }
        );
        assert_eq!(h.venue.session_count(), 0);
        // the account is free again
        assert!(
            !h.venue
                .authorizer()
                .get(&Username::new("AAAA").unwrap())
                .unwrap()
                .connected
        );
    }

    #[test]
    fn test_disconnect_releases_the_account() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.venue.disconnect(SessionId(1));
        assert_eq!(h.venue.session_count(), 0);

        h.connect(2);
        h.login(2, "AAAA", "aaaaaaaaaaaa");
        assert_eq!(
            h.responses(2)[0].response,
            Response::Login {
                status: LoginStatus::Accepted
            }
        );
    }

    #[test]
    fn test_end_session_logs_out_clients_with_end_of_day() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.responses(1);
        h.feed();

        h.venue.admin(AdminCommand::EndSession);
        assert_eq!(
            h.responses(1)[0].response,
            Response::Logout {
                reason: LogoutReason::EndOfDay
            }
        );
        assert_eq!(h.feed(), vec![FeedMessage::EndOfSession]);
    }

    #[test]
    fn test_admin_clear_empties_book_and_feed_announces() {
        let mut h = Harness::new(&[USER_A]);
        h.connect(1);
        h.login(1, "AAAA", "aaaaaaaaaaaa");
        h.request(
            1,
            Request::Order {
                price: 100,
                quantity: 10,
                side: Side::Buy,
            },
        );
        h.feed();

        h.venue.admin(AdminCommand::ClearBook);
        assert_eq!(h.venue.book().count(), 0);
        assert_eq!(h.feed(), vec![FeedMessage::Clear]);
    }
}
