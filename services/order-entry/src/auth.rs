//! Credential directory for order-entry sessions
//!
//! Maps usernames to passwords and position accounts, and tracks the
//! connected flag that enforces at most one live session per account.
//! Accounts come from static configuration at startup; a duplicate
//! username there is a fatal error.

use matching_engine::accounts::AccountId;
use std::collections::BTreeMap;
use thiserror::Error;
use types::prelude::{Password, Username};

/// Authorizer construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("username already exists: {username}")]
    DuplicateUser { username: Username },
}

/// Server-side state for one configured user
#[derive(Debug)]
pub struct Credentials {
    /// the account's password
    pub password: Password,
    /// the position account in the book's registry
    pub account: AccountId,
    /// whether a session currently holds this account
    pub connected: bool,
}

/// Looks up and validates credentials for new sessions
#[derive(Debug, Default)]
pub struct Authorizer {
    accounts: BTreeMap<Username, Credentials>,
}

impl Authorizer {
    /// Create an empty authorizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no users are configured
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Register a user at startup
    pub fn add_user(
        &mut self,
        username: Username,
        password: Password,
        account: AccountId,
    ) -> Result<(), AuthError> {
        if self.accounts.contains_key(&username) {
            return Err(AuthError::DuplicateUser { username });
        }
        self.accounts.insert(
            username,
            Credentials {
                password,
                account,
                connected: false,
            },
        );
        Ok(())
    }

    /// True if the username exists
    pub fn has(&self, username: &Username) -> bool {
        self.accounts.contains_key(username)
    }

    /// Look up a user's server-side state
    pub fn get(&self, username: &Username) -> Option<&Credentials> {
        self.accounts.get(username)
    }

    /// Look up a user's server-side state mutably
    pub fn get_mut(&mut self, username: &Username) -> Option<&mut Credentials> {
        self.accounts.get_mut(username)
    }

    /// True if the username and password combination is valid
    pub fn is_valid(&self, username: &Username, password: &Password) -> bool {
        match self.accounts.get(username) {
            Some(credentials) => credentials.password == *password,
            None => false,
        }
    }
}
