//! Venue configuration
//!
//! The server binary loads a JSON file naming the TCP port, the
//! multicast feed, and the account list. Credential widths are enforced
//! during deserialization, so a malformed username or password fails the
//! load; duplicate usernames fail later when the authorizer is built.
//!
//! ```json
//! {
//!   "port": 9000,
//!   "feed": { "group": "239.0.0.1", "port": 9001, "ttl": 4 },
//!   "accounts": [
//!     { "username": "AAAA", "password": "aaaaaaaaaaaa" }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use thiserror::Error;
use types::prelude::{Password, Username};

/// Configuration load errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One configured trading account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub username: Username,
    pub password: Password,
}

/// The multicast depth feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// multicast group address in [224.0.0.0, 239.255.255.255]
    pub group: Ipv4Addr,
    /// port the feed publishes to
    pub port: u16,
    /// optional hop limit for the datagrams
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// Top-level venue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// TCP port for order entry
    pub port: u16,
    /// the multicast depth feed
    pub feed: FeedConfig,
    /// the static account list
    pub accounts: Vec<AccountConfig>,
}

/// Load and parse a venue configuration file
pub fn load(path: &Path) -> Result<VenueConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
