//! Fixed-width credential types
//!
//! The login message carries a 4-byte ASCII username and a 12-byte ASCII
//! password, packed without a length prefix. Both types validate their
//! exact width and character set at construction so the codec can copy
//! them byte-for-byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Width of a username on the wire, in bytes
pub const USERNAME_LEN: usize = 4;

/// Width of a password on the wire, in bytes
pub const PASSWORD_LEN: usize = 12;

/// Credential construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("expected exactly {expected} characters, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("credentials must be printable ASCII")]
    NonAscii,
}

fn validate(bytes: &[u8], expected: usize) -> Result<(), CredentialError> {
    if bytes.len() != expected {
        return Err(CredentialError::BadLength {
            expected,
            got: bytes.len(),
        });
    }
    if !bytes.iter().all(|b| b.is_ascii_graphic()) {
        return Err(CredentialError::NonAscii);
    }
    Ok(())
}

/// A 4-byte ASCII account username
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username([u8; USERNAME_LEN]);

impl Username {
    /// Build a username from an exact-width ASCII string
    pub fn new(value: &str) -> Result<Self, CredentialError> {
        validate(value.as_bytes(), USERNAME_LEN)?;
        let mut bytes = [0u8; USERNAME_LEN];
        bytes.copy_from_slice(value.as_bytes());
        Ok(Self(bytes))
    }

    /// Build a username from raw wire bytes
    pub fn from_bytes(bytes: [u8; USERNAME_LEN]) -> Result<Self, CredentialError> {
        validate(&bytes, USERNAME_LEN)?;
        Ok(Self(bytes))
    }

    /// The packed wire representation
    pub fn as_bytes(&self) -> &[u8; USERNAME_LEN] {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Username {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.to_string()
    }
}

/// A 12-byte ASCII account password
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password([u8; PASSWORD_LEN]);

impl Password {
    /// Build a password from an exact-width ASCII string
    pub fn new(value: &str) -> Result<Self, CredentialError> {
        validate(value.as_bytes(), PASSWORD_LEN)?;
        let mut bytes = [0u8; PASSWORD_LEN];
        bytes.copy_from_slice(value.as_bytes());
        Ok(Self(bytes))
    }

    /// Build a password from raw wire bytes
    pub fn from_bytes(bytes: [u8; PASSWORD_LEN]) -> Result<Self, CredentialError> {
        validate(&bytes, PASSWORD_LEN)?;
        Ok(Self(bytes))
    }

    /// The packed wire representation
    pub fn as_bytes(&self) -> &[u8; PASSWORD_LEN] {
        &self.0
    }
}

// Keep passwords out of debug output and logs.
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password(****)")
    }
}

impl TryFrom<String> for Password {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Password> for String {
    fn from(value: Password) -> Self {
        value.0.iter().map(|&b| b as char).collect()
    }
}
