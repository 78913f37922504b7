//! Voter identity: an opaque, unverified deduplication key.
//!
//! Identities come in two shapes: a client-held session token, or a
//! pseudonym derived from an email address. Neither is authenticated; the
//! only guarantee is that the same input always yields the same key.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{Error, Result};

const MAX_TOKEN_LEN: usize = 256;
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
  /// Mint a fresh random session token.
  pub fn generate() -> Self {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self(URL_SAFE_NO_PAD.encode(bytes))
  }

  /// Accept a session token previously handed to a client.
  pub fn session(token: &str) -> Result<Self> {
    let token = token.trim();
    if token.is_empty() {
      return Err(Error::validation("session token must not be empty"));
    }
    if token.len() > MAX_TOKEN_LEN || token.chars().any(char::is_whitespace) {
      return Err(Error::validation("malformed session token"));
    }
    Ok(Self(token.to_owned()))
  }

  /// Derive a pseudonymous identity from an email address.
  ///
  /// The address is trimmed and lowercased before hashing, so case variants
  /// of the same mailbox collapse to one voter.
  pub fn email(address: &str) -> Result<Self> {
    let normalized = address.trim().to_lowercase();
    if !is_valid_email(&normalized) {
      return Err(Error::validation("invalid email format"));
    }
    let digest = Sha256::digest(normalized.as_bytes());
    Ok(Self(format!("email:{}", hex::encode(digest))))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
fn is_valid_email(s: &str) -> bool {
  if s.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = s.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}
