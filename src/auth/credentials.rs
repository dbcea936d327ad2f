//! Stored credential formats
//!
//! Three formats can be found in the `schools.password_hash` column:
//! bcrypt (current), `hex(salt):hex(hash)` PBKDF2-HMAC-SHA256 and legacy
//! plaintext. Anything that is not bcrypt is upgraded after a successful
//! login.

use crate::error::{EvalError, Result};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// PBKDF2 iteration count of the `salt:hash` format
pub const PBKDF2_ITERATIONS: u32 = 100_000;
const PBKDF2_SALT_LEN: usize = 16;
const PBKDF2_KEY_LEN: usize = 32;

static PBKDF2_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]+:[0-9a-fA-F]+$").expect("valid PBKDF2 format regex")
});

/// Format of a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFormat {
    Bcrypt,
    Pbkdf2,
    Plaintext,
}

impl CredentialFormat {
    /// Classify a stored credential by its shape
    pub fn detect(stored: &str) -> Self {
        if ["$2a$", "$2b$", "$2y$"].iter().any(|p| stored.starts_with(p)) {
            CredentialFormat::Bcrypt
        } else if PBKDF2_FORMAT.is_match(stored) {
            CredentialFormat::Pbkdf2
        } else {
            CredentialFormat::Plaintext
        }
    }

    /// Legacy formats are rewritten as bcrypt after a successful login
    pub fn needs_upgrade(&self) -> bool {
        !matches!(self, CredentialFormat::Bcrypt)
    }
}

/// Check `password` against a stored credential of any supported format
///
/// bcrypt verification is CPU bound; async callers run it on a blocking
/// thread.
pub fn verify_credential(password: &str, stored: &str) -> Result<bool> {
    match CredentialFormat::detect(stored) {
        CredentialFormat::Bcrypt => Ok(bcrypt::verify(password, stored)?),
        CredentialFormat::Pbkdf2 => Ok(verify_pbkdf2(password, stored)),
        CredentialFormat::Plaintext => Ok(password.as_bytes().ct_eq(stored.as_bytes()).into()),
    }
}

/// Hash a password in the current (bcrypt) format
pub fn hash_credential(password: &str, cost: u32) -> Result<String> {
    if password.is_empty() {
        return Err(EvalError::Credential("password must not be empty".to_string()));
    }
    Ok(bcrypt::hash(password, cost)?)
}

/// Hash a password in the PBKDF2 `salt:hash` format
///
/// Only needed to produce fixtures and to migrate data between deployments;
/// new credentials use [`hash_credential`].
pub fn hash_pbkdf2(password: &str) -> String {
    let mut salt = [0u8; PBKDF2_SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive_pbkdf2(password, &salt);
    format!("{}:{}", hex::encode(salt), hex::encode(key))
}

fn derive_pbkdf2(password: &str, salt: &[u8]) -> [u8; PBKDF2_KEY_LEN] {
    let mut key = [0u8; PBKDF2_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn verify_pbkdf2(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once(':') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };
    if expected.len() != PBKDF2_KEY_LEN {
        return false;
    }
    let derived = derive_pbkdf2(password, &salt);
    derived.ct_eq(expected.as_slice()).into()
}
