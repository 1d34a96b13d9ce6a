//! # Ledger Account Addresses
//!
//! An [`AccountId`] is the address of a holder on the asset ledger. It is
//! derived from opaque seed material (in production: the holder's onboarding
//! record) via BLAKE3 hashing and Bech32 encoding:
//!
//! ```text
//! seed bytes
//!     -> BLAKE3(seed) -> 32 bytes
//!     -> Bech32("keel", digest) -> keel1qw508d6qe...
//! ```
//!
//! The `keel` human-readable prefix (HRP) makes addresses immediately
//! recognizable. Bech32 encoding provides built-in error detection — it
//! can detect up to 4 character errors — which matters when operators are
//! copy-pasting recipient addresses into a withdrawal console.
//!
//! The ledger itself treats addresses as opaque 32-byte keys. Nothing about
//! an account lives in this type: balances, clearance, and roles are all
//! looked up elsewhere, fresh, every time.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ACCOUNT_HRP, HASH_OUTPUT_LENGTH};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing account addresses.
#[derive(Debug, Error)]
pub enum AccountIdError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A ledger account address — the primary identifier for holders, vaults,
/// and recipients across KEEL.
///
/// Internally a 32-byte BLAKE3 digest. The Bech32 address is computed
/// on-the-fly from the digest.
///
/// # Examples
///
/// ```
/// use keel_ledger::account::AccountId;
///
/// let id = AccountId::from_seed(b"treasury-ops");
/// let address = id.to_address();
/// assert!(address.starts_with("keel1"));
///
/// let recovered = AccountId::from_address(&address).unwrap();
/// assert_eq!(id, recovered);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    /// BLAKE3 digest of the seed material (32 bytes). This is what gets
    /// Bech32-encoded into the address string.
    digest: [u8; 32],
}

impl AccountId {
    /// Creates an account identifier from arbitrary seed material.
    ///
    /// Hashing gives a consistent 32-byte identifier regardless of what the
    /// onboarding system feeds in, and deterministic seeds give tests and
    /// demos recognizable, stable addresses.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = blake3::hash(seed);
        Self {
            digest: *digest.as_bytes(),
        }
    }

    /// Creates an account identifier from a raw 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self { digest }
    }

    /// Generates a fresh random account identifier.
    ///
    /// Intended for tests and demos that need throwaway third parties
    /// (donors, bystanders) without inventing seed strings for them.
    pub fn random() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Encodes this account as a Bech32 address string.
    ///
    /// The output has the form `keel1<bech32-encoded-digest>` and includes
    /// a checksum for error detection.
    pub fn to_address(&self) -> String {
        let hrp = Hrp::parse(ACCOUNT_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.digest)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parses a Bech32-encoded KEEL address back into an [`AccountId`].
    ///
    /// Validates the HRP, checksum, and data length.
    pub fn from_address(addr: &str) -> Result<Self, AccountIdError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AccountIdError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ACCOUNT_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AccountIdError::InvalidHrp {
                expected: ACCOUNT_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        if data.len() != HASH_OUTPUT_LENGTH {
            return Err(AccountIdError::InvalidDataLength {
                expected: HASH_OUTPUT_LENGTH,
                got: data.len(),
            });
        }

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&data);

        Ok(Self { digest })
    }

    /// Returns the raw 32-byte digest underlying this address.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_address())
        } else {
            serializer.serialize_bytes(&self.digest)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            AccountId::from_address(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != HASH_OUTPUT_LENGTH {
                return Err(serde::de::Error::custom(format!(
                    "expected {}-byte digest, got {}",
                    HASH_OUTPUT_LENGTH,
                    bytes.len()
                )));
            }
            let mut digest = [0u8; 32];
            digest.copy_from_slice(&bytes);
            Ok(AccountId { digest })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
