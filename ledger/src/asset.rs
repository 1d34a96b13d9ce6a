//! # Asset Definitions
//!
//! Defines the asset abstraction for the KEEL ledger. Every instrument that
//! can be held in custody — tokenized money market funds, short-duration
//! notes, tokenized deposits — is represented as an [`AssetInfo`] with a
//! unique [`AssetId`].
//!
//! Asset IDs are deterministic BLAKE3 hashes of the asset's canonical
//! properties (name, symbol, asset class, issuer). The same asset always
//! gets the same ID regardless of when or where it's registered — no
//! central numbering authority, no coordination required.
//!
//! The property that makes this module interesting is [`AssetInfo::min_holding`]:
//! issuers of regulated instruments routinely require that any nonzero
//! position stays above a floor. The ledger enforces that floor on every
//! transfer, which is exactly what makes naive withdrawal flows fragile
//! (see the custody crate).
//!
//! ## Pre-defined Assets
//!
//! The crate ships factory functions for the instruments we custody on day
//! one: [`usd_money_market()`] and [`short_duration_note()`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::AccountId;

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// A unique, content-addressed identifier for an asset type.
///
/// Computed as `BLAKE3(name || symbol || class_tag || issuer_digest)`.
/// Two assets with identical properties will always produce the same ID,
/// making this a natural deduplication key across environments.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId([u8; 32]);

impl AssetId {
    /// Creates an `AssetId` from a raw 32-byte hash.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded asset ID.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded asset ID.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives an `AssetId` from the canonical asset properties.
    ///
    /// The hash input is the concatenation of:
    /// - `name` (UTF-8 bytes)
    /// - `0x00` separator
    /// - `symbol` (UTF-8 bytes)
    /// - `0x00` separator
    /// - `class_tag` (single byte discriminant)
    /// - `0x00` separator
    /// - `issuer` (the issuer account's 32-byte digest)
    ///
    /// The separator bytes prevent ambiguity when one field's suffix
    /// matches another field's prefix.
    pub fn derive(name: &str, symbol: &str, class: &AssetClass, issuer: &AccountId) -> Self {
        let mut preimage = Vec::with_capacity(name.len() + symbol.len() + 32 + 8);
        preimage.extend_from_slice(name.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(symbol.as_bytes());
        preimage.push(0x00);
        preimage.push(class.discriminant());
        preimage.push(0x00);
        preimage.extend_from_slice(issuer.digest());

        let digest = blake3::hash(&preimage);
        Self(*digest.as_bytes())
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for AssetId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// Serde helper: serialize HashMap<AssetId, V> with hex-string keys
// ---------------------------------------------------------------------------

/// Serde helper module for serializing/deserializing `HashMap<AssetId, V>`
/// as a JSON object with hex-encoded string keys.
///
/// JSON requires map keys to be strings, but `AssetId` wraps `[u8; 32]`
/// which serde would serialize as an array. This module converts keys
/// to/from their hex representation so the map serializes correctly.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct MyStruct {
///     #[serde(with = "crate::asset::asset_id_map")]
///     cleared: HashMap<AssetId, SomeValue>,
/// }
/// ```
pub mod asset_id_map {
    use super::AssetId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<V, S>(map: &HashMap<AssetId, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut ser_map = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            ser_map.serialize_entry(&key.to_hex(), value)?;
        }
        ser_map.end()
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<AssetId, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let string_map: HashMap<String, V> = HashMap::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(key, value)| {
                AssetId::from_hex(&key)
                    .map(|id| (id, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// AssetClass
// ---------------------------------------------------------------------------

/// Classification of an asset by the instrument it tokenizes.
///
/// This affects how the asset is treated operationally: fund shares settle
/// against the fund's transfer agent, notes carry maturity processing, and
/// deposits reconcile against the partner bank's statements.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Tokenized money market fund shares — daily liquidity, stable NAV.
    MoneyMarketFund,

    /// Tokenized short-duration credit note (commercial paper, structured
    /// notes with a fixed maturity).
    Note,

    /// Tokenized deposit claim against a partner bank.
    Deposit,

    /// Anything else. The `String` is a free-form class descriptor
    /// (e.g., "real_estate", "equity", "commodity").
    Other(String),
}

impl AssetClass {
    /// Returns a single-byte discriminant for use in hash derivation.
    ///
    /// These values are part of the ID derivation and must never change
    /// once assets are in circulation. Adding new variants is fine — just
    /// append new discriminant values.
    pub fn discriminant(&self) -> u8 {
        match self {
            AssetClass::MoneyMarketFund => 0x01,
            AssetClass::Note => 0x02,
            AssetClass::Deposit => 0x03,
            AssetClass::Other(_) => 0x04,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::MoneyMarketFund => write!(f, "MoneyMarketFund"),
            AssetClass::Note => write!(f, "Note"),
            AssetClass::Deposit => write!(f, "Deposit"),
            AssetClass::Other(class) => write!(f, "Other({})", class),
        }
    }
}

// ---------------------------------------------------------------------------
// AssetInfo
// ---------------------------------------------------------------------------

/// Complete metadata for a registered asset.
///
/// This is the canonical record for an asset type on the KEEL ledger.
/// It is kept by the ledger's registry and referenced by [`AssetId`]
/// everywhere else. Supply is not part of this record — the ledger's
/// per-asset book tracks issuance as it happens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Content-addressed identifier derived from this asset's properties.
    pub id: AssetId,

    /// Human-readable asset name (e.g., "KEEL USD Money Market Fund").
    pub name: String,

    /// Trading symbol / ticker (e.g., "KMMF").
    pub symbol: String,

    /// Number of decimal places for display purposes.
    ///
    /// An asset with `decimals = 6` and raw amount `1_000_000` displays as
    /// `1.000000`. The ledger never performs division — this is purely
    /// for UI rendering.
    pub decimals: u8,

    /// Minimum post-transfer holding in smallest units.
    ///
    /// After any debit, the payer's residual balance must be exactly zero
    /// or at least this value. Every credit is held to the same floor. A
    /// value of `0` disables the rule. This is the issuer's registered
    /// policy at listing time; the ledger's live value can be moved later
    /// by the issuer without re-registering.
    pub min_holding: u64,

    /// The account of the entity that issued this asset.
    ///
    /// For platform-native instruments this is the well-known system
    /// account (see [`system_issuer()`]). For third-party instruments it
    /// is the licensed issuer's onboarded account.
    pub issuer: AccountId,

    /// The instrument classification for this asset.
    pub class: AssetClass,
}

// ---------------------------------------------------------------------------
// Asset Factory
// ---------------------------------------------------------------------------

/// Factory for creating [`AssetInfo`] instances with derived IDs.
///
/// This is the only correct way to create an asset definition — it
/// ensures the ID is always consistent with the asset's properties.
pub struct Asset;

impl Asset {
    /// Creates a new [`AssetInfo`] with a deterministically derived [`AssetId`].
    ///
    /// The `min_holding` is initialized to `0` (no floor). Use
    /// [`Asset::with_min_holding`] for instruments that enforce one.
    ///
    /// # Arguments
    ///
    /// * `name` — Human-readable name (e.g., "KEEL USD Money Market Fund")
    /// * `symbol` — Ticker symbol (e.g., "KMMF")
    /// * `decimals` — Display decimal places (e.g., 6 for fund shares)
    /// * `class` — Instrument classification
    /// * `issuer` — Account of the authorized issuer
    pub fn new(
        name: &str,
        symbol: &str,
        decimals: u8,
        class: AssetClass,
        issuer: AccountId,
    ) -> AssetInfo {
        let id = AssetId::derive(name, symbol, &class, &issuer);

        AssetInfo {
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            min_holding: 0,
            issuer,
            class,
        }
    }

    /// Creates a new [`AssetInfo`] with an explicit minimum holding.
    ///
    /// Use this for instruments whose issuer requires every nonzero
    /// position to stay above a floor (common for regulated fund shares).
    pub fn with_min_holding(
        name: &str,
        symbol: &str,
        decimals: u8,
        class: AssetClass,
        issuer: AccountId,
        min_holding: u64,
    ) -> AssetInfo {
        let mut info = Self::new(name, symbol, decimals, class, issuer);
        info.min_holding = min_holding;
        info
    }
}

// ---------------------------------------------------------------------------
// Pre-defined Asset Constants
// ---------------------------------------------------------------------------

/// System issuer account used for platform-native assets.
///
/// This account is not backed by a real onboarding record — assets issued
/// by it are created by the platform operator, not by any external entity.
pub fn system_issuer() -> AccountId {
    AccountId::from_digest([0u8; 32])
}

/// KEEL USD Money Market Fund — tokenized shares of a USD money market fund.
///
/// 6 decimal places. This is the workhorse instrument for KEEL's custody
/// business: clients park settlement cash here between trades. The fund's
/// transfer agent requires nonzero positions to hold at least 50 shares,
/// so `min_holding` is 50_000_000 smallest units.
pub fn usd_money_market() -> AssetInfo {
    Asset::with_min_holding(
        "KEEL USD Money Market Fund",
        "KMMF",
        6,
        AssetClass::MoneyMarketFund,
        system_issuer(),
        50_000_000,
    )
}

/// KEEL Short Duration Note — tokenized 90-day credit note.
///
/// 6 decimal places. Carries a 10-note minimum position per the issuing
/// desk's placement terms, so `min_holding` is 10_000_000 smallest units.
pub fn short_duration_note() -> AssetInfo {
    Asset::with_min_holding(
        "KEEL Short Duration Note",
        "KSDN",
        6,
        AssetClass::Note,
        system_issuer(),
        10_000_000,
    )
}

// ---------------------------------------------------------------------------
// Convenience: AssetId constants for pre-defined assets
// ---------------------------------------------------------------------------

/// Returns the [`AssetId`] for the KEEL USD Money Market Fund.
pub fn money_market_id() -> AssetId {
    usd_money_market().id
}

/// Returns the [`AssetId`] for the KEEL Short Duration Note.
pub fn note_id() -> AssetId {
    short_duration_note().id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
