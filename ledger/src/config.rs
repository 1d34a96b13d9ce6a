//! # Ledger Configuration & Constants
//!
//! Every magic number in KEEL lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values are shared between the ledger model and the custody layer.
//! Changing the address prefix or the identity scheme after accounts exist
//! is somewhere between "difficult" and "career-ending", so choose wisely.

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Human-readable prefix for all KEEL account addresses.
/// Bech32 HRP — short enough to type, long enough to be unambiguous.
pub const ACCOUNT_HRP: &str = "keel";

/// The hash function behind account and asset identifiers.
/// BLAKE3 is faster than SHA-256 on every platform that matters, and it's
/// a proper cryptographic hash — not a toy.
pub const PRIMARY_HASH_FUNCTION: &str = "BLAKE3";

/// Digest length in bytes. BLAKE3 produces 32-byte outputs.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol fingerprint for identification in logs and handshakes.
/// Uniquely identifies the KEEL product family and build generation.
pub const PROTOCOL_FINGERPRINT: &str = "ALAS-KEEL-2026";

/// Major version — bump on breaking changes to the ledger contract.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version — bump on bug fixes.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string, assembled by hand so we don't allocate for
/// something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Asset Metadata Limits
// ---------------------------------------------------------------------------

/// Maximum asset name length in characters. Enough for a fund prospectus
/// title, not enough for the prospectus.
pub const MAX_ASSET_NAME_LENGTH: usize = 64;

/// Maximum ticker symbol length. Real-world tickers top out around 5-6
/// characters; 12 leaves room for test instruments without inviting abuse.
pub const MAX_ASSET_SYMBOL_LENGTH: usize = 12;

/// Maximum display decimals. 18 covers wei-denominated instruments, and
/// nobody has ever needed more without also needing therapy.
pub const MAX_ASSET_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Returns `true` if `symbol` is acceptable as a ticker: non-empty, within
/// the length limit, ASCII uppercase letters and digits only.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_ASSET_SYMBOL_LENGTH
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Returns `true` if `name` is acceptable as an asset name: non-empty,
/// within the length limit, printable ASCII (spaces allowed, control
/// characters not).
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ASSET_NAME_LENGTH
        && name.chars().all(|c| c.is_ascii_graphic() || c == ' ')
}
