//! # Ledger Error Taxonomy
//!
//! All fallible ledger operations funnel into [`LedgerError`]. Variants carry
//! the numbers that matter — available vs. requested, residual vs. minimum —
//! so callers can log or surface a rejection without re-querying the ledger
//! for context.
//!
//! The variant worth reading twice is [`LedgerError::BelowMinimumHolding`].
//! It is raised when a transfer would strand an account with a non-zero
//! balance under the asset's minimum, and it is the failure mode that a
//! careless withdrawal design lets third parties trigger at will.

use thiserror::Error;

use crate::account::AccountId;
use crate::asset::AssetId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The asset has never been registered on this ledger.
    #[error("unknown asset {0}")]
    AssetNotFound(AssetId),

    /// An asset with the same derived identifier is already registered.
    #[error("asset {asset} ({symbol}) is already registered")]
    AssetAlreadyRegistered {
        /// The identifier that collided.
        asset: AssetId,
        /// Symbol of the existing registration, for log readability.
        symbol: String,
    },

    /// The asset metadata failed validation at registration time.
    #[error("invalid asset definition: {reason}")]
    InvalidAssetDefinition {
        /// What exactly was wrong with the submitted metadata.
        reason: String,
    },

    /// Zero-amount transfers and issuances are caller bugs, not no-ops.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// The sender does not hold enough of the asset.
    #[error("insufficient balance: available {available}, requested {requested} (asset {asset})")]
    InsufficientBalance {
        /// The asset being debited.
        asset: AssetId,
        /// The sender's current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// The operation would leave an account with a non-zero balance below
    /// the asset's minimum holding. A residual of exactly zero is always
    /// allowed; anything strictly between zero and the minimum is not.
    #[error(
        "residual {residual} for account {account} is below the minimum holding of {min_holding} (asset {asset})"
    )]
    BelowMinimumHolding {
        /// The asset whose rule was violated.
        asset: AssetId,
        /// The account that would be left under-minimum.
        account: AccountId,
        /// The balance the account would end up with.
        residual: u64,
        /// The minimum holding in force at the time of the operation.
        min_holding: u64,
    },

    /// Arithmetic overflow during a credit or issuance.
    ///
    /// If you're hitting this, someone is trying to credit more than
    /// 18.4 quintillion units. That's either a bug or an attack.
    #[error("balance overflow: current {current}, credit {credit} (asset {asset})")]
    BalanceOverflow {
        /// The asset being credited.
        asset: AssetId,
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },

    /// The compliance registry refused the account. Deliberately opaque:
    /// the real registry's reasons (accreditation, jurisdiction, sanctions)
    /// are not modeled here, only the verdict.
    #[error("compliance rejected account {account} for asset {asset}")]
    ComplianceRejected {
        /// The asset whose registry refused.
        asset: AssetId,
        /// The account that is not cleared.
        account: AccountId,
    },
}
