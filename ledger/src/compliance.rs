//! # Compliance Registry
//!
//! Transfer-restricted instruments only move between accounts the issuer's
//! compliance desk has cleared. The registry keeps a per-asset allowlist
//! plus a global bar list, and the ledger consults it before any transfer
//! or issuance touches a book.
//!
//! Verdicts are fail-closed and deliberately opaque: an account that is
//! not on an asset's allowlist — or that has been barred outright — gets
//! the same [`LedgerError::ComplianceRejected`] either way. Callers never
//! learn which list they tripped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::error::LedgerError;

/// Per-asset clearance state for every account the platform knows about.
///
/// An account must be individually cleared for each asset it wants to
/// hold. A bar is global: it overrides every clearance the account has,
/// without removing them, so lifting the bar restores the account's
/// prior standing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceRegistry {
    /// Accounts cleared to hold each asset.
    #[serde(with = "crate::asset::asset_id_map")]
    cleared: HashMap<AssetId, HashSet<AccountId>>,

    /// Accounts barred from every asset, clearance or not.
    barred: HashSet<AccountId>,
}

impl ComplianceRegistry {
    /// Creates an empty registry. Nobody is cleared for anything.
    pub fn new() -> Self {
        Self {
            cleared: HashMap::new(),
            barred: HashSet::new(),
        }
    }

    /// Clears an account to hold the given asset.
    ///
    /// Returns `true` if the account was newly cleared, `false` if it
    /// already was.
    pub fn clear_account(&mut self, asset: AssetId, account: AccountId) -> bool {
        self.cleared.entry(asset).or_default().insert(account)
    }

    /// Bars an account from every asset.
    ///
    /// Existing clearances are kept on file but stop counting.
    pub fn bar_account(&mut self, account: AccountId) {
        self.barred.insert(account);
    }

    /// Returns `true` if the account is currently cleared for the asset.
    pub fn is_cleared(&self, asset: &AssetId, account: &AccountId) -> bool {
        if self.barred.contains(account) {
            return false;
        }
        self.cleared
            .get(asset)
            .map(|accounts| accounts.contains(account))
            .unwrap_or(false)
    }

    /// Returns `true` if the account is barred.
    pub fn is_barred(&self, account: &AccountId) -> bool {
        self.barred.contains(account)
    }

    /// Checks a single party against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ComplianceRejected`] naming the account if
    /// it is not cleared for the asset.
    pub fn check_party(&self, asset: &AssetId, account: &AccountId) -> Result<(), LedgerError> {
        if self.is_cleared(asset, account) {
            Ok(())
        } else {
            Err(LedgerError::ComplianceRejected {
                asset: *asset,
                account: *account,
            })
        }
    }

    /// Checks both parties of a transfer. The payer is checked first, so
    /// an uncleared payer is the one named when both would fail.
    pub fn check_transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), LedgerError> {
        self.check_party(asset, from)?;
        self.check_party(asset, to)
    }
}

impl Default for ComplianceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
