//! # Per-Asset Books
//!
//! Every registered asset gets a book: the asset's canonical metadata plus
//! the holdings of every account that has ever touched it. The book is
//! where the two rules that define this ledger live:
//!
//! 1. You can never debit more than an account holds.
//! 2. A post-operation position must be exactly zero or at least the
//!    asset's minimum holding.
//!
//! Rule 2 is the one that surprises people. An account holding 100 shares
//! of an asset with a 50-share floor cannot send 60 — the residual 40
//! would sit in the forbidden band between zero and the floor. It can
//! send 50, or it can send all 100. The same band is forbidden on the
//! receiving side: a credit may not leave the recipient below the floor.
//!
//! Thread safety is handled at the [`AssetLedger`](crate::ledger::AssetLedger)
//! level — an `AssetBook` is not `Sync` by itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::asset::AssetInfo;
use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Holding
// ---------------------------------------------------------------------------

/// A single account's position in one asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Holding {
    /// The account this position belongs to.
    pub account: AccountId,

    /// Position size in smallest units.
    pub amount: u64,

    /// Timestamp of the last position-modifying operation.
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Creates a new zero position for the given account.
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            amount: 0,
            updated_at: Utc::now(),
        }
    }

    /// Creates a position with an explicit initial amount.
    pub fn with_amount(account: AccountId, amount: u64) -> Self {
        Self {
            account,
            amount,
            updated_at: Utc::now(),
        }
    }

    /// Returns `true` if this position is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

// ---------------------------------------------------------------------------
// AssetBook
// ---------------------------------------------------------------------------

/// The complete state of one asset: its metadata, every holder's position,
/// and the running issuance total.
///
/// Provides credit/debit primitives that enforce non-negative positions and
/// overflow protection, plus [`AssetBook::check_residual`] — the minimum
/// holding predicate the ledger applies to both sides of a transfer before
/// mutating anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetBook {
    /// Canonical asset record. `info.min_holding` is the live floor —
    /// issuers can move it after registration via the ledger.
    info: AssetInfo,

    /// Positions indexed by account.
    holdings: HashMap<AccountId, Holding>,

    /// Total units ever issued into this book.
    total_issued: u64,
}

impl AssetBook {
    /// Creates an empty book for the given asset.
    pub fn new(info: AssetInfo) -> Self {
        Self {
            info,
            holdings: HashMap::new(),
            total_issued: 0,
        }
    }

    /// Returns the canonical asset record.
    pub fn info(&self) -> &AssetInfo {
        &self.info
    }

    /// Returns the current minimum holding floor for this asset.
    pub fn min_holding(&self) -> u64 {
        self.info.min_holding
    }

    /// Replaces the minimum holding floor.
    ///
    /// Takes effect on the next operation — existing positions below the
    /// new floor are grandfathered in place, but any transfer touching
    /// them must land on the right side of the new rule.
    pub fn set_min_holding(&mut self, floor: u64) {
        self.info.min_holding = floor;
    }

    /// Returns the position for an account. An account with no entry
    /// holds zero.
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.holdings.get(account).map(|h| h.amount).unwrap_or(0)
    }

    /// Returns the full [`Holding`] record for an account, including the
    /// last-updated timestamp, or `None` if the account has never held
    /// this asset.
    pub fn holding(&self, account: &AccountId) -> Option<&Holding> {
        self.holdings.get(account)
    }

    /// Checks a prospective post-operation position against the minimum
    /// holding rule: the position must be exactly zero or at least the
    /// floor.
    ///
    /// Applied by the ledger to the payer's residual AND the recipient's
    /// prospective position before either side of a transfer is mutated.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BelowMinimumHolding`] if the position would
    /// land in the forbidden band `1..min_holding`.
    pub fn check_residual(&self, account: &AccountId, position: u64) -> Result<(), LedgerError> {
        if position != 0 && position < self.info.min_holding {
            return Err(LedgerError::BelowMinimumHolding {
                asset: self.info.id,
                account: *account,
                residual: position,
                min_holding: self.info.min_holding,
            });
        }
        Ok(())
    }

    /// Credits (adds) units to an account's position.
    ///
    /// If no entry exists for the account, one is created automatically.
    /// This is a raw book mutation — the minimum holding rule is the
    /// ledger's job, via [`AssetBook::check_residual`], before it calls
    /// this.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BalanceOverflow`] if the credit would exceed
    /// `u64::MAX`.
    pub fn credit(&mut self, account: AccountId, amount: u64) -> Result<u64, LedgerError> {
        let holding = self
            .holdings
            .entry(account)
            .or_insert_with(|| Holding::new(account));

        let new_amount =
            holding
                .amount
                .checked_add(amount)
                .ok_or(LedgerError::BalanceOverflow {
                    asset: self.info.id,
                    current: holding.amount,
                    credit: amount,
                })?;

        holding.amount = new_amount;
        holding.updated_at = Utc::now();

        Ok(new_amount)
    }

    /// Debits (subtracts) units from an account's position.
    ///
    /// Like [`AssetBook::credit`], this is a raw mutation with no floor
    /// enforcement of its own.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if the debit exceeds
    /// the current position. An account with no entry holds zero, so any
    /// debit against it fails the same way.
    pub fn debit(&mut self, account: &AccountId, amount: u64) -> Result<u64, LedgerError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: self.info.id,
                available,
                requested: amount,
            });
        }

        // A missing entry means available == 0, so the guard above only
        // lets amount == 0 through. Inserting a zero holding keeps the
        // timestamp bookkeeping uniform.
        let holding = self
            .holdings
            .entry(*account)
            .or_insert_with(|| Holding::new(*account));
        holding.amount -= amount;
        holding.updated_at = Utc::now();

        Ok(holding.amount)
    }

    /// Records freshly issued units in the running total.
    ///
    /// The ledger calls this alongside the matching credit when the issuer
    /// mints new units.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BalanceOverflow`] if total issuance would
    /// exceed `u64::MAX`.
    pub fn record_issuance(&mut self, amount: u64) -> Result<u64, LedgerError> {
        self.total_issued =
            self.total_issued
                .checked_add(amount)
                .ok_or(LedgerError::BalanceOverflow {
                    asset: self.info.id,
                    current: self.total_issued,
                    credit: amount,
                })?;
        Ok(self.total_issued)
    }

    /// Returns the total units ever issued into this book.
    pub fn total_issued(&self) -> u64 {
        self.total_issued
    }

    /// Returns all nonzero positions as `(AccountId, amount)` pairs.
    pub fn holders(&self) -> Vec<(AccountId, u64)> {
        self.holdings
            .iter()
            .filter(|(_, h)| !h.is_zero())
            .map(|(id, h)| (*id, h.amount))
            .collect()
    }

    /// Returns the number of accounts with a nonzero position.
    pub fn holder_count(&self) -> usize {
        self.holdings.values().filter(|h| !h.is_zero()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{usd_money_market, Asset, AssetClass};

    fn test_book() -> AssetBook {
        AssetBook::new(usd_money_market())
    }

    fn unfloored_book() -> AssetBook {
        AssetBook::new(Asset::new(
            "Test Deposit",
            "TDEP",
            6,
            AssetClass::Deposit,
            AccountId::from_seed(b"test-issuer"),
        ))
    }

    // -- Credit and debit -------------------------------------------------

    #[test]
    fn credit_creates_new_entry() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        let result = book.credit(alice, 1000);
        assert_eq!(result.unwrap(), 1000);
        assert_eq!(book.balance_of(&alice), 1000);
    }

    #[test]
    fn credit_accumulates() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        book.credit(alice, 500).unwrap();
        book.credit(alice, 300).unwrap();

        assert_eq!(book.balance_of(&alice), 800);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        book.credit(alice, u64::MAX).unwrap();
        let result = book.credit(alice, 1);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::BalanceOverflow { .. }
        ));
    }

    #[test]
    fn debit_reduces_position() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        book.credit(alice, 1000).unwrap();
        let remaining = book.debit(&alice, 400).unwrap();

        assert_eq!(remaining, 600);
        assert_eq!(book.balance_of(&alice), 600);
    }

    #[test]
    fn debit_to_zero() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        book.credit(alice, 500).unwrap();
        let remaining = book.debit(&alice, 500).unwrap();

        assert_eq!(remaining, 0);
    }

    #[test]
    fn debit_insufficient_rejected() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");

        book.credit(alice, 100).unwrap();
        let result = book.debit(&alice, 200);

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InsufficientBalance {
                available: 100,
                requested: 200,
                ..
            }
        ));
    }

    #[test]
    fn debit_unknown_account_rejected() {
        let mut book = unfloored_book();
        let stranger = AccountId::from_seed(b"stranger");

        let result = book.debit(&stranger, 100);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InsufficientBalance { available: 0, .. }
        ));
    }

    #[test]
    fn balance_of_unknown_account_is_zero() {
        let book = unfloored_book();
        let stranger = AccountId::from_seed(b"stranger");
        assert_eq!(book.balance_of(&stranger), 0);
    }

    // -- Minimum holding rule ---------------------------------------------

    #[test]
    fn residual_of_zero_always_allowed() {
        let book = test_book();
        let alice = AccountId::from_seed(b"alice");
        assert!(book.check_residual(&alice, 0).is_ok());
    }

    #[test]
    fn residual_at_floor_allowed() {
        let book = test_book();
        let alice = AccountId::from_seed(b"alice");
        assert!(book.check_residual(&alice, book.min_holding()).is_ok());
    }

    #[test]
    fn residual_above_floor_allowed() {
        let book = test_book();
        let alice = AccountId::from_seed(b"alice");
        assert!(book.check_residual(&alice, book.min_holding() + 1).is_ok());
    }

    #[test]
    fn residual_in_forbidden_band_rejected() {
        let book = test_book();
        let alice = AccountId::from_seed(b"alice");

        let err = book.check_residual(&alice, 1).unwrap_err();
        assert!(matches!(err, LedgerError::BelowMinimumHolding { .. }));

        let err = book
            .check_residual(&alice, book.min_holding() - 1)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BelowMinimumHolding { residual, min_holding, .. }
                if residual == 49_999_999 && min_holding == 50_000_000
        ));
    }

    #[test]
    fn zero_floor_disables_the_rule() {
        let book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");
        assert!(book.check_residual(&alice, 1).is_ok());
    }

    #[test]
    fn raising_the_floor_tightens_the_band() {
        let mut book = test_book();
        let alice = AccountId::from_seed(b"alice");

        assert!(book.check_residual(&alice, 60_000_000).is_ok());
        book.set_min_holding(75_000_000);
        assert!(book.check_residual(&alice, 60_000_000).is_err());
        assert!(book.check_residual(&alice, 0).is_ok());
    }

    // -- Issuance and holders ---------------------------------------------

    #[test]
    fn record_issuance_accumulates() {
        let mut book = test_book();
        book.record_issuance(1_000).unwrap();
        book.record_issuance(500).unwrap();
        assert_eq!(book.total_issued(), 1_500);
    }

    #[test]
    fn record_issuance_overflow_rejected() {
        let mut book = test_book();
        book.record_issuance(u64::MAX).unwrap();
        assert!(matches!(
            book.record_issuance(1).unwrap_err(),
            LedgerError::BalanceOverflow { .. }
        ));
    }

    #[test]
    fn holders_excludes_zero_positions() {
        let mut book = unfloored_book();
        let alice = AccountId::from_seed(b"alice");
        let bob = AccountId::from_seed(b"bob");

        book.credit(alice, 1000).unwrap();
        book.credit(bob, 500).unwrap();
        book.debit(&bob, 500).unwrap();

        let holders = book.holders();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0], (alice, 1000));
        assert_eq!(book.holder_count(), 1);
    }

    #[test]
    fn book_serialization_roundtrip() {
        let mut book = test_book();
        let alice = AccountId::from_seed(b"alice");
        book.credit(alice, 42).unwrap();
        book.record_issuance(42).unwrap();

        let json = serde_json::to_string(&book).expect("serialize");
        let recovered: AssetBook = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.balance_of(&alice), 42);
        assert_eq!(recovered.total_issued(), 42);
        assert_eq!(recovered.min_holding(), book.min_holding());
    }
}
