//! # The Asset Ledger
//!
//! The authoritative record of who holds what. [`AssetLedger`] is the
//! in-process stand-in for the external settlement system KEEL custody
//! integrates against: it owns every [`AssetBook`], consults the
//! [`ComplianceRegistry`] before anything moves, and applies the minimum
//! holding rule to both sides of every transfer.
//!
//! ## Atomicity
//!
//! All state sits behind a single `parking_lot::RwLock`. Every operation
//! validates completely before mutating anything, so a rejected transfer
//! leaves both books untouched. Nothing holds the lock between operations,
//! though — a balance observed by one call can be stale by the time the
//! next call lands. Integrators that compute transfer amounts from cached
//! observations inherit that race.
//!
//! ## Surfaces
//!
//! The `AssetLedger` methods model the operator's console: registration,
//! issuance, floor changes, clearance. Participants never hold the ledger
//! directly — they get a [`LedgerClient`] scoped to their own account,
//! which can read balances but move only its own funds.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::account::AccountId;
use crate::asset::{AssetId, AssetInfo};
use crate::book::AssetBook;
use crate::compliance::ComplianceRegistry;
use crate::config::{is_valid_name, is_valid_symbol, MAX_ASSET_DECIMALS};
use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// AssetLedger
// ---------------------------------------------------------------------------

/// Books and compliance state, guarded together so each operation sees and
/// mutates one consistent snapshot.
struct LedgerInner {
    /// Per-asset books indexed by asset ID.
    books: HashMap<AssetId, AssetBook>,

    /// Clearance and bar lists consulted before any movement.
    compliance: ComplianceRegistry,
}

/// A thread-safe, compliance-gated asset ledger.
///
/// Every balance-touching operation is atomic: it acquires the write lock,
/// runs all of its checks against current state, and only then mutates.
/// There is no partial application — a transfer either settles on both
/// books or leaves them exactly as they were.
pub struct AssetLedger {
    inner: RwLock<LedgerInner>,
}

impl fmt::Debug for AssetLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AssetLedger")
            .field("assets", &inner.books.len())
            .finish()
    }
}

impl AssetLedger {
    /// Creates an empty ledger with no registered assets.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                books: HashMap::new(),
                compliance: ComplianceRegistry::new(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Operator console: registration, issuance, floor changes
    // -----------------------------------------------------------------------

    /// Registers a new asset and opens its book.
    ///
    /// The following checks are applied in order:
    ///
    /// 1. **Name** — non-empty, printable, within length limits.
    /// 2. **Symbol** — uppercase ASCII letters and digits only.
    /// 3. **Decimals** — at most [`MAX_ASSET_DECIMALS`].
    /// 4. **Uniqueness** — no book may already exist for this ID. Because
    ///    IDs are content-addressed, re-registering the same properties is
    ///    always caught here.
    ///
    /// Returns the asset's ID on success.
    pub fn register_asset(&self, info: AssetInfo) -> Result<AssetId, LedgerError> {
        if !is_valid_name(&info.name) {
            return Err(LedgerError::InvalidAssetDefinition {
                reason: format!("invalid asset name: {:?}", info.name),
            });
        }
        if !is_valid_symbol(&info.symbol) {
            return Err(LedgerError::InvalidAssetDefinition {
                reason: format!("invalid asset symbol: {:?}", info.symbol),
            });
        }
        if info.decimals > MAX_ASSET_DECIMALS {
            return Err(LedgerError::InvalidAssetDefinition {
                reason: format!(
                    "decimals {} exceeds maximum of {}",
                    info.decimals, MAX_ASSET_DECIMALS
                ),
            });
        }

        let mut inner = self.inner.write();
        if inner.books.contains_key(&info.id) {
            return Err(LedgerError::AssetAlreadyRegistered {
                asset: info.id,
                symbol: info.symbol,
            });
        }

        let id = info.id;
        info!(
            asset = %id,
            symbol = %info.symbol,
            min_holding = info.min_holding,
            "asset registered"
        );
        inner.books.insert(id, AssetBook::new(info));

        Ok(id)
    }

    /// Issues new units of an asset to a cleared account.
    ///
    /// Issuance follows the same floor rule as transfers: the recipient's
    /// prospective position must be at least the minimum holding. All
    /// overflow arithmetic is checked before anything is written, so the
    /// credit and the issuance record always move together.
    ///
    /// Returns the recipient's new balance.
    pub fn issue(
        &self,
        asset: &AssetId,
        to: AccountId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let mut inner = self.inner.write();
        let LedgerInner { books, compliance } = &mut *inner;
        let book = books
            .get_mut(asset)
            .ok_or(LedgerError::AssetNotFound(*asset))?;

        compliance.check_party(asset, &to)?;

        let prospective = book
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                asset: *asset,
                current: book.balance_of(&to),
                credit: amount,
            })?;
        book.check_residual(&to, prospective)?;

        book.total_issued()
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                asset: *asset,
                current: book.total_issued(),
                credit: amount,
            })?;

        // Validated above — neither call can fail now.
        let new_balance = book.credit(to, amount)?;
        book.record_issuance(amount)?;

        info!(asset = %asset, to = %to, amount = amount, "units issued");
        Ok(new_balance)
    }

    /// Moves an asset's minimum holding floor.
    ///
    /// Takes effect on the next operation. Positions already below the new
    /// floor stay where they are, but any transfer touching them must land
    /// on the right side of the rule — which for a position under the
    /// floor means a full exit is the only way out.
    pub fn set_min_holding(&self, asset: &AssetId, floor: u64) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let book = inner
            .books
            .get_mut(asset)
            .ok_or(LedgerError::AssetNotFound(*asset))?;

        let old_floor = book.min_holding();
        book.set_min_holding(floor);

        info!(
            asset = %asset,
            old_floor = old_floor,
            new_floor = floor,
            "minimum holding updated"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Compliance administration
    // -----------------------------------------------------------------------

    /// Clears an account to hold the given asset.
    ///
    /// Returns `true` if the account was newly cleared.
    pub fn clear_account(
        &self,
        asset: &AssetId,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write();
        if !inner.books.contains_key(asset) {
            return Err(LedgerError::AssetNotFound(*asset));
        }

        let newly_cleared = inner.compliance.clear_account(*asset, account);
        if newly_cleared {
            debug!(asset = %asset, account = %account, "account cleared");
        }
        Ok(newly_cleared)
    }

    /// Bars an account from every asset on the ledger.
    pub fn bar_account(&self, account: AccountId) {
        warn!(account = %account, "account barred");
        self.inner.write().compliance.bar_account(account);
    }

    /// Returns `true` if the account is currently cleared for the asset.
    /// Unknown assets clear no one.
    pub fn is_cleared(&self, asset: &AssetId, account: &AccountId) -> bool {
        self.inner.read().compliance.is_cleared(asset, account)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns an account's current position in an asset.
    ///
    /// An account that has never held the asset has a balance of zero. An
    /// unregistered asset is an error, not a zero — silently reporting
    /// empty books for assets that don't exist hides misconfiguration.
    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Result<u64, LedgerError> {
        let inner = self.inner.read();
        let book = inner
            .books
            .get(asset)
            .ok_or(LedgerError::AssetNotFound(*asset))?;
        Ok(book.balance_of(account))
    }

    /// Returns a clone of the asset's canonical record.
    pub fn asset_info(&self, asset: &AssetId) -> Result<AssetInfo, LedgerError> {
        let inner = self.inner.read();
        inner
            .books
            .get(asset)
            .map(|book| book.info().clone())
            .ok_or(LedgerError::AssetNotFound(*asset))
    }

    /// Returns the current minimum holding floor for an asset.
    pub fn min_holding(&self, asset: &AssetId) -> Result<u64, LedgerError> {
        let inner = self.inner.read();
        inner
            .books
            .get(asset)
            .map(|book| book.min_holding())
            .ok_or(LedgerError::AssetNotFound(*asset))
    }

    /// Returns the total units ever issued for an asset.
    pub fn total_issued(&self, asset: &AssetId) -> Result<u64, LedgerError> {
        let inner = self.inner.read();
        inner
            .books
            .get(asset)
            .map(|book| book.total_issued())
            .ok_or(LedgerError::AssetNotFound(*asset))
    }

    /// Returns the number of accounts with a nonzero position in an asset.
    pub fn holder_count(&self, asset: &AssetId) -> Result<usize, LedgerError> {
        let inner = self.inner.read();
        inner
            .books
            .get(asset)
            .map(|book| book.holder_count())
            .ok_or(LedgerError::AssetNotFound(*asset))
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Transfers units between two accounts.
    ///
    /// The following checks are applied in order:
    ///
    /// 1. **Amount** — zero-amount transfers are rejected outright.
    /// 2. **Registration** — the asset must have an open book.
    /// 3. **Compliance** — both parties must be cleared (payer named
    ///    first when both would fail).
    /// 4. **Funds** — the payer must hold at least `amount`.
    /// 5. **Payer floor** — the payer's residual must be exactly zero or
    ///    at least the minimum holding.
    /// 6. **Recipient floor** — the recipient's prospective position must
    ///    not overflow and must be at least the minimum holding.
    ///
    /// Only after every check passes are the two positions mutated, under
    /// the same write lock the checks ran under.
    pub fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        // 1. Amount.
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let mut inner = self.inner.write();
        let LedgerInner { books, compliance } = &mut *inner;

        // 2. Registration.
        let book = books
            .get_mut(asset)
            .ok_or(LedgerError::AssetNotFound(*asset))?;

        // 3. Compliance.
        compliance.check_transfer(asset, from, to)?;

        // 4. Funds.
        let available = book.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: *asset,
                available,
                requested: amount,
            });
        }

        // A self-transfer changes no position. Validate and stop here —
        // running the residual math would double-count the account.
        if from == to {
            return Ok(());
        }

        // 5. Payer floor.
        let residual = available - amount;
        book.check_residual(from, residual)?;

        // 6. Recipient floor.
        let prospective = book
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                asset: *asset,
                current: book.balance_of(to),
                credit: amount,
            })?;
        book.check_residual(to, prospective)?;

        // Validated above — neither call can fail now.
        book.debit(from, amount)?;
        book.credit(*to, amount)?;

        info!(
            asset = %asset,
            from = %from,
            to = %to,
            amount = amount,
            "transfer settled"
        );
        Ok(())
    }
}

impl Default for AssetLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// LedgerClient
// ---------------------------------------------------------------------------

/// A participant-scoped handle onto the ledger.
///
/// The client carries the account it acts as. It can read any balance —
/// positions on this ledger are visible to all participants — but every
/// transfer it submits is debited from its own context. Handing a
/// component a `LedgerClient` instead of the `AssetLedger` is how the
/// custody layer guarantees a vault can only ever spend vault funds.
#[derive(Clone)]
pub struct LedgerClient {
    ledger: Arc<AssetLedger>,
    context: AccountId,
}

impl fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerClient")
            .field("context", &self.context)
            .finish()
    }
}

impl LedgerClient {
    /// Creates a client acting as `context`.
    pub fn new(ledger: Arc<AssetLedger>, context: AccountId) -> Self {
        Self { ledger, context }
    }

    /// Returns the account this client acts as.
    pub fn context(&self) -> &AccountId {
        &self.context
    }

    /// Returns an account's current position in an asset.
    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Result<u64, LedgerError> {
        self.ledger.balance_of(asset, account)
    }

    /// Returns this client's own position in an asset.
    pub fn balance(&self, asset: &AssetId) -> Result<u64, LedgerError> {
        self.ledger.balance_of(asset, &self.context)
    }

    /// Returns the current minimum holding floor for an asset.
    pub fn min_holding(&self, asset: &AssetId) -> Result<u64, LedgerError> {
        self.ledger.min_holding(asset)
    }

    /// Transfers units from this client's context to `to`.
    pub fn transfer(&self, asset: &AssetId, to: &AccountId, amount: u64) -> Result<(), LedgerError> {
        self.ledger.transfer(asset, &self.context, to, amount)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
