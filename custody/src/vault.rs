//! # Redemption Vault
//!
//! The custody pool and its only exit. [`RedemptionVault`] holds pooled
//! client positions on the external asset ledger and redeems them through
//! a single operation, [`withdraw_token`](RedemptionVault::withdraw_token),
//! which always sweeps the vault's full live balance.
//!
//! ## Why the full balance, always
//!
//! The ledger enforces a minimum holding rule: after any transfer, each
//! party's position must be exactly zero or at least the asset's floor.
//! And the vault cannot stop inbound credits — any cleared participant can
//! transfer into the pool at any time. Together those two facts break
//! every withdrawal design that transfers a previously observed amount: a
//! one-unit credit landing after the observation turns the planned
//! residual into one unit inside the forbidden band, and the ledger
//! rejects the transfer. The attacker is out one unit; the stale figure
//! never settles.
//!
//! A full sweep has no such race. The vault re-reads its pooled balance
//! immediately before transferring and moves exactly that amount. The
//! residual is exactly zero, which is on the right side of the rule no
//! matter where the floor sits or how it has moved since.
//!
//! The vault keeps no durable state of its own. Its position lives on the
//! ledger, and every question about it is answered by a fresh read.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use keel_ledger::account::AccountId;
use keel_ledger::asset::AssetId;
use keel_ledger::error::LedgerError;
use keel_ledger::ledger::LedgerClient;

use crate::access::{AccessController, AuthError, Role};
use crate::services::{ServiceDirectory, ServiceError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum WithdrawalError {
    /// The caller failed authorization. Nothing was read or moved.
    #[error("withdrawal refused: {0}")]
    Auth(#[from] AuthError),

    /// The ledger rejected a read or the sweep itself. Rejections pass
    /// through unmodified; the vault never retries on the caller's behalf.
    #[error("ledger rejected the operation: {0}")]
    Ledger(#[from] LedgerError),

    /// A backing service could not be resolved at wiring time.
    #[error("vault wiring failed: {0}")]
    Service(#[from] ServiceError),

    /// The vault's pooled balance is zero.
    #[error("nothing to withdraw: vault {vault} holds no units of {asset}")]
    VaultEmpty {
        /// The vault's ledger account.
        vault: AccountId,
        /// The asset that was requested.
        asset: AssetId,
    },
}

// ---------------------------------------------------------------------------
// SweepReceipt
// ---------------------------------------------------------------------------

/// The settlement record returned by a completed withdrawal.
///
/// `requested_amount` and `swept_amount` can differ — the former is the
/// caller's observation, the latter is what actually moved. Reconciliation
/// jobs key off that difference to spot pools that grew between the
/// caller's read and the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReceipt {
    /// Unique identifier for this sweep.
    pub id: Uuid,

    /// The asset that was swept.
    pub asset: AssetId,

    /// The account the pool was paid out to.
    pub recipient: AccountId,

    /// The pooled balance the caller believed it was withdrawing. Recorded
    /// for audit, never used as the transfer amount.
    pub requested_amount: u64,

    /// The live pooled balance that was actually transferred.
    pub swept_amount: u64,

    /// When the sweep settled.
    pub executed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RedemptionVault
// ---------------------------------------------------------------------------

/// A pooled redemption vault over one ledger account.
///
/// The vault acts as its ledger account through a [`LedgerClient`], so it
/// can only ever spend its own pool, and gates every withdrawal on the
/// access controller. Both handles are resolved once, at wiring time —
/// no per-call directory lookups.
pub struct RedemptionVault {
    /// Ledger handle scoped to the vault's own account.
    ledger: LedgerClient,

    /// Role store consulted before anything moves.
    access: Arc<AccessController>,
}

impl fmt::Debug for RedemptionVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedemptionVault")
            .field("account", self.ledger.context())
            .finish()
    }
}

impl RedemptionVault {
    /// Creates a vault from already-resolved handles.
    ///
    /// The vault's account is the client's context — there is no separate
    /// account field to fall out of step with it.
    pub fn new(ledger: LedgerClient, access: Arc<AccessController>) -> Self {
        Self { ledger, access }
    }

    /// Wires a vault for `account` against a service directory.
    ///
    /// Resolves the ledger and access control handles immediately and
    /// holds them for the vault's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`WithdrawalError::Service`] if either backing service is
    /// missing or bound to the wrong kind of handle.
    pub fn connect(
        account: AccountId,
        directory: &ServiceDirectory,
    ) -> Result<Self, WithdrawalError> {
        let ledger = LedgerClient::new(directory.ledger()?, account);
        let access = directory.access_control()?;

        info!(vault = %account, "redemption vault wired");
        Ok(Self { ledger, access })
    }

    /// Returns the vault's ledger account.
    pub fn account(&self) -> &AccountId {
        self.ledger.context()
    }

    /// Returns the vault's current pooled balance in `asset`.
    ///
    /// Always a fresh read. The figure is accurate at the moment the
    /// ledger answered and can be stale by the time the caller acts on it,
    /// which is exactly why withdrawals never trust it.
    pub fn pooled_balance(&self, asset: &AssetId) -> Result<u64, WithdrawalError> {
        Ok(self.ledger.balance(asset)?)
    }

    /// Sweeps the vault's entire live position in `asset` to `recipient`.
    ///
    /// The following checks are applied in order:
    ///
    /// 1. **Authorization** — `caller` must hold [`Role::WithdrawalAdmin`].
    ///    Nothing is read from the ledger before this passes.
    /// 2. **Live balance** — the pooled balance is re-read from the
    ///    ledger. `requested_amount` is the caller's earlier observation;
    ///    when the two differ the drift is logged and the live figure
    ///    wins.
    /// 3. **Empty pool** — a zero balance fails with
    ///    [`WithdrawalError::VaultEmpty`] before any transfer is
    ///    attempted.
    ///
    /// The transfer then moves exactly the live balance, emptying the
    /// pool. Ledger rejections propagate unmodified with no retry; a
    /// later attempt starts over from its own fresh read.
    ///
    /// # Errors
    ///
    /// Returns [`WithdrawalError::Auth`] if the caller lacks the role,
    /// [`WithdrawalError::VaultEmpty`] on an empty pool, and
    /// [`WithdrawalError::Ledger`] carrying whatever the ledger rejected
    /// the sweep with.
    pub fn withdraw_token(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        requested_amount: u64,
        recipient: &AccountId,
    ) -> Result<SweepReceipt, WithdrawalError> {
        self.access.authorize(caller, Role::WithdrawalAdmin)?;

        // The caller's figure is already history. Read the pool as it is now.
        let live = self.ledger.balance(asset)?;
        if live == 0 {
            return Err(WithdrawalError::VaultEmpty {
                vault: *self.account(),
                asset: *asset,
            });
        }

        if requested_amount != live {
            warn!(
                asset = %asset,
                requested = requested_amount,
                live = live,
                "requested amount is stale, sweeping live balance"
            );
        }

        self.ledger.transfer(asset, recipient, live)?;

        let receipt = SweepReceipt {
            id: Uuid::new_v4(),
            asset: *asset,
            recipient: *recipient,
            requested_amount,
            swept_amount: live,
            executed_at: Utc::now(),
        };

        info!(
            sweep = %receipt.id,
            asset = %asset,
            recipient = %recipient,
            swept = live,
            "vault swept"
        );
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use keel_ledger::asset::usd_money_market;
    use keel_ledger::ledger::AssetLedger;

    use crate::services::{
        ServiceHandle, ACCESS_CONTROL_SERVICE, ASSET_LEDGER_SERVICE,
    };

    fn vault_account() -> AccountId {
        AccountId::from_seed(b"vault")
    }

    fn recipient() -> AccountId {
        AccountId::from_seed(b"client-7")
    }

    /// Wires a ledger, an access controller, and a vault holding
    /// 100_000_000 units of the money market fund (floor 50_000_000).
    /// The returned admin holds the withdrawal role.
    fn rig() -> (Arc<AssetLedger>, RedemptionVault, AssetId, AccountId) {
        let ledger = Arc::new(AssetLedger::new());
        let asset = ledger.register_asset(usd_money_market()).unwrap();
        for account in [vault_account(), recipient()] {
            ledger.clear_account(&asset, account).unwrap();
        }
        ledger.issue(&asset, vault_account(), 100_000_000).unwrap();

        let root = AccountId::from_seed(b"root");
        let access = Arc::new(AccessController::new(root));
        let admin = AccountId::from_seed(b"admin");
        access.grant(&root, Role::WithdrawalAdmin, admin).unwrap();

        let directory = ServiceDirectory::new();
        directory.register(
            ASSET_LEDGER_SERVICE,
            ServiceHandle::Ledger(Arc::clone(&ledger)),
        );
        directory.register(
            ACCESS_CONTROL_SERVICE,
            ServiceHandle::AccessControl(access),
        );

        let vault = RedemptionVault::connect(vault_account(), &directory).unwrap();
        (ledger, vault, asset, admin)
    }

    // -- Wiring --------------------------------------------------------------

    #[test]
    fn connect_wires_the_vault() {
        let (_ledger, vault, asset, _admin) = rig();
        assert_eq!(*vault.account(), vault_account());
        assert_eq!(vault.pooled_balance(&asset).unwrap(), 100_000_000);
    }

    #[test]
    fn connect_without_backing_services_fails() {
        let directory = ServiceDirectory::new();
        let err = RedemptionVault::connect(vault_account(), &directory).unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::Service(ServiceError::NotRegistered { .. })
        ));
    }

    #[test]
    fn pooled_balance_is_a_live_read() {
        let (ledger, vault, asset, _admin) = rig();
        assert_eq!(vault.pooled_balance(&asset).unwrap(), 100_000_000);

        ledger.issue(&asset, vault_account(), 1).unwrap();
        assert_eq!(vault.pooled_balance(&asset).unwrap(), 100_000_001);
    }

    // -- Sweeps --------------------------------------------------------------

    #[test]
    fn sweep_moves_the_full_pool() {
        let (ledger, vault, asset, admin) = rig();

        let receipt = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap();

        assert_eq!(receipt.requested_amount, 100_000_000);
        assert_eq!(receipt.swept_amount, 100_000_000);
        assert_eq!(receipt.recipient, recipient());
        assert_eq!(ledger.balance_of(&asset, &vault_account()).unwrap(), 0);
        assert_eq!(
            ledger.balance_of(&asset, &recipient()).unwrap(),
            100_000_000
        );
    }

    #[test]
    fn stale_request_sweeps_live_balance() {
        let (ledger, vault, asset, admin) = rig();

        // The pool grows after the caller's observation.
        ledger.issue(&asset, vault_account(), 1).unwrap();

        let receipt = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap();

        assert_eq!(receipt.requested_amount, 100_000_000);
        assert_eq!(receipt.swept_amount, 100_000_001);
        assert_eq!(ledger.balance_of(&asset, &vault_account()).unwrap(), 0);
        assert_eq!(
            ledger.balance_of(&asset, &recipient()).unwrap(),
            100_000_001
        );
    }

    #[test]
    fn empty_vault_rejected() {
        let (_ledger, vault, asset, admin) = rig();
        vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap();

        let err = vault
            .withdraw_token(&admin, &asset, 0, &recipient())
            .unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::VaultEmpty { vault: v, asset: a }
                if v == vault_account() && a == asset
        ));
    }

    // -- Authorization -------------------------------------------------------

    #[test]
    fn unauthorized_caller_moves_nothing() {
        let (ledger, vault, asset, _admin) = rig();
        let stranger = AccountId::from_seed(b"stranger");

        let err = vault
            .withdraw_token(&stranger, &asset, 100_000_000, &recipient())
            .unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::Auth(AuthError::Unauthorized {
                role: Role::WithdrawalAdmin,
                ..
            })
        ));

        assert_eq!(
            ledger.balance_of(&asset, &vault_account()).unwrap(),
            100_000_000
        );
        assert_eq!(ledger.balance_of(&asset, &recipient()).unwrap(), 0);
    }

    // -- Ledger interplay ----------------------------------------------------

    #[test]
    fn ledger_rejection_propagates_unmodified() {
        let (ledger, vault, asset, admin) = rig();

        // Floor raised above the pool. The vault's grandfathered position
        // can still exit in full, but not into an account the rule would
        // strand under the new floor.
        ledger.set_min_holding(&asset, 150_000_000).unwrap();

        let err = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::Ledger(LedgerError::BelowMinimumHolding {
                residual: 100_000_000,
                min_holding: 150_000_000,
                ..
            })
        ));

        // Rejected means untouched.
        assert_eq!(
            ledger.balance_of(&asset, &vault_account()).unwrap(),
            100_000_000
        );
    }

    #[test]
    fn raised_floor_full_exit_to_funded_recipient() {
        let (ledger, vault, asset, admin) = rig();
        ledger.issue(&asset, recipient(), 100_000_000).unwrap();
        ledger.set_min_holding(&asset, 150_000_000).unwrap();

        // Vault residual is zero and the recipient lands above the new
        // floor, so the sweep settles even though the pool itself sat
        // below 150_000_000.
        let receipt = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap();
        assert_eq!(receipt.swept_amount, 100_000_000);
        assert_eq!(
            ledger.balance_of(&asset, &recipient()).unwrap(),
            200_000_000
        );
    }

    #[test]
    fn barred_recipient_rejected() {
        let (ledger, vault, asset, admin) = rig();
        ledger.bar_account(recipient());

        let err = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap_err();
        assert!(matches!(
            err,
            WithdrawalError::Ledger(LedgerError::ComplianceRejected { .. })
        ));
        assert_eq!(
            ledger.balance_of(&asset, &vault_account()).unwrap(),
            100_000_000
        );
    }

    // -- Receipts ------------------------------------------------------------

    #[test]
    fn receipt_serialization_roundtrip() {
        let (_ledger, vault, asset, admin) = rig();
        let receipt = vault
            .withdraw_token(&admin, &asset, 100_000_000, &recipient())
            .unwrap();

        let json = serde_json::to_string(&receipt).unwrap();
        let recovered: SweepReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.id, receipt.id);
        assert_eq!(recovered.asset, asset);
        assert_eq!(recovered.swept_amount, 100_000_000);
    }
}
