//! # Access Control
//!
//! Role-gated authorization for privileged custody operations. Membership
//! is a set of (role, account) pairs: an account either holds a role or it
//! doesn't, and every check is fail-closed — no grant on file means no
//! access, with no further interpretation.
//!
//! Grants are records, not booleans. Each one remembers who issued it and
//! when, because "who could withdraw, and who let them" is the first
//! question asked after any custody incident.
//!
//! The controller is safe to share across threads; grants live in a
//! `DashMap` so authorization checks on the hot path never contend with
//! each other.

use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use keel_ledger::account::AccountId;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Capability tags for privileged custody operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May invoke vault withdrawals.
    WithdrawalAdmin,

    /// May grant and revoke roles, including this one.
    AccessAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::WithdrawalAdmin => write!(f, "WithdrawalAdmin"),
            Role::AccessAdmin => write!(f, "AccessAdmin"),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the access controller.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The caller does not hold the role the operation requires.
    #[error("account {account} does not hold the {role} role")]
    Unauthorized {
        /// The account that failed the check.
        account: AccountId,
        /// The role the operation required.
        role: Role,
    },

    /// Tried to grant a role the account already holds.
    #[error("account {account} already holds the {role} role")]
    AlreadyGranted {
        /// The account in question.
        account: AccountId,
        /// The role that was being granted.
        role: Role,
    },

    /// Tried to revoke a role the account was never granted.
    #[error("cannot revoke: account {account} was never granted the {role} role")]
    NotGranted {
        /// The account in question.
        account: AccountId,
        /// The role that was being revoked.
        role: Role,
    },
}

// ---------------------------------------------------------------------------
// GrantRecord
// ---------------------------------------------------------------------------

/// An audit record for a single role grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRecord {
    /// The role that was granted.
    pub role: Role,

    /// The account holding the role.
    pub account: AccountId,

    /// The administrator who issued the grant. For the bootstrap grant
    /// this is the root account itself.
    pub granted_by: AccountId,

    /// When the grant was issued.
    pub granted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AccessController
// ---------------------------------------------------------------------------

/// Thread-safe role membership store.
///
/// Construction seeds a single root [`Role::AccessAdmin`] — every other
/// grant in the system traces back to it through the `granted_by` chain.
pub struct AccessController {
    /// Grants keyed by (role, account). Presence is membership.
    grants: DashMap<(Role, AccountId), GrantRecord>,
}

impl fmt::Debug for AccessController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessController")
            .field("grants", &self.grants.len())
            .finish()
    }
}

impl AccessController {
    /// Creates a controller with `root` holding [`Role::AccessAdmin`].
    pub fn new(root: AccountId) -> Self {
        let grants = DashMap::new();
        grants.insert(
            (Role::AccessAdmin, root),
            GrantRecord {
                role: Role::AccessAdmin,
                account: root,
                granted_by: root,
                granted_at: Utc::now(),
            },
        );
        info!(root = %root, "access controller initialized");
        Self { grants }
    }

    /// Returns `true` if `account` currently holds `role`. Pure read.
    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.grants.contains_key(&(role, *account))
    }

    /// Checks that `caller` holds `role`, failing closed otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if no grant is on file.
    pub fn authorize(&self, caller: &AccountId, role: Role) -> Result<(), AuthError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            debug!(account = %caller, role = %role, "authorization denied");
            Err(AuthError::Unauthorized {
                account: *caller,
                role,
            })
        }
    }

    /// Grants `role` to `account`.
    ///
    /// Only an [`Role::AccessAdmin`] may grant roles — including handing
    /// out further `AccessAdmin` grants.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if `granter` is not an access
    /// admin, or [`AuthError::AlreadyGranted`] if the grant already exists.
    pub fn grant(
        &self,
        granter: &AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<(), AuthError> {
        self.authorize(granter, Role::AccessAdmin)?;

        if self.has_role(&account, role) {
            return Err(AuthError::AlreadyGranted { account, role });
        }

        self.grants.insert(
            (role, account),
            GrantRecord {
                role,
                account,
                granted_by: *granter,
                granted_at: Utc::now(),
            },
        );

        info!(account = %account, role = %role, granted_by = %granter, "role granted");
        Ok(())
    }

    /// Revokes `role` from `account`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if `revoker` is not an access
    /// admin, or [`AuthError::NotGranted`] if no such grant exists.
    pub fn revoke(
        &self,
        revoker: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<(), AuthError> {
        self.authorize(revoker, Role::AccessAdmin)?;

        self.grants
            .remove(&(role, *account))
            .ok_or(AuthError::NotGranted {
                account: *account,
                role,
            })?;

        info!(account = %account, role = %role, revoked_by = %revoker, "role revoked");
        Ok(())
    }

    /// Returns every grant currently held by `account`.
    pub fn grants_for(&self, account: &AccountId) -> Vec<GrantRecord> {
        self.grants
            .iter()
            .filter(|entry| entry.key().1 == *account)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> AccountId {
        AccountId::from_seed(b"root")
    }

    // -- Bootstrap and fail-closed checks -----------------------------------

    #[test]
    fn root_is_seeded_with_access_admin() {
        let controller = AccessController::new(root());
        assert!(controller.has_role(&root(), Role::AccessAdmin));
        assert!(controller.authorize(&root(), Role::AccessAdmin).is_ok());
    }

    #[test]
    fn root_does_not_get_withdrawal_admin_for_free() {
        let controller = AccessController::new(root());
        assert!(!controller.has_role(&root(), Role::WithdrawalAdmin));
    }

    #[test]
    fn unknown_account_fails_closed() {
        let controller = AccessController::new(root());
        let stranger = AccountId::from_seed(b"stranger");

        assert!(!controller.has_role(&stranger, Role::WithdrawalAdmin));
        let err = controller
            .authorize(&stranger, Role::WithdrawalAdmin)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unauthorized {
                account,
                role: Role::WithdrawalAdmin,
            } if account == stranger
        ));
    }

    // -- Granting ------------------------------------------------------------

    #[test]
    fn grant_then_authorize() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();

        assert!(controller.has_role(&operator, Role::WithdrawalAdmin));
        assert!(controller
            .authorize(&operator, Role::WithdrawalAdmin)
            .is_ok());
    }

    #[test]
    fn grant_requires_access_admin() {
        let controller = AccessController::new(root());
        let mallory = AccountId::from_seed(b"mallory");
        let friend = AccountId::from_seed(b"friend");

        let err = controller
            .grant(&mallory, Role::WithdrawalAdmin, friend)
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
        assert!(!controller.has_role(&friend, Role::WithdrawalAdmin));
    }

    #[test]
    fn double_grant_rejected() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();
        let err = controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyGranted { .. }));
    }

    #[test]
    fn roles_are_independent() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();

        // Holding WithdrawalAdmin confers nothing else.
        assert!(!controller.has_role(&operator, Role::AccessAdmin));
        assert!(controller
            .grant(&operator, Role::WithdrawalAdmin, AccountId::from_seed(b"x"))
            .is_err());
    }

    #[test]
    fn delegated_access_admin_can_grant() {
        let controller = AccessController::new(root());
        let deputy = AccountId::from_seed(b"deputy");
        let operator = AccountId::from_seed(b"operator");

        controller.grant(&root(), Role::AccessAdmin, deputy).unwrap();
        controller
            .grant(&deputy, Role::WithdrawalAdmin, operator)
            .unwrap();

        assert!(controller.has_role(&operator, Role::WithdrawalAdmin));
    }

    // -- Revocation ----------------------------------------------------------

    #[test]
    fn revoke_removes_access() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();
        controller
            .revoke(&root(), Role::WithdrawalAdmin, &operator)
            .unwrap();

        assert!(!controller.has_role(&operator, Role::WithdrawalAdmin));
        assert!(controller
            .authorize(&operator, Role::WithdrawalAdmin)
            .is_err());
    }

    #[test]
    fn revoke_unknown_grant_rejected() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        let err = controller
            .revoke(&root(), Role::WithdrawalAdmin, &operator)
            .unwrap_err();
        assert!(matches!(err, AuthError::NotGranted { .. }));
    }

    #[test]
    fn revoke_requires_access_admin() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");
        let mallory = AccountId::from_seed(b"mallory");

        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();
        let err = controller
            .revoke(&mallory, Role::WithdrawalAdmin, &operator)
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
        assert!(controller.has_role(&operator, Role::WithdrawalAdmin));
    }

    // -- Audit records -------------------------------------------------------

    #[test]
    fn grant_record_traces_back_to_granter() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");

        let before = Utc::now();
        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();

        let records = controller.grants_for(&operator);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].role, Role::WithdrawalAdmin);
        assert_eq!(records[0].granted_by, root());
        assert!(records[0].granted_at >= before);
        assert!(records[0].granted_at <= Utc::now());
    }

    #[test]
    fn grants_for_lists_all_roles() {
        let controller = AccessController::new(root());
        let deputy = AccountId::from_seed(b"deputy");

        controller.grant(&root(), Role::AccessAdmin, deputy).unwrap();
        controller
            .grant(&root(), Role::WithdrawalAdmin, deputy)
            .unwrap();

        let mut roles: Vec<Role> = controller
            .grants_for(&deputy)
            .into_iter()
            .map(|r| r.role)
            .collect();
        roles.sort_by_key(|r| format!("{}", r));
        assert_eq!(roles, vec![Role::AccessAdmin, Role::WithdrawalAdmin]);
    }

    #[test]
    fn grant_record_serialization_roundtrip() {
        let controller = AccessController::new(root());
        let operator = AccountId::from_seed(b"operator");
        controller
            .grant(&root(), Role::WithdrawalAdmin, operator)
            .unwrap();

        let record = &controller.grants_for(&operator)[0];
        let json = serde_json::to_string(record).unwrap();
        let recovered: GrantRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.account, operator);
        assert_eq!(recovered.role, Role::WithdrawalAdmin);
    }

    // -- Thread safety -------------------------------------------------------

    #[test]
    fn concurrent_grants_and_checks() {
        use std::sync::Arc;
        use std::thread;

        let controller = Arc::new(AccessController::new(root()));
        let mut handles = vec![];

        // Writers grant roles to distinct accounts.
        for i in 0..4u32 {
            let controller = Arc::clone(&controller);
            handles.push(thread::spawn(move || {
                for j in 0..50u32 {
                    let account = AccountId::from_seed(format!("acct-{}-{}", i, j).as_bytes());
                    controller
                        .grant(&AccountId::from_seed(b"root"), Role::WithdrawalAdmin, account)
                        .expect("distinct accounts never collide");
                }
            }));
        }

        // Readers hammer authorization checks meanwhile.
        for _ in 0..4 {
            let controller = Arc::clone(&controller);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let _ = controller.has_role(&AccountId::from_seed(b"root"), Role::AccessAdmin);
                    let _ =
                        controller.authorize(&AccountId::from_seed(b"nobody"), Role::WithdrawalAdmin);
                }
            }));
        }

        for h in handles {
            h.join().expect("thread panicked");
        }

        // 4 writers x 50 grants, plus the root seed.
        let sample = AccountId::from_seed(b"acct-0-0");
        assert!(controller.has_role(&sample, Role::WithdrawalAdmin));
    }
}
