// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KEEL Custody
//!
//! Custody-side logic for the KEEL platform. The ledger records who holds
//! what; this crate is the operational layer that moves pooled client
//! assets safely on top of it:
//!
//! - **Access Control** — role-gated authorization for privileged vault
//!   operations, fail-closed and auditable down to who granted what, when.
//! - **Service Directory** — numeric-ID registry mapping well-known
//!   service identifiers to typed handles, resolved once at wiring time.
//! - **Redemption Vault** — the withdrawal coordinator. Sweeps the vault's
//!   live ledger balance to a recipient in a way that third-party deposits
//!   cannot veto.
//!
//! ## Design Principles
//!
//! 1. The ledger is the only source of truth for balances — the vault
//!    caches nothing and re-reads immediately before it acts.
//! 2. Authorization happens before any state-touching call, never after.
//! 3. All monetary arithmetic is checked; wrapping arithmetic and money
//!    do not mix.
//! 4. Every public type is serializable (serde) for wire transport and
//!    audit storage.

pub mod access;
pub mod services;
pub mod vault;
