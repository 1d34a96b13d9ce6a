// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KEEL Ledger — Reference Asset Ledger
//!
//! This crate is the in-process model of the regulated asset ledger that
//! KEEL custody products sit on top of. It reproduces the ledger's
//! *observable contract* — balances, transfers, issuance, and the
//! minimum-holding rule — so that custody logic can be exercised against a
//! ledger that pushes back the way the real one does.
//!
//! The rule that makes everything interesting: after any transfer, every
//! touched account must hold either **exactly zero** or **at least the
//! asset's minimum holding**. A residual of 1 unit under a 50-unit minimum
//! is not a rounding quirk, it is a hard revert. Custody code that computes
//! withdrawal amounts from stale observations will discover this at the
//! worst possible moment; see `keel-custody` for the component that never
//! does.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the ledger's actual concerns:
//!
//! - **account** — Bech32 account addresses. Your address, your holdings.
//! - **asset** — Content-addressed asset identity and metadata.
//! - **book** — Per-asset balance books with checked arithmetic.
//! - **compliance** — The cleared-account facade. Opaque on purpose.
//! - **ledger** — The synchronized multi-asset ledger and its client handle.
//! - **config** — Protocol constants and validation limits.
//!
//! ## Design Philosophy
//!
//! 1. The ledger is the only source of truth. Consumers re-read, never cache.
//! 2. All monetary arithmetic is `checked_*` — wrapping math and money do
//!    not mix.
//! 3. Every operation is atomic at the ledger boundary: validate everything,
//!    then mutate, never halfway.
//! 4. If it touches money, it has tests. Plural.

pub mod account;
pub mod asset;
pub mod book;
pub mod compliance;
pub mod config;
pub mod error;
pub mod ledger;
