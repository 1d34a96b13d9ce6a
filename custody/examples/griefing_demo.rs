//! Interactive CLI demo of the KEEL custody withdrawal path.
//!
//! Walks through wiring a deployment, listing an asset with a minimum
//! holding floor, a donation-griefing attempt against a snapshot-based
//! exit, and the full-balance sweep that shrugs it off. The output uses
//! ANSI escape codes for colored, storytelling-style terminal rendering.
//!
//! Run with:
//!   cargo run --example griefing_demo --release
//!
//! Set RUST_LOG to see the custody and ledger logs interleaved with the
//! story; the default filter shows warnings only, so the coordinator's
//! stale-amount warning still surfaces at the right moment.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keel_custody::access::{AccessController, Role};
use keel_custody::services::{
    ServiceDirectory, ServiceHandle, ACCESS_CONTROL_SERVICE, ASSET_LEDGER_SERVICE,
};
use keel_custody::vault::RedemptionVault;
use keel_ledger::account::AccountId;
use keel_ledger::asset::usd_money_market;
use keel_ledger::error::LedgerError;
use keel_ledger::ledger::AssetLedger;

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    KEEL CUSTODY  --  Redemption Vault Demo                         {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Full-balance sweeps vs. donation griefing                       {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn blocked(text: &str) {
    println!("{RED}  [BLOCKED] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn address_display(name: &str, addr: &str, color: &str) {
    let prefix = &addr[..5];
    let suffix = &addr[addr.len().saturating_sub(8)..];
    println!(
        "  {color}{BOLD}{name}{RESET}  {DIM}{prefix}...{suffix}{RESET}  {DIM}({} chars){RESET}",
        addr.len()
    );
}

fn balance_row(name: &str, balance: u64, color: &str) {
    println!("  {color}{BOLD}{name:<12}{RESET}  {WHITE}{balance:>12}{RESET} {DIM}units{RESET}");
}

fn separator() {
    println!(
        "{DIM}{CYAN}  . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . {RESET}"
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    let demo_start = Instant::now();

    banner();

    // -----------------------------------------------------------------------
    // Step 1: Deployment Wiring
    // -----------------------------------------------------------------------

    section(1, "Custody Deployment Wiring");
    subsection("Creating the ledger, the role store, and the service directory...");

    let t = Instant::now();
    let ledger = Arc::new(AssetLedger::new());

    let root = AccountId::random();
    let access = Arc::new(AccessController::new(root));

    let directory = ServiceDirectory::new();
    directory.register(
        ASSET_LEDGER_SERVICE,
        ServiceHandle::Ledger(Arc::clone(&ledger)),
    );
    directory.register(
        ACCESS_CONTROL_SERVICE,
        ServiceHandle::AccessControl(Arc::clone(&access)),
    );

    let vault_account = AccountId::random();
    let vault = RedemptionVault::connect(vault_account, &directory)?;

    let operator = AccountId::random();
    access.grant(&root, Role::WithdrawalAdmin, operator)?;
    timing("wiring", t.elapsed());

    let desk = AccountId::random();
    let donor = AccountId::random();

    println!();
    address_display("Vault    ", &vault_account.to_address(), BLUE);
    address_display("Desk     ", &desk.to_address(), GREEN);
    address_display("Donor    ", &donor.to_address(), MAGENTA);
    println!();

    success("Vault wired to its backing services; operator holds the withdrawal role");

    // -----------------------------------------------------------------------
    // Step 2: Asset Listing and Funding
    // -----------------------------------------------------------------------

    section(2, "Asset Listing and Pool Funding");
    subsection("Registering the money market fund and clearing the cast...");

    let asset = ledger.register_asset(usd_money_market())?;
    let listing = ledger.asset_info(&asset)?;
    info("Asset", &format!("{} ({})", listing.name, listing.symbol));
    info("Asset ID", &listing.id.to_hex()[..16]);
    info(
        "Minimum holding",
        &format!("{} units", listing.min_holding),
    );

    for account in [vault_account, desk, donor] {
        ledger.clear_account(&asset, account)?;
    }

    subsection("Issuing 100,000,000 units into the vault's pool...");
    ledger.issue(&asset, vault_account, 100_000_000)?;

    println!();
    println!("  {BOLD}{WHITE}--- Opening Balances ---{RESET}");
    balance_row("Vault", ledger.balance_of(&asset, &vault_account)?, BLUE);
    balance_row("Desk", ledger.balance_of(&asset, &desk)?, GREEN);
    balance_row("Donor", ledger.balance_of(&asset, &donor)?, MAGENTA);
    println!();
    success("Pool funded; every position is on the right side of the floor");

    // -----------------------------------------------------------------------
    // Step 3: The Snapshot Exit, Griefed
    // -----------------------------------------------------------------------

    section(3, "Donation Griefing a Snapshot Exit");
    subsection("An integrator caches the pool balance, planning to transfer it later...");

    let snapshot = vault.pooled_balance(&asset)?;
    info("Cached balance", &snapshot.to_string());

    subsection("Meanwhile, the donor drops a single unit into the pool...");
    ledger.issue(&asset, donor, listing.min_holding + 1)?;
    ledger.transfer(&asset, &donor, &vault_account, 1)?;
    info(
        "Live pool balance",
        &ledger.balance_of(&asset, &vault_account)?.to_string(),
    );

    subsection("The integrator now submits a transfer for the cached figure...");
    let err = ledger
        .transfer(&asset, &vault_account, &desk, snapshot)
        .unwrap_err();
    blocked(&err.to_string());
    assert!(matches!(
        err,
        LedgerError::BelowMinimumHolding { residual: 1, .. }
    ));

    separator();
    println!();
    println!(
        "  {ITALIC}{DIM}One donated unit turned the planned residual into 1, inside the{RESET}"
    );
    println!(
        "  {ITALIC}{DIM}forbidden band below the floor. The cached figure will never settle,{RESET}"
    );
    println!(
        "  {ITALIC}{DIM}and the donor can repeat the trick after every re-observation.{RESET}"
    );
    println!();
    balance_row("Vault", ledger.balance_of(&asset, &vault_account)?, BLUE);
    balance_row("Desk", ledger.balance_of(&asset, &desk)?, GREEN);

    // -----------------------------------------------------------------------
    // Step 4: The Full-Balance Sweep
    // -----------------------------------------------------------------------

    section(4, "The Full-Balance Sweep");
    subsection("Same stale request, but through the vault -- watch the warning below:");
    println!();

    let t = Instant::now();
    let receipt = vault.withdraw_token(&operator, &asset, snapshot, &desk)?;
    timing("authorize + re-read + sweep", t.elapsed());

    println!();
    info("Sweep ID", &receipt.id.to_string());
    info("Requested (stale)", &receipt.requested_amount.to_string());
    info("Swept (live)", &receipt.swept_amount.to_string());
    info("Executed at", &receipt.executed_at.to_rfc3339());

    println!();
    println!("  {BOLD}{WHITE}--- Balances After the Sweep ---{RESET}");
    balance_row("Vault", ledger.balance_of(&asset, &vault_account)?, BLUE);
    balance_row("Desk", ledger.balance_of(&asset, &desk)?, GREEN);
    balance_row("Donor", ledger.balance_of(&asset, &donor)?, MAGENTA);
    println!();
    success("The sweep re-read the pool and took everything, donated unit included");

    // -----------------------------------------------------------------------
    // Step 5: Floor Hike Mid-Flight
    // -----------------------------------------------------------------------

    section(5, "Floor Raised Above the Pool, Mid-Flight");
    subsection("Refilling the pool, then the issuer triples the floor...");

    ledger.issue(&asset, vault_account, 100_000_000)?;
    ledger.set_min_holding(&asset, 150_000_000)?;
    info("New floor", "150000000 units");
    info(
        "Pool",
        &ledger.balance_of(&asset, &vault_account)?.to_string(),
    );

    subsection("A partial exit is boxed in by the new floor...");
    let err = ledger
        .transfer(&asset, &vault_account, &desk, 40_000_000)
        .unwrap_err();
    blocked(&err.to_string());

    subsection("...but a zero residual needs no floor. Sweeping:");
    let receipt = vault.withdraw_token(&operator, &asset, 100_000_000, &desk)?;
    info("Swept", &receipt.swept_amount.to_string());
    success("Full exit cleared under a floor higher than the pool itself");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Custody Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Assets listed", "1 (KEEL USD Money Market Fund)");
    info("Sweeps executed", "2");
    info("Griefing attempts shown", "1 (one donated unit)");
    info("Ledger rejections shown", "2 (both below-floor residuals)");
    info("Hash function", "BLAKE3 (account + asset IDs)");
    info("Address format", "Bech32 with 'keel' HRP");
    info("Ledger locking", "parking_lot RwLock, validate-then-mutate");
    info("Role store", "DashMap, fail-closed checks");
    println!();

    let vault_final = ledger.balance_of(&asset, &vault_account)?;
    let desk_final = ledger.balance_of(&asset, &desk)?;
    let donor_final = ledger.balance_of(&asset, &donor)?;

    println!("  {BOLD}{WHITE}Final Balances:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    balance_row("Vault", vault_final, BLUE);
    balance_row("Desk", desk_final, GREEN);
    balance_row("Donor", donor_final, MAGENTA);

    let in_accounts = vault_final + desk_final + donor_final;
    let issued = ledger.total_issued(&asset)?;
    assert_eq!(in_accounts, issued);
    println!();
    println!(
        "  {ITALIC}{DIM}Conservation check: {in_accounts} units across accounts, {issued} issued{RESET}"
    );

    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s{RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}
