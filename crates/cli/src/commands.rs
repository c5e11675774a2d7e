//! CLI commands
//!
//! Amounts are whole-token decimals, converted to native units with the
//! asset's decimals. Every mutating command saves the snapshot on success;
//! a rejected command leaves it untouched.

use std::path::Path;

use chrono::DateTime;
use kresko_core::{AccountId, AssetId, Wad};
use kresko_protocol::{AccountHealth, LiquidationRequest};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::SetupConfig;
use crate::context::AppContext;

/// Create the simulation from a setup file
pub fn init(data: &Path, config: &Path) -> Result<AppContext, anyhow::Error> {
    let setup = SetupConfig::from_file(config)?;
    let ctx = AppContext::init(data, &setup)?;

    println!(
        "✅ Simulation initialized: {} krAssets, {} collateral assets",
        setup.kresko_assets.len(),
        setup.collaterals.len()
    );
    println!("   State saved to {}", ctx.state_path().display());
    Ok(ctx)
}

/// Credit an external wallet with collateral tokens
pub fn fund(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let (account, asset) = (account.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    let native = ctx.to_native(&asset, amount)?;
    let balance = ctx.protocol.vault_mut().fund(&account, &asset, native)?;
    ctx.save()?;

    println!(
        "✅ Funded {} {} to {} (wallet: {})",
        amount,
        asset,
        account,
        ctx.to_display(&asset, balance)?
    );
    Ok(())
}

/// Set a feed price and optionally its market status
pub fn set_price(ctx: &mut AppContext, feed: &str, price: Decimal, market_open: Option<bool>) -> Result<(), anyhow::Error> {
    ctx.oracle.set_price(feed, Wad::try_from(price)?);
    if let Some(open) = market_open {
        ctx.oracle.set_market_open(feed, open)?;
    }
    ctx.save()?;

    let status = match market_open {
        Some(false) => " (market closed)",
        Some(true) => " (market open)",
        None => "",
    };
    println!("✅ {} = {} USD{}", feed, price, status);
    Ok(())
}

/// Move the simulation clock forward
pub fn advance(ctx: &mut AppContext, secs: u64) -> Result<(), anyhow::Error> {
    let now = ctx.clock.advance(secs);
    ctx.save()?;

    let at = i64::try_from(now)
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| now.to_string());
    println!("✅ Clock advanced {}s to {}", secs, at);
    Ok(())
}

pub fn deposit(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let (account, asset) = (account.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    let native = ctx.to_native(&asset, amount)?;
    ctx.protocol.deposit_collateral(&account, &asset, native)?;
    ctx.save()?;

    println!("✅ Deposited {} {} for {}", amount, asset, account);
    Ok(())
}

pub fn withdraw(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let (account, asset) = (account.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    let native = ctx.to_native(&asset, amount)?;
    ctx.protocol.withdraw_collateral(&account, &asset, native, None)?;
    ctx.save()?;

    println!("✅ Withdrew {} {} for {}", amount, asset, account);
    Ok(())
}

pub fn mint(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let (account, asset) = (account.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    let native = ctx.to_native(&asset, amount)?;
    ctx.protocol.mint_kresko_asset(&account, &asset, native)?;
    ctx.save()?;

    let debt = ctx.protocol.kresko_asset_debt(&account, &asset)?;
    println!(
        "✅ Minted {} {} for {} (debt: {})",
        amount,
        asset,
        account,
        ctx.to_display(&asset, debt)?
    );
    Ok(())
}

pub fn burn(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let (account, asset) = (account.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    let native = ctx.to_native(&asset, amount)?;
    ctx.protocol.burn_kresko_asset(&account, &asset, native, None)?;
    ctx.save()?;

    let debt = ctx.protocol.kresko_asset_debt(&account, &asset)?;
    println!(
        "✅ Burned {} {} for {} (debt: {})",
        amount,
        asset,
        account,
        ctx.to_display(&asset, debt)?
    );
    Ok(())
}

/// Liquidate `account`, repaying `amount` of `repay_asset` or the current
/// maximum when no amount is given
pub fn liquidate(
    ctx: &mut AppContext,
    liquidator: &str,
    account: &str,
    repay_asset: &str,
    seize_asset: &str,
    amount: Option<Decimal>,
) -> Result<(), anyhow::Error> {
    let liquidator = liquidator.parse::<AccountId>()?;
    let account = account.parse::<AccountId>()?;
    let repay_asset = repay_asset.parse::<AssetId>()?;
    let seize_asset = seize_asset.parse::<AssetId>()?;

    let repay = match amount {
        Some(amount) => ctx.to_native(&repay_asset, amount)?,
        None => ctx.protocol.max_repay_amount(&account, &repay_asset, &seize_asset)?,
    };
    if repay == 0 {
        anyhow::bail!("Nothing to repay for {} in {}", account, repay_asset);
    }

    let request = LiquidationRequest::new(account, repay_asset, repay, seize_asset);
    let outcome = ctx.protocol.liquidate(&liquidator, request)?;
    ctx.save()?;

    println!(
        "✅ {} liquidated {}: repaid {} {} ({} USD), seized {} {} (fee {})",
        outcome.liquidator,
        outcome.account,
        ctx.to_display(&outcome.repay_asset, outcome.repaid)?,
        outcome.repay_asset,
        outcome.repay_value,
        ctx.to_display(&outcome.seize_asset, outcome.seized)?,
        outcome.seize_asset,
        ctx.to_display(&outcome.seize_asset, outcome.fee)?,
    );
    Ok(())
}

pub fn rebase(
    ctx: &mut AppContext,
    caller: &str,
    asset: &str,
    denominator: Decimal,
    positive: bool,
) -> Result<(), anyhow::Error> {
    let (caller, asset) = (caller.parse::<AccountId>()?, asset.parse::<AssetId>()?);
    ctx.protocol.rebase(&caller, &asset, Wad::try_from(denominator)?, positive)?;
    ctx.save()?;

    let direction = if positive { "positive" } else { "negative" };
    println!("✅ Rebased {} by {} ({})", asset, denominator, direction);
    Ok(())
}

pub fn transfer(ctx: &mut AppContext, asset: &str, from: &str, to: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    let asset = asset.parse::<AssetId>()?;
    let (from, to) = (from.parse::<AccountId>()?, to.parse::<AccountId>()?);
    let native = ctx.to_native(&asset, amount)?;
    ctx.protocol.transfer(&asset, &from, &to, native)?;
    ctx.save()?;

    println!("✅ Transferred {} {} from {} to {}", amount, asset, from, to);
    Ok(())
}

/// One line of an account report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionLine {
    pub asset: AssetId,
    pub amount: Decimal,
    pub value: Wad,
}

/// Positions and health of an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    pub account: AccountId,
    pub collateral: Vec<PositionLine>,
    pub debt: Vec<PositionLine>,
    pub collateral_value: Wad,
    pub debt_value: Wad,
    pub collateral_ratio: Option<Wad>,
    pub health: AccountHealth,
}

pub fn account_report(ctx: &AppContext, account: &str) -> Result<AccountReport, anyhow::Error> {
    let account = account.parse::<AccountId>()?;
    let protocol = &ctx.protocol;

    let mut collateral = Vec::new();
    for asset in protocol.deposited_collateral_assets(&account) {
        let native = protocol.collateral_deposits(&account, asset)?;
        let (value, _) = protocol.collateral_value_and_oracle_price(asset, native, false)?;
        collateral.push(PositionLine {
            asset: asset.clone(),
            amount: ctx.to_display(asset, native)?,
            value,
        });
    }

    let mut debt = Vec::new();
    for asset in protocol.minted_kresko_assets(&account) {
        let native = protocol.kresko_asset_debt(&account, asset)?;
        debt.push(PositionLine {
            asset: asset.clone(),
            amount: ctx.to_display(asset, native)?,
            value: protocol.kr_asset_value(asset, native, false)?,
        });
    }

    Ok(AccountReport {
        collateral_value: protocol.account_collateral_value(&account)?,
        debt_value: protocol.account_kr_asset_value(&account)?,
        collateral_ratio: protocol.account_collateral_ratio(&account)?,
        health: protocol.account_health(&account)?,
        account,
        collateral,
        debt,
    })
}

/// Print an account's positions
pub fn account(ctx: &AppContext, account: &str, json: bool) -> Result<(), anyhow::Error> {
    let report = account_report(ctx, account)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Account {}", report.account);
    println!("{:-<60}", "");
    println!("{:<12} | {:>20} | {:>20}", "Collateral", "Amount", "Value (USD)");
    for line in &report.collateral {
        println!("{:<12} | {:>20} | {:>20}", line.asset, line.amount, line.value);
    }
    println!("{:<12} | {:>20} | {:>20}", "Debt", "Amount", "Value (USD)");
    for line in &report.debt {
        println!("{:<12} | {:>20} | {:>20}", line.asset, line.amount, line.value);
    }
    println!("{:-<60}", "");
    println!("Collateral value: {}", report.collateral_value);
    println!("Debt value:       {}", report.debt_value);
    match report.collateral_ratio {
        Some(ratio) => println!("Ratio:            {}", ratio),
        None => println!("Ratio:            -"),
    }
    println!("Health:           {:?}", report.health);
    Ok(())
}
