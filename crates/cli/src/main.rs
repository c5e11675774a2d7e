//! Kresko CLI - Main entry point

use clap::{Parser, Subcommand};
use kresko_cli::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info_span;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "kresko")]
#[command(about = "Kresko - synthetic asset protocol simulator", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Correlation ID attached to this invocation's logs
    #[arg(long, global = true)]
    correlation_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the simulation from a setup file
    Init {
        /// Setup JSON (params, assets, roles, prices)
        #[arg(long)]
        config: PathBuf,
    },

    /// Credit an external wallet with collateral tokens
    Fund {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Set an oracle price
    SetPrice {
        /// Feed identifier, e.g. TSLA/USD
        feed: String,
        /// USD price
        price: Decimal,
        /// Open or close the feed's market
        #[arg(long)]
        market_open: Option<bool>,
    },

    /// Move the simulation clock forward
    Advance {
        /// Seconds to advance
        secs: u64,
    },

    /// Deposit collateral from the account's wallet
    Deposit {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Withdraw collateral to the account's wallet
    Withdraw {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Mint a krAsset against deposited collateral
    Mint {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Burn a krAsset to repay debt
    Burn {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Liquidate an undercollateralized account
    Liquidate {
        /// Account repaying the debt
        liquidator: String,
        /// Account being liquidated
        account: String,
        /// krAsset to repay
        #[arg(long)]
        repay: String,
        /// Collateral asset to seize
        #[arg(long)]
        seize: String,
        /// Amount to repay (defaults to the maximum)
        #[arg(long)]
        amount: Option<Decimal>,
    },

    /// Rebase a krAsset (admin only)
    Rebase {
        caller: String,
        asset: String,
        /// Rebase denominator, at least 1
        denominator: Decimal,
        /// Shrink balances instead of growing them
        #[arg(long)]
        negative: bool,
    },

    /// Transfer krAsset tokens between accounts
    Transfer {
        asset: String,
        from: String,
        to: String,
        amount: Decimal,
    },

    /// Show an account's positions and health
    Account {
        account: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let correlation_id = cli
        .correlation_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = info_span!("command", correlation_id = %correlation_id);
    let _guard = span.enter();

    match cli.command {
        Commands::Init { config } => {
            commands::init(&cli.data, &config)?;
        }
        command => {
            let mut ctx = AppContext::open(&cli.data)?;
            run(&mut ctx, command)?;
        }
    }

    Ok(())
}

fn run(ctx: &mut AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } => anyhow::bail!("Simulation already open"),

        Commands::Fund { account, asset, amount } => {
            commands::fund(ctx, &account, &asset, amount)?;
        }

        Commands::SetPrice {
            feed,
            price,
            market_open,
        } => {
            commands::set_price(ctx, &feed, price, market_open)?;
        }

        Commands::Advance { secs } => {
            commands::advance(ctx, secs)?;
        }

        Commands::Deposit { account, asset, amount } => {
            commands::deposit(ctx, &account, &asset, amount)?;
        }

        Commands::Withdraw { account, asset, amount } => {
            commands::withdraw(ctx, &account, &asset, amount)?;
        }

        Commands::Mint { account, asset, amount } => {
            commands::mint(ctx, &account, &asset, amount)?;
        }

        Commands::Burn { account, asset, amount } => {
            commands::burn(ctx, &account, &asset, amount)?;
        }

        Commands::Liquidate {
            liquidator,
            account,
            repay,
            seize,
            amount,
        } => {
            commands::liquidate(ctx, &liquidator, &account, &repay, &seize, amount)?;
        }

        Commands::Rebase {
            caller,
            asset,
            denominator,
            negative,
        } => {
            commands::rebase(ctx, &caller, &asset, denominator, !negative)?;
        }

        Commands::Transfer { asset, from, to, amount } => {
            commands::transfer(ctx, &asset, &from, &to, amount)?;
        }

        Commands::Account { account, json } => {
            commands::account(ctx, &account, json)?;
        }
    }

    Ok(())
}
