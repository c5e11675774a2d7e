//! Application context - wires the protocol to its persisted snapshot

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kresko_core::amount::{from_wad, to_wad};
use kresko_core::{AssetId, MathError, Rounding, Wad};
use kresko_oracle::{MockOracle, PriceQuote};
use kresko_protocol::{Clock, InMemoryVault, ManualClock, Protocol, ProtocolError, ProtocolState, SystemClock};
use kresko_registry::{RegistryError, RoleRegistry, KRASSET_DECIMALS};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SetupConfig;

const STATE_FILE: &str = "state.json";

/// Everything a CLI invocation needs to resume the simulation
#[derive(Deserialize)]
struct Snapshot {
    state: ProtocolState,
    vault: InMemoryVault,
    roles: RoleRegistry,
    quotes: Vec<PriceQuote>,
    now: u64,
}

/// Application context - protocol plus the shared handles the CLI mutates
pub struct AppContext {
    pub protocol: Protocol,
    pub oracle: Arc<MockOracle>,
    pub clock: Arc<ManualClock>,
    roles: RoleRegistry,
    state_path: PathBuf,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("clock", &self.clock)
            .field("roles", &self.roles)
            .field("state_path", &self.state_path)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Create a fresh simulation from a setup file
    pub fn init(data_path: impl AsRef<Path>, setup: &SetupConfig) -> Result<Self, ContextError> {
        let data_path = data_path.as_ref();
        let state_path = data_path.join(STATE_FILE);
        if state_path.exists() {
            return Err(ContextError::AlreadyInitialized(state_path));
        }
        std::fs::create_dir_all(data_path)?;

        let oracle = Arc::new(MockOracle::new());
        for (feed, price) in &setup.prices {
            oracle.set_price(feed, *price);
        }
        let clock = Arc::new(ManualClock::new(SystemClock.now()));
        let roles = setup.roles();

        let mut protocol = Protocol::new(
            setup.params.clone(),
            oracle.clone(),
            Arc::new(roles.clone()),
            InMemoryVault::new(),
            clock.clone(),
        )?;
        for (asset, config) in &setup.kresko_assets {
            protocol.add_kresko_asset(&setup.admin, asset.clone(), config.clone())?;
        }
        for (asset, config) in &setup.collaterals {
            protocol.add_collateral_asset(&setup.admin, asset.clone(), config.clone())?;
        }

        let ctx = Self {
            protocol,
            oracle,
            clock,
            roles,
            state_path,
        };
        ctx.save()?;
        info!(path = %ctx.state_path.display(), "Simulation initialized");
        Ok(ctx)
    }

    /// Resume the simulation stored under `data_path`. The clock moves
    /// forward to wall time but never back.
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let state_path = data_path.as_ref().join(STATE_FILE);
        if !state_path.exists() {
            return Err(ContextError::NotInitialized(state_path));
        }
        let content = std::fs::read_to_string(&state_path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;

        let oracle = Arc::new(MockOracle::from_quotes(snapshot.quotes));
        let clock = Arc::new(ManualClock::new(snapshot.now.max(SystemClock.now())));
        let protocol = Protocol::from_state(
            snapshot.state,
            oracle.clone(),
            Arc::new(snapshot.roles.clone()),
            snapshot.vault,
            clock.clone(),
        );
        debug!(path = %state_path.display(), now = clock.now(), "Simulation loaded");

        Ok(Self {
            protocol,
            oracle,
            clock,
            roles: snapshot.roles,
            state_path,
        })
    }

    /// Write the current snapshot, replacing the previous one atomically
    pub fn save(&self) -> Result<(), ContextError> {
        let snapshot = SnapshotRef {
            state: self.protocol.state(),
            vault: self.protocol.vault(),
            roles: &self.roles,
            quotes: self.oracle.snapshot(),
            now: self.clock.now(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.state_path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.state_path)?;
        Ok(())
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    /// Native decimals of a collateral asset or krAsset
    pub fn decimals(&self, asset: &AssetId) -> Result<u8, ContextError> {
        let registry = &self.protocol.state().registry;
        if registry.is_kresko_asset(asset) {
            return Ok(KRASSET_DECIMALS);
        }
        Ok(registry.collateral(asset)?.decimals)
    }

    /// Whole-token decimal to native units of `asset`
    pub fn to_native(&self, asset: &AssetId, amount: Decimal) -> Result<u128, ContextError> {
        let value = Wad::try_from(amount)?;
        Ok(from_wad(value, self.decimals(asset)?, Rounding::Down)?)
    }

    /// Native units of `asset` to a whole-token decimal
    pub fn to_display(&self, asset: &AssetId, amount: u128) -> Result<Decimal, ContextError> {
        let value = to_wad(amount, self.decimals(asset)?)?;
        Ok(value.to_decimal()?)
    }
}

/// Borrowing twin of [`Snapshot`] used on save
#[derive(Serialize)]
struct SnapshotRef<'a> {
    state: &'a ProtocolState,
    vault: &'a InMemoryVault,
    roles: &'a RoleRegistry,
    quotes: Vec<PriceQuote>,
    now: u64,
}

/// Errors while loading or saving the simulation
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Simulation already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("No simulation at {}; run `kresko init` first", .0.display())]
    NotInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
