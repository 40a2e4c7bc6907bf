//! Protocol Guardian Game Engine
//!
//! Platform-agnostic simulation core for the Protocol Guardian policy game:
//! bounded indicators, a read-only content catalog, event triggers, crisis
//! timers and the five-era phase ladder. No rendering, routing or storage
//! backend lives here.

pub mod config;
pub mod consequences;
pub mod constants;
pub mod data;
pub mod error;
pub mod indicators;
pub mod notice;
pub mod numbers;
pub mod phase;
pub mod result;
pub mod selection;
pub mod session;
pub mod state;
pub mod triggers;

use std::sync::Arc;

use anyhow::Context;

// Re-export commonly used types
pub use config::{EngineConfig, StartingValues};
pub use consequences::{
    ExpiredCrisis, ResolutionOutcome, expire_crisis, failure_consequences, mark_event_triggered,
    resolve_decision,
};
pub use data::{
    Consequence, ContentCatalog, Crisis, Decision, DecisionOption, EventStatus, GameEvent,
    Priority, TriggerConditions, Urgency, ValueRange,
};
pub use error::{CatalogError, EngineError};
pub use indicators::{BlocRelationships, Indicators, Target};
pub use notice::{Notice, NoticeKind, NoticeSeverity, SelectionTrace, UiSurfaceHint};
pub use phase::{GamePhase, PhaseSchedule};
pub use result::{Ending, Grade, OutcomeConfig, OutcomeSummary, outcome_summary};
pub use session::{AdvanceOutcome, CrisisActivation, CrisisSelector, GameSession};
pub use state::{ActiveCrisis, AppliedConsequence, GameState, ResolvedDecision};
pub use triggers::{TriggerClause, is_eligible, triggered_events};

/// Source of catalog content and configuration.
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the decision, crisis and event catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<ContentCatalog, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Snapshot persistence. The backend is up to the platform.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error>;

    /// Load game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Config name passed to [`DataLoader::load_config`] for the engine settings.
pub const ENGINE_CONFIG_NAME: &str = "engine";

/// Main entry point: builds sessions and moves snapshots through storage.
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    fn load_parts(&self) -> Result<(Arc<ContentCatalog>, EngineConfig), L::Error> {
        let catalog = self.data_loader.load_catalog()?;
        let config = self.data_loader.load_config(ENGINE_CONFIG_NAME)?;
        Ok((Arc::new(catalog), config))
    }

    /// Fresh session for `seed`, still in the intro phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or configuration cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<GameSession, L::Error> {
        let (catalog, config) = self.load_parts()?;
        Ok(GameSession::new(catalog, config, seed))
    }

    /// Starting state for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or configuration cannot be loaded.
    pub fn create_game(&self, seed: u64) -> Result<GameState, L::Error> {
        self.create_session(seed).map(GameSession::into_state)
    }

    /// Save a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, game_state)
    }

    /// Load a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn load_game(&self, save_name: &str) -> Result<Option<GameState>, anyhow::Error> {
        self.storage
            .load_game(save_name)
            .with_context(|| format!("loading save {save_name}"))
    }

    /// Resume a saved game as a live session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage, catalog or configuration loading fails.
    pub fn resume_session(&self, save_name: &str) -> Result<Option<GameSession>, anyhow::Error> {
        let Some(state) = self.load_game(save_name)? else {
            return Ok(None);
        };
        let (catalog, config) = self
            .load_parts()
            .context("loading catalog for resumed session")?;
        Ok(Some(GameSession::from_state(catalog, config, state)))
    }

    /// Delete a saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
