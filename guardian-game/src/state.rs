use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::data::{Crisis, Decision};
use crate::indicators::{BlocRelationships, Indicators, Target, clamp_delta};

pub use crate::phase::GamePhase;

/// A crisis that is currently waiting for the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCrisis {
    pub crisis: Crisis,
    /// `elapsed_days` at activation.
    pub started_day: u32,
}

impl ActiveCrisis {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.crisis.id
    }

    #[must_use]
    pub const fn elapsed_days(&self, now: u32) -> u32 {
        now.saturating_sub(self.started_day)
    }
}

/// A consequence as it actually landed on the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedConsequence {
    #[serde(rename = "type")]
    pub target: Target,
    /// Requested delta.
    pub change: f32,
    /// Clamped value after the change.
    pub value_after: f32,
}

/// Audit-trail record appended on every resolution. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDecision {
    pub id: String,
    pub title: String,
    pub description: String,
    pub option_index: usize,
    pub option_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crisis_id: Option<String>,
    pub phase: GamePhase,
    pub month: u8,
    pub year: i32,
    pub consequences: Vec<AppliedConsequence>,
}

/// The single mutable aggregate for one play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub current_month: u8,
    pub current_year: i32,
    #[serde(default)]
    pub elapsed_days: u32,
    pub game_phase: GamePhase,
    pub term_progress: f32,
    pub current_decision: u32,
    pub total_decisions_in_era: u32,
    pub indicators: Indicators,
    pub bloc_relationships: BlocRelationships,
    #[serde(default)]
    pub decisions: Vec<ResolvedDecision>,
    #[serde(default)]
    pub current_crisis: Option<ActiveCrisis>,
    #[serde(default)]
    pub decision_queue: Vec<Decision>,
    #[serde(default)]
    pub triggered_event_ids: BTreeSet<String>,
    #[serde(default)]
    pub seen_crisis_ids: BTreeSet<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), 0)
    }
}

impl GameState {
    /// Fresh state at the start of the intro phase.
    #[must_use]
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        let mut state = Self {
            seed,
            current_month: config.start.month.clamp(1, 12),
            current_year: config.start.year,
            elapsed_days: 0,
            game_phase: GamePhase::Intro,
            term_progress: 0.0,
            current_decision: 0,
            total_decisions_in_era: config.phases.decisions_for(GamePhase::Intro),
            indicators: config.start.indicators,
            bloc_relationships: config.start.relationships,
            decisions: Vec::new(),
            current_crisis: None,
            decision_queue: Vec::new(),
            triggered_event_ids: BTreeSet::new(),
            seen_crisis_ids: BTreeSet::new(),
        };
        for target in Target::ALL {
            state.apply_delta(*target, 0.0);
        }
        state.recompute_term_progress();
        state
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Current value of a gauge.
    #[must_use]
    pub const fn value(&self, target: Target) -> f32 {
        match target {
            Target::MarketStability => self.indicators.market_stability,
            Target::PublicConfidence => self.indicators.public_confidence,
            Target::TechAdvancement => self.indicators.tech_advancement,
            Target::WesternAlliance => self.bloc_relationships.western_alliance,
            Target::EasternBloc => self.bloc_relationships.eastern_bloc,
            Target::GlobalSouth => self.bloc_relationships.global_south,
        }
    }

    const fn slot_mut(&mut self, target: Target) -> &mut f32 {
        match target {
            Target::MarketStability => &mut self.indicators.market_stability,
            Target::PublicConfidence => &mut self.indicators.public_confidence,
            Target::TechAdvancement => &mut self.indicators.tech_advancement,
            Target::WesternAlliance => &mut self.bloc_relationships.western_alliance,
            Target::EasternBloc => &mut self.bloc_relationships.eastern_bloc,
            Target::GlobalSouth => &mut self.bloc_relationships.global_south,
        }
    }

    /// Add `delta` to a gauge, clamping silently to its bound.
    pub fn apply_delta(&mut self, target: Target, delta: f32) -> f32 {
        clamp_delta(self.slot_mut(target), target, delta)
    }

    #[must_use]
    pub fn has_resolved(&self, decision_id: &str) -> bool {
        self.decisions.iter().any(|entry| entry.id == decision_id)
    }

    #[must_use]
    pub fn queued_decision(&self, decision_id: &str) -> Option<&Decision> {
        self.decision_queue
            .iter()
            .find(|decision| decision.id == decision_id)
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_phase.is_terminal()
    }

    /// Days the active crisis has been waiting, if one is active.
    #[must_use]
    pub fn crisis_elapsed_days(&self) -> Option<u32> {
        self.current_crisis
            .as_ref()
            .map(|active| active.elapsed_days(self.elapsed_days))
    }
}
