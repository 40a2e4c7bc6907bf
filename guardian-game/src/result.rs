//! End-of-term scoring and ending selection.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{FLOAT_EPSILON, SCORE_MAX};
use crate::indicators::Target;
use crate::numbers::round_f64_to_i32;
use crate::state::GameState;

/// Scoring and ending thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Share of the score earned from the three indicators; the rest comes
    /// from bloc relationships.
    pub indicator_share: f64,
    /// Any indicator at or below this ends the term in collapse.
    pub collapse_threshold: f32,
    /// Mean relationship at or below this ends the term in isolation.
    pub isolation_threshold: f32,
    /// Mean indicator at or above this, with no bloc hostile, is a thriving term.
    pub thriving_threshold: f32,
    pub hostile_threshold: f32,
    /// Minimum score per grade, best grade first.
    pub grade_floors: Vec<(Grade, i32)>,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            indicator_share: 0.7,
            collapse_threshold: 10.0,
            isolation_threshold: -40.0,
            thriving_threshold: 70.0,
            hostile_threshold: -25.0,
            grade_floors: vec![
                (Grade::S, 850),
                (Grade::A, 700),
                (Grade::B, 550),
                (Grade::C, 400),
                (Grade::D, 250),
            ],
        }
    }
}

/// Ending archetype, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ending {
    /// A core indicator bottomed out.
    Collapse,
    /// The protocol lost the blocs.
    Isolation,
    /// Strong indicators and no hostile bloc.
    Thriving,
    Steady,
}

impl Ending {
    #[must_use]
    pub const fn headline_key(self) -> &'static str {
        match self {
            Self::Collapse => "result.headline.collapse",
            Self::Isolation => "result.headline.isolation",
            Self::Thriving => "result.headline.thriving",
            Self::Steady => "result.headline.steady",
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collapse => write!(f, "collapse"),
            Self::Isolation => write!(f, "isolation"),
            Self::Thriving => write!(f, "thriving"),
            Self::Steady => write!(f, "steady"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(label)
    }
}

/// Summary of a finished term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub ending: Ending,
    pub headline_key: String,
    pub score: i32,
    pub grade: Grade,
    pub strongest_bloc: Target,
    pub weakest_bloc: Target,
    pub decisions_made: usize,
    pub crises_handled: usize,
    pub events_seen: usize,
    pub final_month: u8,
    pub final_year: i32,
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().map(|value| f64::from(*value)).sum();
    total / f64::from(u32::try_from(values.len()).unwrap_or(1))
}

/// Score in `0..=SCORE_MAX`.
///
/// Indicators count as-is; relationships are rescaled from `[-100, 100]`
/// into `[0, 100]` before weighting.
#[must_use]
pub fn score_state(state: &GameState, cfg: &OutcomeConfig) -> i32 {
    let indicators = mean(&[
        state.indicators.market_stability,
        state.indicators.public_confidence,
        state.indicators.tech_advancement,
    ]);
    let relationships = mean(&[
        state.bloc_relationships.western_alliance,
        state.bloc_relationships.eastern_bloc,
        state.bloc_relationships.global_south,
    ]);
    let share = cfg.indicator_share.clamp(0.0, 1.0);
    let normalized = indicators.mul_add(share, (relationships + 100.0) / 2.0 * (1.0 - share));
    round_f64_to_i32(normalized * f64::from(SCORE_MAX) / 100.0).clamp(0, SCORE_MAX)
}

#[must_use]
pub fn grade_for(score: i32, cfg: &OutcomeConfig) -> Grade {
    cfg.grade_floors
        .iter()
        .find(|(_, floor)| score >= *floor)
        .map_or(Grade::F, |(grade, _)| *grade)
}

#[must_use]
pub fn select_ending(state: &GameState, cfg: &OutcomeConfig) -> Ending {
    let indicators = state.indicators;
    let lowest = indicators
        .market_stability
        .min(indicators.public_confidence)
        .min(indicators.tech_advancement);
    if lowest <= cfg.collapse_threshold {
        return Ending::Collapse;
    }
    let blocs = state.bloc_relationships;
    let relationships = [blocs.western_alliance, blocs.eastern_bloc, blocs.global_south];
    if mean(&relationships) <= f64::from(cfg.isolation_threshold) + FLOAT_EPSILON {
        return Ending::Isolation;
    }
    let indicator_mean = mean(&[
        indicators.market_stability,
        indicators.public_confidence,
        indicators.tech_advancement,
    ]);
    let none_hostile = relationships
        .iter()
        .all(|value| *value > cfg.hostile_threshold);
    if indicator_mean + FLOAT_EPSILON >= f64::from(cfg.thriving_threshold) && none_hostile {
        return Ending::Thriving;
    }
    Ending::Steady
}

/// Summary of the term, or `None` while the game is still running.
#[must_use]
pub fn outcome_summary(state: &GameState, cfg: &OutcomeConfig) -> Option<OutcomeSummary> {
    if !state.is_over() {
        return None;
    }
    let ending = select_ending(state, cfg);
    let score = score_state(state, cfg);
    Some(OutcomeSummary {
        ending,
        headline_key: ending.headline_key().to_string(),
        score,
        grade: grade_for(score, cfg),
        strongest_bloc: state.bloc_relationships.strongest(),
        weakest_bloc: state.bloc_relationships.weakest(),
        decisions_made: state.decisions.len(),
        crises_handled: state
            .decisions
            .iter()
            .filter(|entry| entry.crisis_id.is_some())
            .count(),
        events_seen: state.triggered_event_ids.len(),
        final_month: state.current_month,
        final_year: state.current_year,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]
    use super::*;
    use crate::state::GamePhase;

    fn ended() -> GameState {
        let mut state = GameState::default();
        state.game_phase = GamePhase::Ending;
        state
    }

    #[test]
    fn summary_waits_for_ending() {
        let cfg = OutcomeConfig::default();
        assert!(outcome_summary(&GameState::default(), &cfg).is_none());
        assert!(outcome_summary(&ended(), &cfg).is_some());
    }

    #[test]
    fn score_spans_full_range() {
        let cfg = OutcomeConfig::default();
        let mut state = ended();
        state.indicators.market_stability = 100.0;
        state.indicators.public_confidence = 100.0;
        state.indicators.tech_advancement = 100.0;
        state.bloc_relationships.western_alliance = 100.0;
        state.bloc_relationships.eastern_bloc = 100.0;
        state.bloc_relationships.global_south = 100.0;
        assert_eq!(score_state(&state, &cfg), SCORE_MAX);
        assert_eq!(grade_for(SCORE_MAX, &cfg), Grade::S);

        state.indicators.market_stability = 0.0;
        state.indicators.public_confidence = 0.0;
        state.indicators.tech_advancement = 0.0;
        state.bloc_relationships.western_alliance = -100.0;
        state.bloc_relationships.eastern_bloc = -100.0;
        state.bloc_relationships.global_south = -100.0;
        assert_eq!(score_state(&state, &cfg), 0);
        assert_eq!(grade_for(0, &cfg), Grade::F);
    }

    #[test]
    fn default_start_scores_mid_table() {
        // indicators mean 43.33 weighted 0.7, relationships neutral at 50 weighted 0.3
        let cfg = OutcomeConfig::default();
        assert_eq!(score_state(&GameState::default(), &cfg), 453);
        assert_eq!(grade_for(453, &cfg), Grade::C);
    }

    #[test]
    fn endings_follow_priority() {
        let cfg = OutcomeConfig::default();
        let mut state = ended();
        state.indicators.public_confidence = 5.0;
        state.bloc_relationships.eastern_bloc = -100.0;
        assert_eq!(select_ending(&state, &cfg), Ending::Collapse);

        state.indicators.public_confidence = 60.0;
        state.bloc_relationships.western_alliance = -50.0;
        state.bloc_relationships.global_south = -20.0;
        assert_eq!(select_ending(&state, &cfg), Ending::Isolation);

        state.indicators.market_stability = 80.0;
        state.indicators.public_confidence = 80.0;
        state.indicators.tech_advancement = 80.0;
        state.bloc_relationships.western_alliance = 10.0;
        state.bloc_relationships.eastern_bloc = -10.0;
        state.bloc_relationships.global_south = 0.0;
        assert_eq!(select_ending(&state, &cfg), Ending::Thriving);

        state.bloc_relationships.eastern_bloc = -30.0;
        assert_eq!(select_ending(&state, &cfg), Ending::Steady);
    }

    #[test]
    fn summary_names_blocs() {
        let mut state = ended();
        state.bloc_relationships.global_south = 40.0;
        state.bloc_relationships.eastern_bloc = -15.0;
        let summary = outcome_summary(&state, &OutcomeConfig::default()).unwrap();
        assert_eq!(summary.strongest_bloc, Target::GlobalSouth);
        assert_eq!(summary.weakest_bloc, Target::EasternBloc);
        assert_eq!(summary.headline_key, summary.ending.headline_key());
    }
}
