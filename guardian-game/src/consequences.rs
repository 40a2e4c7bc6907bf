//! Consequence application: the only code paths that move gauges.
//!
//! Every entry point validates completely before the first write, so a
//! returned error always leaves the state untouched.
use serde::{Deserialize, Serialize};

use crate::data::{Consequence, Crisis, Decision, GameEvent};
use crate::error::EngineError;
use crate::indicators::Target;
use crate::phase::{GamePhase, PhaseSchedule};
use crate::state::{AppliedConsequence, GameState, ResolvedDecision};

/// What a successful resolution changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub record: ResolvedDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_crisis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_entered: Option<GamePhase>,
    /// Crisis left open when this resolution ended the term. It is closed
    /// without its failure set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at_ending: Option<String>,
}

/// A crisis that ran out of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiredCrisis {
    pub crisis_id: String,
    pub applied: Vec<AppliedConsequence>,
}

fn apply_all(state: &mut GameState, consequences: &[Consequence]) -> Vec<AppliedConsequence> {
    consequences
        .iter()
        .map(|consequence| AppliedConsequence {
            target: consequence.target,
            change: consequence.delta,
            value_after: state.apply_delta(consequence.target, consequence.delta),
        })
        .collect()
}

/// Apply the selected option of `decision` and record it in the history.
///
/// The decision leaves the queue, or clears the active crisis when it
/// belongs to it, and the decision counter advances by one before the phase
/// ladder is re-checked. A crisis still active once the ending is reached
/// is closed without penalty, since nothing may move the final gauges.
/// Calling this twice for the same resolution applies
/// it twice; callers guard against duplicate submission.
///
/// # Errors
///
/// Returns [`EngineError::InvalidOption`] when `option_index` is out of range.
pub fn resolve_decision(
    state: &mut GameState,
    decision: &Decision,
    option_index: usize,
    schedule: &PhaseSchedule,
) -> Result<ResolutionOutcome, EngineError> {
    let option = decision
        .option(option_index)
        .ok_or_else(|| EngineError::InvalidOption {
            decision_id: decision.id.clone(),
            index: option_index,
            available: decision.options.len(),
        })?;

    let crisis_id = state
        .current_crisis
        .as_ref()
        .filter(|active| active.crisis.decision(&decision.id).is_some())
        .map(|active| active.id().to_string());

    let applied = apply_all(state, &option.consequences);
    let record = ResolvedDecision {
        id: decision.id.clone(),
        title: decision.title.clone(),
        description: decision.description.clone(),
        option_index,
        option_label: option.label.clone(),
        crisis_id: crisis_id.clone(),
        phase: state.game_phase,
        month: state.current_month,
        year: state.current_year,
        consequences: applied,
    };
    state.decisions.push(record.clone());

    if crisis_id.is_some() {
        state.current_crisis = None;
    } else {
        state.decision_queue.retain(|queued| queued.id != decision.id);
    }

    state.current_decision = state.current_decision.saturating_add(1);
    state.recompute_term_progress();
    let phase_entered = state.advance_phase_if_complete(schedule);
    let closed_at_ending = if state.game_phase.is_terminal() {
        state.current_crisis.take().map(|active| {
            log::info!("crisis {} closed by the end of the term", active.id());
            active.id().to_string()
        })
    } else {
        None
    };

    log::debug!(
        "resolved {} option {} (history {})",
        decision.id,
        option_index,
        state.decisions.len()
    );

    Ok(ResolutionOutcome {
        record,
        cleared_crisis: crisis_id,
        phase_entered,
        closed_at_ending,
    })
}

/// Record delivery of `event` and apply its consequences.
///
/// Returns `false` without touching the state when the event was already
/// delivered, so a retried delivery never double-applies.
pub fn mark_event_triggered(state: &mut GameState, event: &GameEvent) -> bool {
    if !state.triggered_event_ids.insert(event.id.clone()) {
        return false;
    }
    apply_all(state, &event.consequences);
    log::debug!("event {} delivered", event.id);
    true
}

/// Failure set for a crisis that timed out.
///
/// The crisis's own table wins, then its first "no response" option, then a
/// flat penalty to public confidence.
#[must_use]
pub fn failure_consequences(crisis: &Crisis, default_penalty: f32) -> Vec<Consequence> {
    if let Some(table) = &crisis.expiry_consequences {
        return table.clone();
    }
    if let Some(option) = crisis.no_response_option() {
        return option.consequences.clone();
    }
    vec![Consequence::new(Target::PublicConfidence, default_penalty)]
}

/// Expire the active crisis when `elapsed_days` has reached its time limit.
///
/// Crises without a time limit never expire. The crisis is cleared in the
/// same step that applies the failure set, so the penalty lands once.
pub fn expire_crisis(
    state: &mut GameState,
    elapsed_days: u32,
    default_penalty: f32,
) -> Option<ExpiredCrisis> {
    let active = state.current_crisis.as_ref()?;
    let limit = active.crisis.time_limit?;
    if elapsed_days < limit {
        return None;
    }
    let failure = failure_consequences(&active.crisis, default_penalty);
    let crisis_id = active.id().to_string();
    state.current_crisis = None;
    let applied = apply_all(state, &failure);
    log::info!("crisis {crisis_id} expired after {elapsed_days} days");
    Some(ExpiredCrisis { crisis_id, applied })
}
