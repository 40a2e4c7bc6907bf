//! Command boundary for one play session.
//!
//! A [`GameSession`] owns the [`GameState`], shares the immutable catalog,
//! and keeps the seeded RNG used by random selection. Every command either
//! fails without touching the state or runs to completion, and pushes
//! [`Notice`]s for presentation collaborators to drain.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::consequences::{self, ExpiredCrisis, ResolutionOutcome};
use crate::data::{ContentCatalog, Decision, EventStatus, GameEvent};
use crate::error::EngineError;
use crate::notice::{Notice, NoticeId, NoticeKind, SelectionTrace};
use crate::result::{OutcomeConfig, OutcomeSummary, outcome_summary};
use crate::selection::pick_crisis_with_trace;
use crate::state::{ActiveCrisis, GamePhase, GameState};
use crate::triggers::triggered_events;

/// Which crisis [`GameSession::trigger_crisis`] should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrisisSelector {
    Id(String),
    /// Weighted draw among crises not yet seen this session.
    Random,
}

/// Result of one month passing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub month: u8,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_crisis: Option<ExpiredCrisis>,
    /// Events eligible after the month passed, highest priority first.
    pub eligible_events: Vec<String>,
}

/// A crisis that has just become active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisActivation {
    pub crisis_id: String,
    pub started_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<SelectionTrace>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    catalog: Arc<ContentCatalog>,
    config: EngineConfig,
    outcome_config: OutcomeConfig,
    state: GameState,
    rng: ChaCha20Rng,
    notices: Vec<Notice>,
    next_seq: u32,
}

impl GameSession {
    /// Fresh session in the intro phase.
    #[must_use]
    pub fn new(catalog: Arc<ContentCatalog>, config: EngineConfig, seed: u64) -> Self {
        let state = GameState::new(&config, seed);
        Self::from_state(catalog, config, state)
    }

    /// Resume a session from a stored state. The RNG restarts from the state seed.
    #[must_use]
    pub fn from_state(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        state: GameState,
    ) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(state.seed),
            catalog,
            config,
            outcome_config: OutcomeConfig::default(),
            state,
            notices: Vec::new(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn with_outcome_config(mut self, outcome_config: OutcomeConfig) -> Self {
        self.outcome_config = outcome_config;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Events the trigger evaluator currently reports as eligible. Empty
    /// once the game has ended.
    #[must_use]
    pub fn pending_events(&self) -> Vec<&GameEvent> {
        if self.state.is_over() {
            return Vec::new();
        }
        triggered_events(&self.state, &self.catalog)
    }

    /// Drain the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<OutcomeSummary> {
        outcome_summary(&self.state, &self.outcome_config)
    }

    fn notify(&mut self, kind: NoticeKind, subject: Option<&str>, payload: serde_json::Value) {
        let mut notice = Notice::new(NoticeId::new(self.state.elapsed_days, self.next_seq), kind)
            .with_payload(payload);
        if let Some(subject) = subject {
            notice = notice.with_subject(subject);
        }
        self.next_seq = self.next_seq.wrapping_add(1);
        self.notices.push(notice);
    }

    /// One notice per phase walked through, empty eras included.
    fn notify_phase(&mut self, from: GamePhase, entered: Option<GamePhase>) {
        let Some(entered) = entered else {
            return;
        };
        for &phase in GamePhase::ALL {
            if phase > from && phase <= entered {
                self.notify(
                    NoticeKind::PhaseAdvanced,
                    Some(phase.as_str()),
                    json!({ "phase": phase }),
                );
            }
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.state.is_over() {
            return Err(EngineError::GameOver);
        }
        Ok(())
    }

    /// Leave the intro once its decision quota is met.
    ///
    /// Returns the phase the game is in afterwards. Outside the intro this
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`] once the game has ended.
    pub fn start_game(&mut self) -> Result<GamePhase, EngineError> {
        self.ensure_running()?;
        if self.state.game_phase != GamePhase::Intro {
            return Ok(self.state.game_phase);
        }
        self.notify(
            NoticeKind::GameStarted,
            None,
            json!({ "seed": self.state.seed }),
        );
        let entered = self.state.advance_phase_if_complete(&self.config.phases);
        self.notify_phase(GamePhase::Intro, entered);
        Ok(self.state.game_phase)
    }

    /// Resolve a queued decision, the active crisis's decision, or a
    /// top-level catalog decision by id.
    ///
    /// The resolution that ends the term also closes any crisis still open,
    /// without applying its failure set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`] after the ending,
    /// [`EngineError::NoActiveCrisis`] for a crisis decision whose crisis is
    /// not active, [`EngineError::UnknownDecision`] for an unknown id and
    /// [`EngineError::InvalidOption`] for an out-of-range option.
    pub fn resolve_decision(
        &mut self,
        decision_id: &str,
        option_index: usize,
    ) -> Result<ResolutionOutcome, EngineError> {
        self.ensure_running()?;
        let decision = self.locate_decision(decision_id)?;
        let outcome = consequences::resolve_decision(
            &mut self.state,
            &decision,
            option_index,
            &self.config.phases,
        )?;

        self.notify(
            NoticeKind::DecisionResolved,
            Some(decision_id),
            json!({
                "option_index": option_index,
                "option_label": outcome.record.option_label,
            }),
        );
        if let Some(crisis_id) = &outcome.cleared_crisis {
            self.notify(
                NoticeKind::CrisisResolved,
                Some(crisis_id.as_str()),
                serde_json::Value::Null,
            );
        }
        self.notify_phase(outcome.record.phase, outcome.phase_entered);
        if let Some(crisis_id) = &outcome.closed_at_ending {
            self.notify(
                NoticeKind::CrisisResolved,
                Some(crisis_id.as_str()),
                json!({ "reason": "term_ended" }),
            );
        }
        Ok(outcome)
    }

    fn locate_decision(&self, decision_id: &str) -> Result<Decision, EngineError> {
        if let Some(decision) = self.state.queued_decision(decision_id) {
            return Ok(decision.clone());
        }
        if let Some(decision) = self
            .state
            .current_crisis
            .as_ref()
            .and_then(|active| active.crisis.decision(decision_id))
        {
            return Ok(decision.clone());
        }
        if let Some(decision) = self.catalog.decision(decision_id) {
            return Ok(decision.clone());
        }
        if self.catalog.crisis_for_decision(decision_id).is_some() {
            return Err(EngineError::NoActiveCrisis);
        }
        Err(EngineError::UnknownDecision(decision_id.to_string()))
    }

    /// Move the calendar one month and expire the active crisis if its time
    /// has run out.
    ///
    /// After the ending the clock still runs but nothing expires and no
    /// event is reported eligible.
    pub fn advance_time(&mut self) -> AdvanceOutcome {
        self.state.advance_time(self.config.days_per_month);
        self.notify(
            NoticeKind::MonthAdvanced,
            None,
            json!({ "month": self.state.current_month, "year": self.state.current_year }),
        );

        let elapsed = self
            .state
            .crisis_elapsed_days()
            .filter(|_| !self.state.is_over());
        let expired_crisis = elapsed.and_then(|elapsed| {
            consequences::expire_crisis(
                &mut self.state,
                elapsed,
                self.config.default_expiry_penalty,
            )
        });
        if let Some(expired) = &expired_crisis {
            self.notify_expired(expired);
        }

        let eligible_events = self
            .pending_events()
            .iter()
            .map(|event| event.id.clone())
            .collect();
        AdvanceOutcome {
            month: self.state.current_month,
            year: self.state.current_year,
            expired_crisis,
            eligible_events,
        }
    }

    fn notify_expired(&mut self, expired: &ExpiredCrisis) {
        let payload = serde_json::to_value(&expired.applied).unwrap_or_default();
        self.notify(NoticeKind::CrisisExpired, Some(expired.crisis_id.as_str()), payload);
    }

    /// Activate a crisis. Only one crisis may be active at a time.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`], [`EngineError::CrisisAlreadyActive`]
    /// or [`EngineError::UnknownCrisis`] (also for a random draw from an
    /// empty catalog).
    pub fn trigger_crisis(
        &mut self,
        selector: CrisisSelector,
    ) -> Result<CrisisActivation, EngineError> {
        self.ensure_running()?;
        if let Some(active) = &self.state.current_crisis {
            return Err(EngineError::CrisisAlreadyActive(active.id().to_string()));
        }

        let catalog = Arc::clone(&self.catalog);
        let (crisis, trace) = match selector {
            CrisisSelector::Id(id) => {
                let crisis = catalog
                    .crisis(&id)
                    .ok_or_else(|| EngineError::UnknownCrisis(id.clone()))?;
                (crisis, None)
            }
            CrisisSelector::Random => {
                let pick =
                    pick_crisis_with_trace(&catalog, &self.state.seen_crisis_ids, &mut self.rng)
                        .ok_or_else(|| EngineError::UnknownCrisis(String::from("random")))?;
                (pick.crisis, Some(pick.trace))
            }
        };

        let started_day = self.state.elapsed_days;
        self.state.current_crisis = Some(ActiveCrisis {
            crisis: crisis.clone(),
            started_day,
        });
        self.state.seen_crisis_ids.insert(crisis.id.clone());
        log::info!("crisis {} started on day {started_day}", crisis.id);
        self.notify(
            NoticeKind::CrisisStarted,
            Some(crisis.id.as_str()),
            json!({
                "urgency": crisis.urgency,
                "time_limit": crisis.time_limit,
            }),
        );

        Ok(CrisisActivation {
            crisis_id: crisis.id.clone(),
            started_day,
            trace,
        })
    }

    /// Queue the first catalog decision allowed in the current phase that is
    /// neither queued nor already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`] after the ending and
    /// `UnknownDecision("sample")` when no template remains.
    pub fn trigger_sample_decision(&mut self) -> Result<Decision, EngineError> {
        self.ensure_running()?;
        let phase = self.state.game_phase;
        let decision = self
            .catalog
            .decisions()
            .iter()
            .find(|decision| {
                decision.allowed_in(phase)
                    && self.state.queued_decision(&decision.id).is_none()
                    && !self.state.has_resolved(&decision.id)
            })
            .cloned()
            .ok_or_else(|| EngineError::UnknownDecision(String::from("sample")))?;

        self.state.decision_queue.push(decision.clone());
        log::debug!("queued decision {} in {phase}", decision.id);
        self.notify(
            NoticeKind::DecisionQueued,
            Some(decision.id.as_str()),
            serde_json::Value::Null,
        );
        Ok(decision)
    }

    /// Deliver an event and apply its consequences.
    ///
    /// Returns `false` when the event had already been delivered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`] once the term has ended, since the
    /// final gauges are settled, [`EngineError::UnknownEvent`] for an id
    /// missing from the catalog and [`EngineError::EventNotPublished`] for a
    /// draft or archived event.
    pub fn deliver_event(&mut self, event_id: &str) -> Result<bool, EngineError> {
        self.ensure_running()?;
        let catalog = Arc::clone(&self.catalog);
        let event = catalog
            .event(event_id)
            .ok_or_else(|| EngineError::UnknownEvent(event_id.to_string()))?;
        if event.status != EventStatus::Published {
            return Err(EngineError::EventNotPublished(event_id.to_string()));
        }
        let fired = consequences::mark_event_triggered(&mut self.state, event);
        if fired {
            self.notify(
                NoticeKind::EventFired,
                Some(event_id),
                json!({ "priority": event.priority, "title": event.title }),
            );
        }
        Ok(fired)
    }

    /// Expire the active crisis if its time limit has passed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GameOver`] after the ending and
    /// [`EngineError::NoActiveCrisis`] when no crisis is active.
    pub fn expire_crisis(&mut self) -> Result<Option<ExpiredCrisis>, EngineError> {
        self.ensure_running()?;
        let elapsed = self
            .state
            .crisis_elapsed_days()
            .ok_or(EngineError::NoActiveCrisis)?;
        let penalty = self.config.default_expiry_penalty;
        let expired = consequences::expire_crisis(&mut self.state, elapsed, penalty);
        if let Some(expired) = &expired {
            self.notify_expired(expired);
        }
        Ok(expired)
    }

    /// Restore the starting state for the same seed and reseed the RNG.
    pub fn reset_game(&mut self) {
        let seed = self.state.seed;
        self.state = GameState::new(&self.config, seed);
        self.rng = ChaCha20Rng::seed_from_u64(seed);
        self.notices.clear();
        log::info!("game reset with seed {seed}");
        self.notify(NoticeKind::GameReset, None, json!({ "seed": seed }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Target;

    fn session(seed: u64) -> GameSession {
        let catalog = Arc::new(ContentCatalog::load_default().unwrap());
        GameSession::new(catalog, EngineConfig::default(), seed)
    }

    fn started(seed: u64) -> GameSession {
        let mut session = session(seed);
        session.start_game().unwrap();
        session.take_notices();
        session
    }

    #[test]
    fn start_game_enters_first_era() {
        let mut session = session(1);
        assert_eq!(session.start_game(), Ok(GamePhase::Era1));
        assert_eq!(session.state().total_decisions_in_era, 3);
        let kinds: Vec<NoticeKind> = session.take_notices().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NoticeKind::GameStarted, NoticeKind::PhaseAdvanced]);
        assert_eq!(session.start_game(), Ok(GamePhase::Era1));
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn sample_decisions_follow_catalog_order_and_skip_duplicates() {
        let mut session = started(2);
        let first = session.trigger_sample_decision().unwrap();
        let second = session.trigger_sample_decision().unwrap();
        assert_eq!(first.id, "genesis_block_size");
        assert_eq!(second.id, "open_source_license");
        assert_eq!(session.state().decision_queue.len(), 2);

        session.resolve_decision("genesis_block_size", 0).unwrap();
        let third = session.trigger_sample_decision().unwrap();
        assert_eq!(third.id, "exchange_listing");
    }

    #[test]
    fn resolving_queued_decision_applies_and_notifies() {
        let mut session = started(3);
        session.trigger_sample_decision().unwrap();
        session.take_notices();
        let outcome = session.resolve_decision("genesis_block_size", 0).unwrap();
        assert_eq!(outcome.record.option_index, 0);
        assert!(session.state().decision_queue.is_empty());
        assert!((session.state().value(Target::MarketStability) - 55.0).abs() < f32::EPSILON);
        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::DecisionResolved);
        assert_eq!(notices[0].subject.as_deref(), Some("genesis_block_size"));
    }

    #[test]
    fn bad_option_is_rejected_without_side_effects() {
        let mut session = started(4);
        session.trigger_sample_decision().unwrap();
        session.take_notices();
        let before = session.state().clone();
        let err = session.resolve_decision("genesis_block_size", 9).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOption { available: 2, .. }));
        assert_eq!(session.state(), &before);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn unknown_and_inactive_crisis_decisions_are_errors() {
        let mut session = started(5);
        assert_eq!(
            session.resolve_decision("nope", 0),
            Err(EngineError::UnknownDecision(String::from("nope")))
        );
        assert_eq!(
            session.resolve_decision("overflow_bug_response", 0),
            Err(EngineError::NoActiveCrisis)
        );
    }

    #[test]
    fn only_one_crisis_at_a_time() {
        let mut session = started(6);
        let activation = session
            .trigger_crisis(CrisisSelector::Id(String::from("dao_exploit")))
            .unwrap();
        assert_eq!(activation.crisis_id, "dao_exploit");
        assert!(activation.trace.is_none());
        assert_eq!(
            session.trigger_crisis(CrisisSelector::Random),
            Err(EngineError::CrisisAlreadyActive(String::from("dao_exploit")))
        );
        assert!(session.state().seen_crisis_ids.contains("dao_exploit"));

        let outcome = session.resolve_decision("dao_exploit_response", 0).unwrap();
        assert_eq!(outcome.cleared_crisis.as_deref(), Some("dao_exploit"));
        assert!(session.state().current_crisis.is_none());
    }

    #[test]
    fn unknown_crisis_id_is_rejected() {
        let mut session = started(7);
        assert_eq!(
            session.trigger_crisis(CrisisSelector::Id(String::from("alien_fork"))),
            Err(EngineError::UnknownCrisis(String::from("alien_fork")))
        );
        assert!(session.state().current_crisis.is_none());
    }

    #[test]
    fn advance_time_expires_overdue_crisis() {
        let mut session = started(8);
        session
            .trigger_crisis(CrisisSelector::Id(String::from("overflow_bug")))
            .unwrap();
        let market = session.state().value(Target::MarketStability);
        let outcome = session.advance_time();
        let expired = outcome.expired_crisis.unwrap();
        assert_eq!(expired.crisis_id, "overflow_bug");
        assert!(session.state().current_crisis.is_none());
        // overflow_bug has a no-response option, which wins over the flat penalty
        assert!(
            (session.state().value(Target::MarketStability) - (market - 20.0)).abs()
                < f32::EPSILON
        );
        assert_eq!(outcome.month, 2);
        assert!(
            session
                .take_notices()
                .iter()
                .any(|notice| notice.kind == NoticeKind::CrisisExpired)
        );
    }

    #[test]
    fn untimed_crisis_survives_time() {
        let mut session = started(9);
        session
            .trigger_crisis(CrisisSelector::Id(String::from("bridge_hack")))
            .unwrap();
        for _ in 0..24 {
            assert!(session.advance_time().expired_crisis.is_none());
        }
        assert_eq!(session.expire_crisis(), Ok(None));
        assert!(session.state().current_crisis.is_some());
    }

    #[test]
    fn explicit_expiry_requires_active_crisis() {
        let mut session = started(10);
        assert_eq!(session.expire_crisis(), Err(EngineError::NoActiveCrisis));
    }

    #[test]
    fn random_crisis_is_deterministic_per_seed() {
        let picks = |seed| {
            let mut session = started(seed);
            let mut ids = Vec::new();
            for _ in 0..5 {
                let activation = session.trigger_crisis(CrisisSelector::Random).unwrap();
                ids.push(activation.crisis_id.clone());
                session
                    .resolve_decision(&format!("{}_response", activation.crisis_id), 0)
                    .unwrap();
            }
            ids
        };
        let first = picks(42);
        assert_eq!(first, picks(42));
        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5, "every crisis seen once before repeats");
    }

    #[test]
    fn delivered_events_never_reappear() {
        let mut session = started(11);
        for _ in 0..5 {
            session.advance_time();
        }
        assert_eq!(session.state().current_month, 6);
        let pending: Vec<String> = session
            .pending_events()
            .iter()
            .map(|event| event.id.clone())
            .collect();
        assert!(pending.contains(&String::from("summer_of_code")));

        assert_eq!(session.deliver_event("summer_of_code"), Ok(true));
        assert_eq!(session.deliver_event("summer_of_code"), Ok(false));
        assert!(
            session
                .pending_events()
                .iter()
                .all(|event| event.id != "summer_of_code")
        );
        assert_eq!(
            session.deliver_event("ghost"),
            Err(EngineError::UnknownEvent(String::from("ghost")))
        );
    }

    #[test]
    fn empty_era_is_announced_and_skipped() {
        let config = EngineConfig {
            phases: crate::PhaseSchedule {
                era2: 0,
                ..crate::PhaseSchedule::default()
            },
            ..EngineConfig::default()
        };
        let catalog = Arc::new(ContentCatalog::load_default().unwrap());
        let mut session = GameSession::new(catalog, config, 15);
        session.start_game().unwrap();
        session.take_notices();

        for _ in 0..3 {
            let next = session.trigger_sample_decision().unwrap();
            session.resolve_decision(&next.id, 0).unwrap();
        }
        let entered: Vec<String> = session
            .take_notices()
            .into_iter()
            .filter(|notice| notice.kind == NoticeKind::PhaseAdvanced)
            .filter_map(|notice| notice.subject)
            .collect();
        assert_eq!(entered, vec!["era2", "era3"]);
        assert_eq!(session.state().game_phase, GamePhase::Era3);
        assert_eq!(session.state().current_decision, 0);
    }

    #[test]
    fn unpublished_events_are_refused_untouched() {
        let mut session = started(14);
        let before = session.state().clone();
        assert_eq!(
            session.deliver_event("draft_token_airdrop"),
            Err(EngineError::EventNotPublished(String::from("draft_token_airdrop")))
        );
        assert_eq!(
            session.deliver_event("archived_ico_mania"),
            Err(EngineError::EventNotPublished(String::from("archived_ico_mania")))
        );
        assert_eq!(session.state(), &before);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn ending_refuses_progress_commands() {
        let mut session = started(12);
        let mut state = session.state().clone();
        state.game_phase = GamePhase::Ending;
        let mut ended = GameSession::from_state(
            Arc::new(session.catalog().clone()),
            session.config().clone(),
            state,
        );
        assert_eq!(ended.start_game(), Err(EngineError::GameOver));
        assert_eq!(ended.trigger_sample_decision(), Err(EngineError::GameOver));
        assert_eq!(
            ended.trigger_crisis(CrisisSelector::Random),
            Err(EngineError::GameOver)
        );
        let settled = ended.state().clone();
        assert_eq!(ended.deliver_event("pizza_day"), Err(EngineError::GameOver));
        assert_eq!(ended.expire_crisis(), Err(EngineError::GameOver));
        assert_eq!(ended.state(), &settled);
        assert!(ended.pending_events().is_empty());
        assert!(ended.outcome().is_some());
        assert!(session.outcome().is_none());
    }

    #[test]
    fn reset_restores_start_and_rng() {
        let mut session = started(13);
        let first = session.trigger_crisis(CrisisSelector::Random).unwrap();
        session.advance_time();
        session.reset_game();

        assert_eq!(session.state(), &GameState::new(&EngineConfig::default(), 13));
        let kinds: Vec<NoticeKind> = session.take_notices().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NoticeKind::GameReset]);

        session.start_game().unwrap();
        let again = session.trigger_crisis(CrisisSelector::Random).unwrap();
        assert_eq!(first.crisis_id, again.crisis_id);
    }
}
