use std::sync::Arc;

use anyhow::{Context, Result};
use guardian_game::{
    ContentCatalog, CrisisSelector, Decision, EngineConfig, EngineError, GamePhase, GameSession,
    GameState, NoticeKind, OutcomeSummary, Target,
};

use super::policy::{GameplayStrategy, PlayerPolicy};

const DEFAULT_MAX_MONTHS: u32 = 120;
const DEFAULT_CRISIS_CADENCE: u32 = 4;

/// How the autopilot treats an active crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrisisResponse {
    /// Answer every crisis the month it is seen.
    Always,
    /// Let timed crises run out; untimed ones are still answered.
    Never,
    /// Answer every other crisis.
    Alternate,
}

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_months: u32,
    /// Start a random crisis every `crisis_cadence` months. Zero disables.
    pub crisis_cadence: u32,
    pub crisis_response: CrisisResponse,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_months: DEFAULT_MAX_MONTHS,
            crisis_cadence: DEFAULT_CRISIS_CADENCE,
            crisis_response: CrisisResponse::Always,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_months(mut self, max_months: u32) -> Self {
        self.max_months = max_months;
        self
    }

    #[must_use]
    pub const fn with_crisis_cadence(mut self, cadence: u32) -> Self {
        self.crisis_cadence = cadence;
        self
    }

    #[must_use]
    pub const fn with_crisis_response(mut self, response: CrisisResponse) -> Self {
        self.crisis_response = response;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    /// Same plan with no expectations attached.
    #[must_use]
    pub fn bare(&self) -> Self {
        Self {
            expectations: Vec::new(),
            ..self.clone()
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One resolved decision, as the autopilot saw it.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub month: u8,
    pub year: i32,
    pub phase: GamePhase,
    pub decision_id: String,
    pub option_index: usize,
    pub option_label: String,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
    pub crisis_id: Option<String>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub final_state: GameState,
    pub outcome: Option<OutcomeSummary>,
    pub turns: Vec<TurnRecord>,
    pub months_played: u32,
    pub phases_entered: Vec<GamePhase>,
    pub crises_started: Vec<String>,
    pub crises_expired: Vec<String>,
    pub events_fired: usize,
    pub game_ended: bool,
}

impl SimulationSummary {
    /// Every gauge sits inside its declared range.
    #[must_use]
    pub fn gauges_in_bounds(&self) -> bool {
        Target::ALL.iter().all(|target| {
            let (min, max) = target.bounds();
            (min..=max).contains(&self.final_state.value(*target))
        })
    }

    #[must_use]
    pub fn ending_label(&self) -> String {
        self.outcome
            .as_ref()
            .map_or_else(|| String::from("unfinished"), |o| o.ending.to_string())
    }
}

/// Drives [`GameSession`]s with a policy and records what happened.
#[derive(Debug, Clone)]
pub struct GameTester {
    catalog: Arc<ContentCatalog>,
    config: EngineConfig,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(catalog: Arc<ContentCatalog>, config: EngineConfig, verbose: bool) -> Self {
        Self {
            catalog,
            config,
            verbose,
        }
    }

    /// Tester over the bundled catalog and default tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled catalog fails validation.
    pub fn try_default(verbose: bool) -> Result<Self> {
        let catalog = ContentCatalog::load_default().context("loading bundled catalog")?;
        Ok(Self::new(Arc::new(catalog), EngineConfig::default(), verbose))
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play one session to the ending or the month cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects a move the autopilot made.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut session = GameSession::new(Arc::clone(&self.catalog), self.config.clone(), seed);
        let mut policy = plan.strategy.create_policy(seed);
        let mut summary = SimulationSummary {
            seed,
            strategy: plan.strategy,
            final_state: GameState::default(),
            outcome: None,
            turns: Vec::new(),
            months_played: 0,
            phases_entered: Vec::new(),
            crises_started: Vec::new(),
            crises_expired: Vec::new(),
            events_fired: 0,
            game_ended: false,
        };

        session.start_game().context("starting session")?;
        collect_notices(&mut session, &mut summary);

        while !session.state().is_over() && summary.months_played < plan.max_months {
            self.play_month(plan, &mut session, policy.as_mut(), &mut summary)
                .with_context(|| format!("month {} of seed {seed}", summary.months_played + 1))?;
        }

        summary.game_ended = session.state().is_over();
        summary.outcome = session.outcome();
        summary.final_state = session.into_state();
        log::debug!(
            "seed {seed} {} finished after {} months ({} events): {}",
            plan.strategy,
            summary.months_played,
            summary.events_fired,
            summary.ending_label()
        );
        Ok(summary)
    }

    fn play_month(
        &self,
        plan: &SimulationPlan,
        session: &mut GameSession,
        policy: &mut (dyn PlayerPolicy + Send),
        summary: &mut SimulationSummary,
    ) -> Result<()> {
        let pending: Vec<String> = session
            .pending_events()
            .iter()
            .map(|event| event.id.clone())
            .collect();
        for id in pending {
            session.deliver_event(&id)?;
        }

        let cadence = plan.crisis_cadence;
        if cadence > 0
            && summary.months_played % cadence == cadence - 1
            && session.state().current_crisis.is_none()
            && !session.catalog().crises().is_empty()
        {
            session.trigger_crisis(CrisisSelector::Random)?;
        }

        if let Some(active) = session.state().current_crisis.clone() {
            let started = summary.crises_started.len();
            let respond = match plan.crisis_response {
                CrisisResponse::Always => true,
                CrisisResponse::Never => active.crisis.time_limit.is_none(),
                CrisisResponse::Alternate => {
                    active.crisis.time_limit.is_none() || started % 2 == 1
                }
            };
            if respond && let Some(response) = active.crisis.decisions.first() {
                self.resolve(session, policy, response, Some(active.id()), summary)?;
            }
        }

        if !session.state().is_over() {
            match session.trigger_sample_decision() {
                Ok(next) => self.resolve(session, policy, &next, None, summary)?,
                Err(EngineError::UnknownDecision(_) | EngineError::GameOver) => {}
                Err(other) => return Err(other.into()),
            }
        }

        if !session.state().is_over() {
            session.advance_time();
            summary.months_played += 1;
        }
        collect_notices(session, summary);
        Ok(())
    }

    fn resolve(
        &self,
        session: &mut GameSession,
        policy: &mut (dyn PlayerPolicy + Send),
        decision: &Decision,
        crisis_id: Option<&str>,
        summary: &mut SimulationSummary,
    ) -> Result<()> {
        let pick = policy.pick_option(session.state(), decision);
        let state = session.state();
        let (month, year, phase) = (state.current_month, state.current_year, state.game_phase);
        session.resolve_decision(&decision.id, pick.option_index)?;

        let option_label = decision
            .option(pick.option_index)
            .map(|option| option.label.clone())
            .unwrap_or_default();
        if self.verbose {
            println!(
                "    {month:02}/{year} {phase}: {} -> {option_label} [{}]",
                decision.id,
                policy.name()
            );
        }
        summary.turns.push(TurnRecord {
            month,
            year,
            phase,
            decision_id: decision.id.clone(),
            option_index: pick.option_index,
            option_label,
            policy_name: policy.name(),
            rationale: pick.rationale,
            crisis_id: crisis_id.map(str::to_string),
        });
        Ok(())
    }
}

fn collect_notices(session: &mut GameSession, summary: &mut SimulationSummary) {
    for notice in session.take_notices() {
        match notice.kind {
            NoticeKind::PhaseAdvanced => {
                if let Some(phase) = notice
                    .subject
                    .as_deref()
                    .and_then(|subject| subject.parse().ok())
                {
                    summary.phases_entered.push(phase);
                }
            }
            NoticeKind::CrisisStarted => {
                summary
                    .crises_started
                    .push(notice.subject.unwrap_or_default());
            }
            NoticeKind::CrisisExpired => {
                summary
                    .crises_expired
                    .push(notice.subject.unwrap_or_default());
            }
            NoticeKind::EventFired => summary.events_fired += 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        GameTester::try_default(false).unwrap()
    }

    #[test]
    fn balanced_plan_reaches_the_ending() {
        let plan = SimulationPlan::new(GameplayStrategy::Balanced);
        let summary = tester().run_plan(&plan, 1337).unwrap();
        assert!(summary.game_ended);
        assert_eq!(summary.final_state.game_phase, GamePhase::Ending);
        assert_eq!(summary.phases_entered.last(), Some(&GamePhase::Ending));
        assert_eq!(summary.turns.len(), summary.final_state.decisions.len());
        assert!(summary.outcome.is_some());
        assert!(summary.gauges_in_bounds());
    }

    #[test]
    fn month_cap_halts_the_run() {
        let plan = SimulationPlan::new(GameplayStrategy::Aggressive).with_max_months(2);
        let summary = tester().run_plan(&plan, 4).unwrap();
        assert_eq!(summary.months_played, 2);
        assert!(!summary.game_ended);
        assert_eq!(summary.ending_label(), "unfinished");
    }

    #[test]
    fn ignored_crises_time_out() {
        let plan = SimulationPlan::new(GameplayStrategy::Conservative)
            .with_crisis_cadence(2)
            .with_crisis_response(CrisisResponse::Never);
        let summary = tester().run_plan(&plan, 21).unwrap();
        assert!(!summary.crises_started.is_empty());
        assert!(!summary.crises_expired.is_empty());
        for turn in &summary.turns {
            if let Some(crisis) = &turn.crisis_id {
                assert!(!summary.crises_expired.contains(crisis));
            }
        }
    }

    #[test]
    fn zero_cadence_never_starts_crises() {
        let plan = SimulationPlan::new(GameplayStrategy::Balanced).with_crisis_cadence(0);
        let summary = tester().run_plan(&plan, 8).unwrap();
        assert!(summary.crises_started.is_empty());
        assert!(summary.turns.iter().all(|turn| turn.crisis_id.is_none()));
    }

    #[test]
    fn runs_are_reproducible() {
        let plan = SimulationPlan::new(GameplayStrategy::Random);
        let first = tester().run_plan(&plan, 55).unwrap();
        let second = tester().run_plan(&plan, 55).unwrap();
        assert_eq!(first.final_state, second.final_state);
        assert_eq!(first.crises_started, second.crises_started);
    }
}
