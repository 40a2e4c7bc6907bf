use anyhow::{Result, bail, ensure};
use guardian_game::GamePhase;

use crate::logic::{CrisisResponse, GameTester, GameplayStrategy, SimulationPlan, SimulationSummary};

/// A named plan the logic tester can run across seeds.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    fn new(name: &str, plan: SimulationPlan) -> Self {
        Self {
            name: name.to_string(),
            plan,
        }
    }
}

const FULL_LADDER: [GamePhase; 6] = [
    GamePhase::Era1,
    GamePhase::Era2,
    GamePhase::Era3,
    GamePhase::Era4,
    GamePhase::Era5,
    GamePhase::Ending,
];

fn gauges_in_bounds(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.gauges_in_bounds(),
        "gauge out of range: {:?} / {:?}",
        summary.final_state.indicators,
        summary.final_state.bloc_relationships
    );
    Ok(())
}

fn history_matches_turns(summary: &SimulationSummary) -> Result<()> {
    let history = summary.final_state.decisions.len();
    ensure!(
        history == summary.turns.len(),
        "history has {history} entries but {} decisions were resolved",
        summary.turns.len()
    );
    for (record, turn) in summary.final_state.decisions.iter().zip(&summary.turns) {
        ensure!(
            record.id == turn.decision_id && record.option_index == turn.option_index,
            "history entry {} diverges from resolved {}",
            record.id,
            turn.decision_id
        );
    }
    Ok(())
}

fn left_intro(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_state.game_phase != GamePhase::Intro,
        "session never left the intro"
    );
    Ok(())
}

fn reaches_ending(summary: &SimulationSummary) -> Result<()> {
    if !summary.game_ended {
        bail!(
            "stalled in {} after {} months",
            summary.final_state.game_phase,
            summary.months_played
        );
    }
    ensure!(
        summary.phases_entered == FULL_LADDER,
        "unexpected phase ladder {:?}",
        summary.phases_entered
    );
    ensure!(
        (summary.final_state.term_progress - 100.0).abs() < f32::EPSILON,
        "term progress {} at the ending",
        summary.final_state.term_progress
    );
    Ok(())
}

fn outcome_is_graded(summary: &SimulationSummary) -> Result<()> {
    let Some(outcome) = &summary.outcome else {
        bail!("no outcome summary after the ending");
    };
    ensure!(
        (0..=1_000).contains(&outcome.score),
        "score {} out of range",
        outcome.score
    );
    ensure!(
        outcome.decisions_made == summary.turns.len(),
        "outcome counts {} decisions, autopilot made {}",
        outcome.decisions_made,
        summary.turns.len()
    );
    Ok(())
}

fn expired_crises_stay_unanswered(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        !summary.crises_expired.is_empty(),
        "no crisis timed out across {} starts",
        summary.crises_started.len()
    );
    for turn in &summary.turns {
        if let Some(crisis) = &turn.crisis_id {
            ensure!(
                !summary.crises_expired.contains(crisis),
                "crisis {crisis} was both answered and expired"
            );
        }
    }
    Ok(())
}

fn crises_seen_once_before_repeats(summary: &SimulationSummary) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    for crisis in &summary.crises_started {
        if seen.contains(&crisis.as_str()) {
            break;
        }
        seen.push(crisis);
    }
    let distinct = summary.final_state.seen_crisis_ids.len();
    ensure!(
        seen.len() == distinct,
        "crisis {} repeated before all {distinct} were drawn",
        summary.crises_started.get(seen.len()).map_or("?", String::as_str)
    );
    Ok(())
}

fn smoke_scenario() -> TestScenario {
    TestScenario::new(
        "Smoke Test",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_months(6)
            .with_expectation(left_intro)
            .with_expectation(gauges_in_bounds)
            .with_expectation(history_matches_turns),
    )
}

fn full_campaign_scenario(name: &str, strategy: GameplayStrategy) -> TestScenario {
    TestScenario::new(
        name,
        SimulationPlan::new(strategy)
            .with_expectation(reaches_ending)
            .with_expectation(outcome_is_graded)
            .with_expectation(gauges_in_bounds)
            .with_expectation(history_matches_turns),
    )
}

fn crisis_expiry_scenario() -> TestScenario {
    TestScenario::new(
        "Crisis Expiry",
        SimulationPlan::new(GameplayStrategy::Conservative)
            .with_crisis_cadence(2)
            .with_crisis_response(CrisisResponse::Never)
            .with_expectation(expired_crises_stay_unanswered)
            .with_expectation(gauges_in_bounds)
            .with_expectation(history_matches_turns),
    )
}

fn crisis_rotation_scenario() -> TestScenario {
    TestScenario::new(
        "Crisis Rotation",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_crisis_cadence(1)
            .with_crisis_response(CrisisResponse::Alternate)
            .with_expectation(crises_seen_once_before_repeats)
            .with_expectation(gauges_in_bounds),
    )
}

fn deterministic_replay_scenario(game_tester: &GameTester) -> TestScenario {
    let replay_tester = game_tester.clone();
    let base = SimulationPlan::new(GameplayStrategy::Random);
    let replay_plan = base.bare();
    TestScenario::new(
        "Deterministic Replay",
        base.with_expectation(move |summary: &SimulationSummary| -> Result<()> {
            let replay = replay_tester.run_plan(&replay_plan, summary.seed)?;
            ensure!(
                replay.final_state == summary.final_state,
                "replay of seed {} diverged",
                summary.seed
            );
            ensure!(
                replay.crises_started == summary.crises_started,
                "crisis draws diverged on replay"
            );
            Ok(())
        }),
    )
}

pub fn get_scenario(name: &str, game_tester: &GameTester) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "full-campaign-conservative" | "conservative" => Some(full_campaign_scenario(
            "Full Campaign - Conservative Strategy",
            GameplayStrategy::Conservative,
        )),
        "full-campaign-aggressive" | "aggressive" => Some(full_campaign_scenario(
            "Full Campaign - Aggressive Strategy",
            GameplayStrategy::Aggressive,
        )),
        "full-campaign-balanced" | "balanced" => Some(full_campaign_scenario(
            "Full Campaign - Balanced Strategy",
            GameplayStrategy::Balanced,
        )),
        "full-campaign-random" | "random" => Some(full_campaign_scenario(
            "Full Campaign - Random Strategy",
            GameplayStrategy::Random,
        )),
        "crisis-expiry" | "expiry" => Some(crisis_expiry_scenario()),
        "crisis-rotation" | "rotation" => Some(crisis_rotation_scenario()),
        "deterministic-replay" | "deterministic" => {
            Some(deterministic_replay_scenario(game_tester))
        }
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        (
            "full-campaign-conservative",
            "Full Campaign - Conservative Strategy",
        ),
        (
            "full-campaign-aggressive",
            "Full Campaign - Aggressive Strategy",
        ),
        ("full-campaign-balanced", "Full Campaign - Balanced Strategy"),
        ("full-campaign-random", "Full Campaign - Random Strategy"),
        ("crisis-expiry", "Crisis Expiry"),
        ("crisis-rotation", "Crisis Rotation"),
        ("deterministic-replay", "Deterministic Replay"),
    ]
}
