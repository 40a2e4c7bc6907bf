use std::fmt;

use guardian_game::{Decision, DecisionOption, GameState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub option_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(option_index: usize, rationale: Option<String>) -> Self {
        Self {
            option_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select an option for a decision that is waiting on the player.
    fn pick_option(&mut self, state: &GameState, decision: &Decision) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Conservative,
    Aggressive,
    Balanced,
    Random,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Aggressive => "Aggressive",
            Self::Balanced => "Balanced",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Conservative => Box::new(ConservativePolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ConservativePolicy;
struct AggressivePolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for ConservativePolicy {
    fn name(&self) -> &'static str {
        "Conservative"
    }

    fn pick_option(&mut self, _state: &GameState, decision: &Decision) -> PolicyDecision {
        let (idx, score) = best_option(decision, |option| -downside(option));
        PolicyDecision::new(idx, Some(format!("downside {:.1}", -score)))
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn pick_option(&mut self, _state: &GameState, decision: &Decision) -> PolicyDecision {
        let (idx, score) = best_option(decision, upside);
        PolicyDecision::new(idx, Some(format!("upside {score:.1}")))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_option(&mut self, state: &GameState, decision: &Decision) -> PolicyDecision {
        let (idx, score) = best_option(decision, |option| need_weighted_net(state, option));
        PolicyDecision::new(idx, Some(format!("weighted net {score:.1}")))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(&mut self, _state: &GameState, decision: &Decision) -> PolicyDecision {
        if decision.options.is_empty() {
            return PolicyDecision::new(0, None);
        }
        let idx = self.rng.gen_range(0..decision.options.len());
        PolicyDecision::new(idx, Some(String::from("uniform draw")))
    }
}

/// Highest scoring option, first index on ties.
///
/// "No response" options are only considered when nothing else exists.
fn best_option(decision: &Decision, score: impl Fn(&DecisionOption) -> f32) -> (usize, f32) {
    let only_passive = decision.options.iter().all(|option| option.no_response);
    decision
        .options
        .iter()
        .enumerate()
        .filter(|(_, option)| only_passive || !option.no_response)
        .map(|(idx, option)| (idx, score(option)))
        .fold(None, |best: Option<(usize, f32)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
        .unwrap_or((0, 0.0))
}

fn downside(option: &DecisionOption) -> f32 {
    option
        .consequences
        .iter()
        .map(|consequence| consequence.delta.min(0.0).abs())
        .sum()
}

fn upside(option: &DecisionOption) -> f32 {
    option
        .consequences
        .iter()
        .map(|consequence| consequence.delta.max(0.0))
        .sum()
}

/// Net movement, with gauges that sit low in their range counting double.
fn need_weighted_net(state: &GameState, option: &DecisionOption) -> f32 {
    option
        .consequences
        .iter()
        .map(|consequence| {
            let (min, max) = consequence.target.bounds();
            let span = (max - min).max(f32::EPSILON);
            let fill = ((state.value(consequence.target) - min) / span).clamp(0.0, 1.0);
            consequence.delta * (2.0 - fill)
        })
        .sum()
}
