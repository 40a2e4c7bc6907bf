//! Era progression and the simulation clock.
//!
//! Two orthogonal progress axes live here: the calendar, which only moves on
//! [`GameState::advance_time`], and the phase ladder, which only moves when the
//! decision counter fills the current era.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ERA1_DECISIONS, ERA2_DECISIONS, ERA3_DECISIONS, ERA4_DECISIONS, ERA5_DECISIONS,
    INTRO_DECISIONS, MONTHS_PER_YEAR,
};
use crate::numbers::rounded_percent;
use crate::state::GameState;

/// Coarse progression stage. Strictly linear, no skipping, no cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Intro,
    Era1,
    Era2,
    Era3,
    Era4,
    Era5,
    Ending,
}

impl GamePhase {
    pub const ALL: &'static [Self] = &[
        Self::Intro,
        Self::Era1,
        Self::Era2,
        Self::Era3,
        Self::Era4,
        Self::Era5,
        Self::Ending,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Era1 => "era1",
            Self::Era2 => "era2",
            Self::Era3 => "era3",
            Self::Era4 => "era4",
            Self::Era5 => "era5",
            Self::Ending => "ending",
        }
    }

    /// Successor on the ladder; `None` once the game has ended.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Intro => Some(Self::Era1),
            Self::Era1 => Some(Self::Era2),
            Self::Era2 => Some(Self::Era3),
            Self::Era3 => Some(Self::Era4),
            Self::Era4 => Some(Self::Era5),
            Self::Era5 => Some(Self::Ending),
            Self::Ending => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ending)
    }

    #[must_use]
    pub const fn is_era(self) -> bool {
        !matches!(self, Self::Intro | Self::Ending)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|phase| phase.as_str() == s)
            .ok_or(())
    }
}

/// Number of decisions that complete each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    #[serde(default)]
    pub intro: u32,
    pub era1: u32,
    pub era2: u32,
    pub era3: u32,
    pub era4: u32,
    pub era5: u32,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            intro: INTRO_DECISIONS,
            era1: ERA1_DECISIONS,
            era2: ERA2_DECISIONS,
            era3: ERA3_DECISIONS,
            era4: ERA4_DECISIONS,
            era5: ERA5_DECISIONS,
        }
    }
}

impl PhaseSchedule {
    #[must_use]
    pub const fn decisions_for(&self, phase: GamePhase) -> u32 {
        match phase {
            GamePhase::Intro => self.intro,
            GamePhase::Era1 => self.era1,
            GamePhase::Era2 => self.era2,
            GamePhase::Era3 => self.era3,
            GamePhase::Era4 => self.era4,
            GamePhase::Era5 => self.era5,
            GamePhase::Ending => 0,
        }
    }

    /// Decisions needed to walk from era 1 to the ending.
    #[must_use]
    pub const fn total_era_decisions(&self) -> u32 {
        self.era1 + self.era2 + self.era3 + self.era4 + self.era5
    }
}

impl GameState {
    /// Advance the calendar one month, wrapping December into January.
    ///
    /// Phase is never touched here; the clock and the era ladder are
    /// independent.
    pub fn advance_time(&mut self, days_per_month: u32) {
        if self.current_month >= MONTHS_PER_YEAR {
            self.current_month = 1;
            self.current_year = self.current_year.saturating_add(1);
        } else {
            self.current_month = self.current_month.saturating_add(1).max(1);
        }
        self.elapsed_days = self.elapsed_days.saturating_add(days_per_month);
        self.recompute_term_progress();
    }

    /// `round(100 * current_decision / total_decisions_in_era)`, clamped.
    ///
    /// An empty era reads as complete only once the game has ended.
    pub fn recompute_term_progress(&mut self) {
        self.term_progress =
            rounded_percent(self.current_decision, self.total_decisions_in_era).unwrap_or(
                if self.game_phase.is_terminal() { 100.0 } else { 0.0 },
            );
    }

    /// Step forward while the current era is full.
    ///
    /// Eras scheduled with zero decisions are passed straight through.
    /// Returns the last phase entered, if any.
    pub fn advance_phase_if_complete(&mut self, schedule: &PhaseSchedule) -> Option<GamePhase> {
        let mut entered = None;
        while self.current_decision >= self.total_decisions_in_era {
            let Some(next) = self.game_phase.next() else {
                break;
            };
            log::info!(
                "phase advance {} -> {} after {} decisions",
                self.game_phase,
                next,
                self.current_decision
            );
            self.game_phase = next;
            self.current_decision = 0;
            self.total_decisions_in_era = schedule.decisions_for(next);
            entered = Some(next);
        }
        if entered.is_some() {
            self.recompute_term_progress();
        }
        entered
    }
}
