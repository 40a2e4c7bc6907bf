//! Centralized balance and tuning constants for the Protocol Guardian engine.
//!
//! Bounds and starting values live here so that gameplay can only be adjusted
//! through reviewed code changes or an explicit [`crate::EngineConfig`].

// Bounds -------------------------------------------------------------------
pub const INDICATOR_MIN: f32 = 0.0;
pub const INDICATOR_MAX: f32 = 100.0;
pub const RELATIONSHIP_MIN: f32 = -100.0;
pub const RELATIONSHIP_MAX: f32 = 100.0;

// Starting state -----------------------------------------------------------
pub const START_MONTH: u8 = 1;
pub const START_YEAR: i32 = 2009;
pub const START_MARKET_STABILITY: f32 = 50.0;
pub const START_PUBLIC_CONFIDENCE: f32 = 50.0;
pub const START_TECH_ADVANCEMENT: f32 = 30.0;
pub const START_WESTERN_ALLIANCE: f32 = 0.0;
pub const START_EASTERN_BLOC: f32 = 0.0;
pub const START_GLOBAL_SOUTH: f32 = 0.0;

// Clock --------------------------------------------------------------------
pub const MONTHS_PER_YEAR: u8 = 12;
pub const DAYS_PER_MONTH: u32 = 30;

// Phase schedule -----------------------------------------------------------
pub const INTRO_DECISIONS: u32 = 0;
pub const ERA1_DECISIONS: u32 = 3;
pub const ERA2_DECISIONS: u32 = 4;
pub const ERA3_DECISIONS: u32 = 4;
pub const ERA4_DECISIONS: u32 = 4;
pub const ERA5_DECISIONS: u32 = 5;

// Crisis tuning ------------------------------------------------------------
pub const DEFAULT_EXPIRY_PENALTY: f32 = -10.0;
pub const DEFAULT_CRISIS_WEIGHT: u32 = 5;
pub(crate) const CRISIS_POOL_ID: &str = "guardian.crisis";

// Notice keys --------------------------------------------------------------
pub(crate) const NOTICE_GAME_STARTED: &str = "notice.game.started";
pub(crate) const NOTICE_GAME_RESET: &str = "notice.game.reset";
pub(crate) const NOTICE_PHASE_ADVANCED: &str = "notice.phase.advanced";
pub(crate) const NOTICE_DECISION_QUEUED: &str = "notice.decision.queued";
pub(crate) const NOTICE_DECISION_RESOLVED: &str = "notice.decision.resolved";
pub(crate) const NOTICE_CRISIS_STARTED: &str = "notice.crisis.started";
pub(crate) const NOTICE_CRISIS_RESOLVED: &str = "notice.crisis.resolved";
pub(crate) const NOTICE_CRISIS_EXPIRED: &str = "notice.crisis.expired";
pub(crate) const NOTICE_EVENT_FIRED: &str = "notice.event.fired";
pub(crate) const NOTICE_MONTH_ADVANCED: &str = "notice.clock.month";

// Outcome scoring ----------------------------------------------------------
pub const SCORE_MAX: i32 = 1_000;
pub(crate) const FLOAT_EPSILON: f64 = 1e-6;
