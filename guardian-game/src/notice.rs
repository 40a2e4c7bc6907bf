//! Structured notices emitted by the session.
//!
//! Notices replace a process-wide announcer: every command pushes zero or
//! more of these into the session buffer and the caller drains them with
//! [`crate::GameSession::take_notices`]. The `kind` is the mechanical fact;
//! `ui_key` is only a presentation hint.

use serde::{Deserialize, Serialize};

use crate::constants::{
    NOTICE_CRISIS_EXPIRED, NOTICE_CRISIS_RESOLVED, NOTICE_CRISIS_STARTED,
    NOTICE_DECISION_QUEUED, NOTICE_DECISION_RESOLVED, NOTICE_EVENT_FIRED, NOTICE_GAME_RESET,
    NOTICE_GAME_STARTED, NOTICE_MONTH_ADVANCED, NOTICE_PHASE_ADVANCED,
};

/// Stable, deterministic identifier for a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoticeId {
    /// `elapsed_days` when the notice was raised.
    pub day: u32,
    /// Session-wide sequence number.
    pub seq: u32,
}

impl NoticeId {
    #[must_use]
    pub const fn new(day: u32, seq: u32) -> Self {
        Self { day, seq }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    GameStarted,
    GameReset,
    PhaseAdvanced,
    DecisionQueued,
    DecisionResolved,
    CrisisStarted,
    CrisisResolved,
    CrisisExpired,
    EventFired,
    MonthAdvanced,
}

impl NoticeKind {
    /// Default i18n key for the kind.
    #[must_use]
    pub const fn ui_key(self) -> &'static str {
        match self {
            Self::GameStarted => NOTICE_GAME_STARTED,
            Self::GameReset => NOTICE_GAME_RESET,
            Self::PhaseAdvanced => NOTICE_PHASE_ADVANCED,
            Self::DecisionQueued => NOTICE_DECISION_QUEUED,
            Self::DecisionResolved => NOTICE_DECISION_RESOLVED,
            Self::CrisisStarted => NOTICE_CRISIS_STARTED,
            Self::CrisisResolved => NOTICE_CRISIS_RESOLVED,
            Self::CrisisExpired => NOTICE_CRISIS_EXPIRED,
            Self::EventFired => NOTICE_EVENT_FIRED,
            Self::MonthAdvanced => NOTICE_MONTH_ADVANCED,
        }
    }

    #[must_use]
    pub const fn severity(self) -> NoticeSeverity {
        match self {
            Self::CrisisStarted | Self::CrisisExpired => NoticeSeverity::Critical,
            Self::PhaseAdvanced | Self::EventFired => NoticeSeverity::Warning,
            _ => NoticeSeverity::Info,
        }
    }

    #[must_use]
    pub const fn surface(self) -> UiSurfaceHint {
        match self.severity() {
            NoticeSeverity::Critical => UiSurfaceHint::Modal,
            NoticeSeverity::Warning => UiSurfaceHint::Toast,
            NoticeSeverity::Info => UiSurfaceHint::Log,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Info,
    Warning,
    Critical,
}

/// Hint for how a front end should surface a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

/// One observable thing that happened during a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub severity: NoticeSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_surface_hint: Option<UiSurfaceHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_key: Option<String>,
    /// Id of the decision, crisis or event involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Notice {
    #[must_use]
    pub fn new(id: NoticeId, kind: NoticeKind) -> Self {
        Self {
            id,
            kind,
            severity: kind.severity(),
            ui_surface_hint: Some(kind.surface()),
            ui_key: Some(kind.ui_key().to_string()),
            subject: None,
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Explainability record for a weighted random pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionTrace {
    pub pool_id: String,
    pub roll: RollValue,
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub base_weight: f64,
    /// Multipliers applied in order.
    pub multipliers: Vec<WeightFactor>,
    pub final_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RollValue {
    U32(u32),
    F32(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFactor {
    pub label: String,
    pub value: f64,
}
