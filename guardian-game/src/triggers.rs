//! Event eligibility.
//!
//! Each event's serialized [`TriggerConditions`] is flattened into a list of
//! [`TriggerClause`] predicates that are combined with logical AND. The
//! evaluator never mutates state; delivery bookkeeping belongs to
//! [`crate::consequences::mark_event_triggered`].
use crate::data::{ContentCatalog, EventStatus, GameEvent, TriggerConditions, ValueRange};
use crate::indicators::Target;
use crate::state::GameState;

/// One independently testable gating rule.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerClause<'a> {
    /// Inclusive month window; `None` bounds are open.
    MonthRange { min: Option<u8>, max: Option<u8> },
    /// Inclusive range over a single indicator.
    IndicatorRange { target: Target, range: ValueRange },
    /// Every listed decision id must already be in the history.
    RequiredDecisions(&'a [String]),
}

impl TriggerClause<'_> {
    #[must_use]
    pub fn holds(&self, state: &GameState) -> bool {
        match self {
            Self::MonthRange { min, max } => {
                min.is_none_or(|min| state.current_month >= min)
                    && max.is_none_or(|max| state.current_month <= max)
            }
            Self::IndicatorRange { target, range } => range.contains(state.value(*target)),
            Self::RequiredDecisions(ids) => ids.iter().all(|id| state.has_resolved(id)),
        }
    }
}

impl TriggerConditions {
    /// Clauses present in these conditions. Empty means always eligible.
    #[must_use]
    pub fn clauses(&self) -> Vec<TriggerClause<'_>> {
        let mut clauses = Vec::new();
        if self.min_month.is_some() || self.max_month.is_some() {
            clauses.push(TriggerClause::MonthRange {
                min: self.min_month,
                max: self.max_month,
            });
        }
        let ranges = [
            (Target::MarketStability, self.network_health_range),
            (Target::PublicConfidence, self.public_confidence_range),
            (Target::TechAdvancement, self.tech_advancement_range),
        ];
        for (target, range) in ranges {
            if let Some(range) = range {
                clauses.push(TriggerClause::IndicatorRange { target, range });
            }
        }
        if !self.required_decisions.is_empty() {
            clauses.push(TriggerClause::RequiredDecisions(&self.required_decisions));
        }
        clauses
    }

    #[must_use]
    pub fn hold(&self, state: &GameState) -> bool {
        self.clauses().iter().all(|clause| clause.holds(state))
    }
}

/// Whether a single event may fire against `state`.
#[must_use]
pub fn is_eligible(event: &GameEvent, state: &GameState) -> bool {
    event.status == EventStatus::Published
        && !state.triggered_event_ids.contains(&event.id)
        && event.trigger_conditions.hold(state)
}

/// Every event currently eligible to fire, highest priority first.
///
/// Ties keep catalog declaration order. Pure: the same state always yields
/// the same sequence, and no delivery limit is applied here.
#[must_use]
pub fn triggered_events<'a>(state: &GameState, catalog: &'a ContentCatalog) -> Vec<&'a GameEvent> {
    let mut eligible: Vec<&GameEvent> = catalog
        .events()
        .iter()
        .filter(|event| is_eligible(event, state))
        .collect();
    // stable sort keeps declaration order within a priority
    eligible.sort_by(|a, b| b.priority.cmp(&a.priority));
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Consequence, Priority};
    use crate::state::ResolvedDecision;

    fn event(id: &str, priority: Priority, conditions: TriggerConditions) -> GameEvent {
        GameEvent {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            category: String::from("test"),
            tags: Default::default(),
            priority,
            status: EventStatus::Published,
            trigger_conditions: conditions,
            consequences: vec![Consequence::new(Target::PublicConfidence, 1.0)],
        }
    }

    fn resolved(id: &str) -> ResolvedDecision {
        ResolvedDecision {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            option_index: 0,
            option_label: String::from("ok"),
            crisis_id: None,
            phase: crate::state::GamePhase::Era1,
            month: 1,
            year: 2009,
            consequences: Vec::new(),
        }
    }

    #[test]
    fn month_window_is_inclusive_and_open_ended() {
        let mut state = GameState::default();
        let clause = TriggerClause::MonthRange {
            min: Some(6),
            max: None,
        };
        state.current_month = 5;
        assert!(!clause.holds(&state));
        state.current_month = 6;
        assert!(clause.holds(&state));
        state.current_month = 12;
        assert!(clause.holds(&state));
    }

    #[test]
    fn indicator_range_is_inclusive() {
        let mut state = GameState::default();
        let clause = TriggerClause::IndicatorRange {
            target: Target::TechAdvancement,
            range: ValueRange::new(20.0, 40.0),
        };
        state.indicators.tech_advancement = 20.0;
        assert!(clause.holds(&state));
        state.indicators.tech_advancement = 40.0;
        assert!(clause.holds(&state));
        state.indicators.tech_advancement = 40.5;
        assert!(!clause.holds(&state));
    }

    #[test]
    fn required_decisions_are_a_conjunction() {
        let mut state = GameState::default();
        let ids = vec![String::from("a"), String::from("b")];
        let clause = TriggerClause::RequiredDecisions(&ids);
        state.decisions.push(resolved("a"));
        assert!(!clause.holds(&state));
        state.decisions.push(resolved("b"));
        assert!(clause.holds(&state));
    }

    #[test]
    fn empty_conditions_have_no_clauses() {
        assert!(TriggerConditions::default().clauses().is_empty());
        assert!(TriggerConditions::default().hold(&GameState::default()));
    }

    #[test]
    fn all_clauses_must_hold() {
        let conditions = TriggerConditions {
            min_month: Some(3),
            public_confidence_range: Some(ValueRange::new(60.0, 100.0)),
            ..TriggerConditions::default()
        };
        assert_eq!(conditions.clauses().len(), 2);
        let mut state = GameState::default();
        state.current_month = 4;
        state.indicators.public_confidence = 50.0;
        assert!(!conditions.hold(&state));
        state.indicators.public_confidence = 60.0;
        assert!(conditions.hold(&state));
    }

    #[test]
    fn results_order_by_priority_then_declaration() {
        let catalog = ContentCatalog::from_parts(
            Vec::new(),
            Vec::new(),
            vec![
                event("low", Priority::Low, TriggerConditions::default()),
                event("high_a", Priority::High, TriggerConditions::default()),
                event("critical", Priority::Critical, TriggerConditions::default()),
                event("high_b", Priority::High, TriggerConditions::default()),
            ],
        )
        .unwrap();
        let state = GameState::default();
        let ids: Vec<&str> = triggered_events(&state, &catalog)
            .iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(ids, vec!["critical", "high_a", "high_b", "low"]);
    }

    #[test]
    fn unpublished_and_already_fired_events_are_skipped() {
        let mut draft = event("draft", Priority::Critical, TriggerConditions::default());
        draft.status = EventStatus::Draft;
        let mut archived = event("archived", Priority::Critical, TriggerConditions::default());
        archived.status = EventStatus::Archived;
        let catalog = ContentCatalog::from_parts(
            Vec::new(),
            Vec::new(),
            vec![
                draft,
                archived,
                event("fired", Priority::High, TriggerConditions::default()),
                event("fresh", Priority::Low, TriggerConditions::default()),
            ],
        )
        .unwrap();
        let mut state = GameState::default();
        state.triggered_event_ids.insert(String::from("fired"));
        let ids: Vec<&str> = triggered_events(&state, &catalog)
            .iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(ids, vec!["fresh"]);
    }
}
