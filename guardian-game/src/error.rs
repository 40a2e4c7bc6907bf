//! Error types for the Protocol Guardian engine.

use thiserror::Error;

/// Failures returned by engine commands.
///
/// Every variant is local and recoverable: the state is left untouched and
/// the caller may retry with different input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("option {index} is out of range for decision {decision_id} ({available} options)")]
    InvalidOption {
        decision_id: String,
        index: usize,
        available: usize,
    },

    #[error("unknown decision: {0}")]
    UnknownDecision(String),

    #[error("unknown crisis: {0}")]
    UnknownCrisis(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("event {0} is not published")]
    EventNotPublished(String),

    #[error("no crisis is currently active")]
    NoActiveCrisis,

    #[error("crisis {0} is still active")]
    CrisisAlreadyActive(String),

    #[error("the game has already ended")]
    GameOver,
}

/// Failures raised while loading the content catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("decision {0} has no options")]
    EmptyOptions(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_id() {
        let err = EngineError::InvalidOption {
            decision_id: String::from("d1"),
            index: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "option 4 is out of range for decision d1 (2 options)"
        );
        let dup = CatalogError::DuplicateId {
            kind: "event",
            id: String::from("e1"),
        };
        assert_eq!(dup.to_string(), "duplicate event id: e1");
    }
}
