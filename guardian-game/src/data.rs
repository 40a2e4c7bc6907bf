//! Content catalog: decision, crisis and event definitions.
//!
//! The catalog is loaded once and never mutated. Live decisions and crises
//! are clones of these templates, so nothing a session does can leak back
//! into the catalog.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::constants::DEFAULT_CRISIS_WEIGHT;
use crate::error::CatalogError;
use crate::indicators::Target;
use crate::state::GamePhase;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

pub type TagSet = SmallVec<[String; 4]>;

/// A single gauge movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    #[serde(alias = "type", alias = "field")]
    pub target: Target,
    #[serde(alias = "change")]
    pub delta: f32,
}

impl Consequence {
    #[must_use]
    pub const fn new(target: Target, delta: f32) -> Self {
        Self { target, delta }
    }
}

/// A choice within a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub label: String,
    #[serde(default)]
    pub consequences: Vec<Consequence>,
    /// Marks the "do nothing" choice applied when a crisis times out.
    #[serde(default, alias = "noResponse")]
    pub no_response: bool,
}

/// A player-facing choice point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub title: String,
    #[serde(alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub options: Vec<DecisionOption>,
    /// Phases in which the sample-decision policy may draw this decision.
    #[serde(default)]
    pub phases: Vec<GamePhase>,
}

impl Decision {
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&DecisionOption> {
        self.options.get(index)
    }

    #[must_use]
    pub fn allowed_in(&self, phase: GamePhase) -> bool {
        self.phases.is_empty() || self.phases.contains(&phase)
    }
}

/// Shared four-level ordering used by crisis urgency and event priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

pub type Urgency = Priority;

/// A time-boxed, high-urgency bundle of decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crisis {
    pub id: String,
    pub title: String,
    #[serde(alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    pub year: i32,
    /// Days the player has to respond.
    #[serde(default, alias = "timeLimit")]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    /// Explicit failure table applied on expiry.
    #[serde(default, alias = "expiryConsequences")]
    pub expiry_consequences: Option<Vec<Consequence>>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl Crisis {
    #[must_use]
    pub fn decision(&self, decision_id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|decision| decision.id == decision_id)
    }

    /// First option flagged as the "no response" choice across the crisis decisions.
    #[must_use]
    pub fn no_response_option(&self) -> Option<&DecisionOption> {
        self.decisions
            .iter()
            .flat_map(|decision| decision.options.iter())
            .find(|option| option.no_response)
    }
}

const fn default_weight() -> u32 {
    DEFAULT_CRISIS_WEIGHT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Serialized gating rules for an event. Absent fields are unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TriggerConditions {
    #[serde(alias = "minMonth", skip_serializing_if = "Option::is_none")]
    pub min_month: Option<u8>,
    #[serde(alias = "maxMonth", skip_serializing_if = "Option::is_none")]
    pub max_month: Option<u8>,
    #[serde(
        alias = "networkHealthRange",
        alias = "market_stability_range",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_health_range: Option<ValueRange>,
    #[serde(alias = "publicConfidenceRange", skip_serializing_if = "Option::is_none")]
    pub public_confidence_range: Option<ValueRange>,
    #[serde(alias = "techAdvancementRange", skip_serializing_if = "Option::is_none")]
    pub tech_advancement_range: Option<ValueRange>,
    #[serde(alias = "requiredDecisions", skip_serializing_if = "Vec::is_empty")]
    pub required_decisions: Vec<String>,
}

/// Catalog-defined occurrence that fires when its trigger conditions hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, alias = "triggerConditions")]
    pub trigger_conditions: TriggerConditions,
    #[serde(default)]
    pub consequences: Vec<Consequence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    decisions: Vec<Decision>,
    #[serde(default)]
    crises: Vec<Crisis>,
    #[serde(default)]
    events: Vec<GameEvent>,
}

/// Read-only collection of decision templates, crisis templates and events.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    decisions: Vec<Decision>,
    crises: Vec<Crisis>,
    events: Vec<GameEvent>,
    decision_index: HashMap<String, usize>,
    crisis_index: HashMap<String, usize>,
    event_index: HashMap<String, usize>,
    crisis_decision_index: HashMap<String, usize>,
}

impl ContentCatalog {
    /// Build a catalog, rejecting duplicate ids and option-less decisions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] or [`CatalogError::EmptyOptions`].
    pub fn from_parts(
        decisions: Vec<Decision>,
        crises: Vec<Crisis>,
        events: Vec<GameEvent>,
    ) -> Result<Self, CatalogError> {
        let decision_index = index_by_id("decision", decisions.iter().map(|d| d.id.as_str()))?;
        let crisis_index = index_by_id("crisis", crises.iter().map(|c| c.id.as_str()))?;
        let event_index = index_by_id("event", events.iter().map(|e| e.id.as_str()))?;

        let mut crisis_decision_index = HashMap::new();
        for (crisis_idx, crisis) in crises.iter().enumerate() {
            for decision in &crisis.decisions {
                if decision_index.contains_key(&decision.id)
                    || crisis_decision_index
                        .insert(decision.id.clone(), crisis_idx)
                        .is_some()
                {
                    return Err(CatalogError::DuplicateId {
                        kind: "decision",
                        id: decision.id.clone(),
                    });
                }
            }
        }

        if let Some(empty) = decisions
            .iter()
            .chain(crises.iter().flat_map(|crisis| crisis.decisions.iter()))
            .find(|decision| decision.options.is_empty())
        {
            return Err(CatalogError::EmptyOptions(empty.id.clone()));
        }

        Ok(Self {
            decisions,
            crises,
            events,
            decision_index,
            crisis_index,
            event_index,
            crisis_decision_index,
        })
    }

    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_parts(file.decisions, file.crises, file.events)
    }

    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset fails to parse or validate.
    pub fn load_default() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG_DATA)
    }

    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    #[must_use]
    pub fn crises(&self) -> &[Crisis] {
        &self.crises
    }

    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    #[must_use]
    pub fn decision(&self, id: &str) -> Option<&Decision> {
        self.decision_index
            .get(id)
            .and_then(|idx| self.decisions.get(*idx))
    }

    #[must_use]
    pub fn crisis(&self, id: &str) -> Option<&Crisis> {
        self.crisis_index.get(id).and_then(|idx| self.crises.get(*idx))
    }

    #[must_use]
    pub fn event(&self, id: &str) -> Option<&GameEvent> {
        self.event_index.get(id).and_then(|idx| self.events.get(*idx))
    }

    /// Crisis template that declares `decision_id` among its decisions.
    #[must_use]
    pub fn crisis_for_decision(&self, decision_id: &str) -> Option<&Crisis> {
        self.crisis_decision_index
            .get(decision_id)
            .and_then(|idx| self.crises.get(*idx))
    }
}

fn index_by_id<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::new();
    for (idx, id) in ids.enumerate() {
        if index.insert(id.to_string(), idx).is_some() {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}
