use std::hash::Hasher;
use std::sync::Arc;

use guardian_game::{
    ContentCatalog, CrisisSelector, EngineConfig, GameSession, GameState, Notice,
};
use serde_json::{Map, Value};
use twox_hash::XxHash64;

fn play_some_months(seed: u64) -> (GameState, Vec<Notice>) {
    let catalog = Arc::new(ContentCatalog::load_default().unwrap());
    let mut session = GameSession::new(catalog, EngineConfig::default(), seed);
    session.start_game().unwrap();
    session
        .trigger_crisis(CrisisSelector::Id(String::from("mining_ban")))
        .unwrap();
    for month in 0..8_usize {
        if let Ok(decision) = session.trigger_sample_decision() {
            session
                .resolve_decision(&decision.id, month % decision.options.len())
                .unwrap();
        }
        let ids: Vec<String> = session
            .pending_events()
            .iter()
            .map(|event| event.id.clone())
            .collect();
        for id in ids {
            session.deliver_event(&id).unwrap();
        }
        session.advance_time();
    }
    let notices = session.take_notices();
    (session.into_state(), notices)
}

#[test]
fn game_state_serialization_is_lossless() {
    let (state, _) = play_some_months(0xFACE_B00C);
    assert!(!state.decisions.is_empty(), "history should have entries");
    assert!(!state.triggered_event_ids.is_empty(), "events should fire");

    let saved = serde_json::to_string(&state).unwrap();
    let restored: GameState = serde_json::from_str(&saved).unwrap();
    assert_eq!(restored, state);

    let original = canonical_hash(&serde_json::to_value(&state).unwrap());
    let roundtrip = canonical_hash(&serde_json::to_value(&restored).unwrap());
    assert_eq!(original, roundtrip, "round-trip changed the snapshot");
}

#[test]
fn identical_seeds_produce_identical_snapshots() {
    let (first, first_notices) = play_some_months(99);
    let (second, second_notices) = play_some_months(99);
    assert_eq!(
        canonical_hash(&serde_json::to_value(&first).unwrap()),
        canonical_hash(&serde_json::to_value(&second).unwrap())
    );
    assert_eq!(first_notices, second_notices);
}

#[test]
fn snapshot_uses_wire_names() {
    let (state, _) = play_some_months(3);
    let value = serde_json::to_value(&state).unwrap();
    let entry = &value["decisions"][0]["consequences"][0];
    assert!(entry.get("type").is_some(), "applied consequences use `type`");
    assert!(entry.get("value_after").is_some());
    assert!(value["game_phase"].is_string());
}

#[test]
fn engine_config_roundtrips() {
    let mut config = EngineConfig::default();
    config.phases.era5 = 7;
    config.default_expiry_penalty = -15.0;
    let json = serde_json::to_string(&config).unwrap();
    let restored = EngineConfig::from_json(&json).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn default_catalog_is_well_formed() {
    let catalog = ContentCatalog::load_default().unwrap();
    assert!(catalog.decisions().len() >= 20);
    assert_eq!(catalog.crises().len(), 5);
    for decision in catalog.decisions() {
        assert!(!decision.options.is_empty(), "{} has no options", decision.id);
    }
    for crisis in catalog.crises() {
        assert!(!crisis.decisions.is_empty(), "{} has no decisions", crisis.id);
        assert!(crisis.weight > 0);
    }
    for event in catalog.events() {
        for required in &event.trigger_conditions.required_decisions {
            assert!(
                catalog.decision(required).is_some(),
                "{} requires unknown decision {required}",
                event.id
            );
        }
    }
}

fn canonical_hash(value: &Value) -> u64 {
    let canonical = serde_json::to_string(&canonicalize_value(value.clone())).unwrap();
    snapshot_hash(canonical.as_bytes())
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut result = Map::with_capacity(entries.len());
            for (key, value) in entries {
                result.insert(key, canonicalize_value(value));
            }
            Value::Object(result)
        }
        other => other,
    }
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}
