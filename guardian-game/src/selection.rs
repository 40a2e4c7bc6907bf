//! Weighted random crisis selection.
use rand::Rng;
use std::collections::BTreeSet;

use crate::constants::CRISIS_POOL_ID;
use crate::data::{ContentCatalog, Crisis};
use crate::notice::{RollValue, SelectionTrace, WeightFactor, WeightedCandidate};

/// Crisis picked at random together with the trace explaining the pick.
#[derive(Debug, Clone, PartialEq)]
pub struct CrisisPick<'a> {
    pub crisis: &'a Crisis,
    pub trace: SelectionTrace,
}

/// Pick an index from `(idx, weight)` pairs.
///
/// A zero total falls back to a uniform draw. Returns the chosen index and
/// the raw roll, or `None` for an empty slice.
pub fn choose_weighted<R>(candidates: &[(usize, u32)], rng: &mut R) -> Option<(usize, u32)>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return None;
    }
    let total_weight = candidates
        .iter()
        .fold(0_u32, |acc, (_, weight)| acc.saturating_add(*weight));
    if total_weight == 0 {
        let choice = rng.gen_range(0..candidates.len());
        return Some((candidates[choice].0, u32::try_from(choice).unwrap_or(0)));
    }

    let original_roll = rng.gen_range(0..total_weight);
    let mut roll = original_roll;
    let mut selected = candidates[0].0;
    for (idx, weight) in candidates {
        if *weight == 0 {
            continue;
        }
        if roll < *weight {
            selected = *idx;
            break;
        }
        roll = roll.saturating_sub(*weight);
    }
    Some((selected, original_roll))
}

/// Draw a crisis, preferring those not yet seen this session.
///
/// Once every crisis has been seen the whole catalog is eligible again.
pub fn pick_crisis_with_trace<'a, R>(
    catalog: &'a ContentCatalog,
    seen: &BTreeSet<String>,
    rng: &mut R,
) -> Option<CrisisPick<'a>>
where
    R: Rng + ?Sized,
{
    let crises = catalog.crises();
    let mut candidates: Vec<(usize, u32)> = crises
        .iter()
        .enumerate()
        .filter(|(_, crisis)| !seen.contains(&crisis.id))
        .map(|(idx, crisis)| (idx, crisis.weight))
        .collect();
    let repeat_fallback = candidates.is_empty();
    if repeat_fallback {
        candidates = crises
            .iter()
            .enumerate()
            .map(|(idx, crisis)| (idx, crisis.weight))
            .collect();
    }

    let (chosen_idx, roll) = choose_weighted(&candidates, rng)?;
    let crisis = crises.get(chosen_idx)?;
    let uniform_fallback = candidates.iter().all(|(_, weight)| *weight == 0);

    let weighted_candidates = candidates
        .iter()
        .filter_map(|(idx, weight)| {
            let candidate = crises.get(*idx)?;
            let mut multipliers = Vec::new();
            if repeat_fallback {
                multipliers.push(WeightFactor {
                    label: String::from("repeat_fallback"),
                    value: 1.0,
                });
            }
            let base_weight = if uniform_fallback {
                multipliers.push(WeightFactor {
                    label: String::from("uniform_fallback"),
                    value: 1.0,
                });
                1.0
            } else {
                f64::from(*weight)
            };
            Some(WeightedCandidate {
                id: candidate.id.clone(),
                base_weight,
                multipliers,
                final_weight: base_weight,
            })
        })
        .collect();

    log::debug!("picked crisis {} (roll {roll})", crisis.id);
    Some(CrisisPick {
        crisis,
        trace: SelectionTrace {
            pool_id: CRISIS_POOL_ID.to_string(),
            roll: RollValue::U32(roll),
            candidates: weighted_candidates,
            chosen_id: crisis.id.clone(),
        },
    })
}
