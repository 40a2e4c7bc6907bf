//! Bounded simulation gauges: the three health indicators and the three bloc
//! relationship scores.
//!
//! Every write goes through [`clamp_delta`], which truncates at the declared
//! bound instead of wrapping or rejecting.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    INDICATOR_MAX, INDICATOR_MIN, RELATIONSHIP_MAX, RELATIONSHIP_MIN, START_EASTERN_BLOC,
    START_GLOBAL_SOUTH, START_MARKET_STABILITY, START_PUBLIC_CONFIDENCE, START_TECH_ADVANCEMENT,
    START_WESTERN_ALLIANCE,
};
use crate::numbers::finite_or_zero;

/// Health indicators, each clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(alias = "marketStability", alias = "network_health", alias = "networkHealth")]
    pub market_stability: f32,
    #[serde(alias = "publicConfidence")]
    pub public_confidence: f32,
    #[serde(alias = "techAdvancement")]
    pub tech_advancement: f32,
}

impl Default for Indicators {
    fn default() -> Self {
        Self {
            market_stability: START_MARKET_STABILITY,
            public_confidence: START_PUBLIC_CONFIDENCE,
            tech_advancement: START_TECH_ADVANCEMENT,
        }
    }
}

/// Standing with each geopolitical bloc, clamped to `[-100, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlocRelationships {
    #[serde(alias = "westernAlliance")]
    pub western_alliance: f32,
    #[serde(alias = "easternBloc")]
    pub eastern_bloc: f32,
    #[serde(alias = "globalSouth")]
    pub global_south: f32,
}

impl Default for BlocRelationships {
    fn default() -> Self {
        Self {
            western_alliance: START_WESTERN_ALLIANCE,
            eastern_bloc: START_EASTERN_BLOC,
            global_south: START_GLOBAL_SOUTH,
        }
    }
}

impl BlocRelationships {
    /// Bloc with the highest standing; ties resolve in declaration order.
    #[must_use]
    pub fn strongest(&self) -> Target {
        self.ranked()
            .into_iter()
            .fold((Target::WesternAlliance, f32::MIN), |best, (target, value)| {
                if value > best.1 { (target, value) } else { best }
            })
            .0
    }

    /// Bloc with the lowest standing; ties resolve in declaration order.
    #[must_use]
    pub fn weakest(&self) -> Target {
        self.ranked()
            .into_iter()
            .fold((Target::WesternAlliance, f32::MAX), |worst, (target, value)| {
                if value < worst.1 { (target, value) } else { worst }
            })
            .0
    }

    const fn ranked(&self) -> [(Target, f32); 3] {
        [
            (Target::WesternAlliance, self.western_alliance),
            (Target::EasternBloc, self.eastern_bloc),
            (Target::GlobalSouth, self.global_south),
        ]
    }
}

/// Addressable gauge a consequence can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[serde(alias = "marketStability", alias = "network_health", alias = "networkHealth")]
    MarketStability,
    #[serde(alias = "publicConfidence")]
    PublicConfidence,
    #[serde(alias = "techAdvancement")]
    TechAdvancement,
    #[serde(alias = "westernAlliance")]
    WesternAlliance,
    #[serde(alias = "easternBloc")]
    EasternBloc,
    #[serde(alias = "globalSouth")]
    GlobalSouth,
}

impl Target {
    pub const ALL: &'static [Self] = &[
        Self::MarketStability,
        Self::PublicConfidence,
        Self::TechAdvancement,
        Self::WesternAlliance,
        Self::EasternBloc,
        Self::GlobalSouth,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketStability => "market_stability",
            Self::PublicConfidence => "public_confidence",
            Self::TechAdvancement => "tech_advancement",
            Self::WesternAlliance => "western_alliance",
            Self::EasternBloc => "eastern_bloc",
            Self::GlobalSouth => "global_south",
        }
    }

    #[must_use]
    pub const fn is_relationship(self) -> bool {
        matches!(
            self,
            Self::WesternAlliance | Self::EasternBloc | Self::GlobalSouth
        )
    }

    /// Inclusive `(min, max)` bound for this gauge.
    #[must_use]
    pub const fn bounds(self) -> (f32, f32) {
        if self.is_relationship() {
            (RELATIONSHIP_MIN, RELATIONSHIP_MAX)
        } else {
            (INDICATOR_MIN, INDICATOR_MAX)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market_stability" | "marketStability" | "network_health" | "networkHealth" => {
                Ok(Self::MarketStability)
            }
            "public_confidence" | "publicConfidence" => Ok(Self::PublicConfidence),
            "tech_advancement" | "techAdvancement" => Ok(Self::TechAdvancement),
            "western_alliance" | "westernAlliance" => Ok(Self::WesternAlliance),
            "eastern_bloc" | "easternBloc" => Ok(Self::EasternBloc),
            "global_south" | "globalSouth" => Ok(Self::GlobalSouth),
            _ => Err(()),
        }
    }
}

/// Add `delta` to `slot` and clamp to the bound of `target`.
///
/// Non-finite deltas count as zero. Returns the stored value.
pub fn clamp_delta(slot: &mut f32, target: Target, delta: f32) -> f32 {
    let (min, max) = target.bounds();
    *slot = (finite_or_zero(*slot) + finite_or_zero(delta)).clamp(min, max);
    *slot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_truncates_at_both_bounds() {
        let mut confidence = 50.0;
        let floor = clamp_delta(&mut confidence, Target::PublicConfidence, -60.0);
        assert!(floor.abs() < f32::EPSILON);
        let ceiling = clamp_delta(&mut confidence, Target::PublicConfidence, 250.0);
        assert!((ceiling - 100.0).abs() < f32::EPSILON);

        let mut bloc = 90.0;
        assert!((clamp_delta(&mut bloc, Target::EasternBloc, 30.0) - 100.0).abs() < f32::EPSILON);
        assert!((clamp_delta(&mut bloc, Target::EasternBloc, -500.0) + 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn non_finite_delta_is_ignored() {
        let mut stability = 42.0;
        clamp_delta(&mut stability, Target::MarketStability, f32::NAN);
        assert!((stability - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn target_parses_aliases() {
        assert_eq!("networkHealth".parse::<Target>(), Ok(Target::MarketStability));
        assert_eq!("global_south".parse::<Target>(), Ok(Target::GlobalSouth));
        assert!("pants".parse::<Target>().is_err());
        let parsed: Target = serde_json::from_str("\"networkHealth\"").unwrap();
        assert_eq!(parsed, Target::MarketStability);
    }

    #[test]
    fn strongest_and_weakest_blocs() {
        let relations = BlocRelationships {
            western_alliance: 10.0,
            eastern_bloc: -40.0,
            global_south: 35.0,
        };
        assert_eq!(relations.strongest(), Target::GlobalSouth);
        assert_eq!(relations.weakest(), Target::EasternBloc);
        assert_eq!(BlocRelationships::default().strongest(), Target::WesternAlliance);
    }
}
