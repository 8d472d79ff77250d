//! Tunable simulation parameters.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Line-of-sight evaluation strategy used by the AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LosMode {
    /// Trace the Bresenham line and stop at the first blocking cell.
    #[default]
    Traced,
    /// Grant sight to anything within range, ignoring obstacles.
    RangeOnly,
}

/// Configuration for simulation rates, cadences and thresholds.
///
/// Every field has a default, so a JSON override only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds between AI think passes.
    pub ai_interval: f32,
    /// Manhattan distance within which an AI can see its target.
    pub sight_range: i32,
    /// How sight lines are checked.
    pub los_mode: LosMode,
    /// Radius searched for a flee destination.
    pub flee_radius: i32,
    /// Seconds between path follower steps.
    pub path_step_interval: f32,
    /// Step length used by `Simulation::advance`.
    pub fixed_timestep: f32,
    /// Cap on fixed steps run for one frame, so a stall cannot snowball.
    pub max_steps_per_frame: u32,

    /// Lifetime of a spawned `Fire` in seconds.
    pub fire_duration: f32,
    /// Temperature added per second to each adjacent flammable.
    pub fire_heat_rate: f32,
    /// Temperature at which a flammable bursts into flames.
    pub ignite_temperature: f32,
    /// Temperature lost per second while below the ignition point.
    pub cool_rate: f32,
    /// Lifetime of the small fire attached to a burning entity.
    pub small_fire_duration: f32,
    /// Health lost per second while burning.
    pub small_fire_dps: f32,

    /// Invulnerability window after taking a hit.
    pub hit_cooldown: f32,
    /// Lifetime of transient visual effects.
    pub effect_duration: f32,

    /// Seed for wander decisions.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ai_interval: 0.25,
            sight_range: 6,
            los_mode: LosMode::Traced,
            flee_radius: 4,
            path_step_interval: 0.3,
            fixed_timestep: 1.0 / 30.0,
            max_steps_per_frame: 5,
            fire_duration: 3.0,
            fire_heat_rate: 125.0,
            ignite_temperature: 100.0,
            cool_rate: 10.0,
            small_fire_duration: 2.0,
            small_fire_dps: 3.0,
            hit_cooldown: 0.5,
            effect_duration: 0.5,
            seed: 0x5eed,
        }
    }
}

impl SimConfig {
    /// Load a configuration from JSON, filling missing keys with defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "sight_range": 9, "los_mode": "range_only" }"#).unwrap();
        assert_eq!(config.sight_range, 9);
        assert_eq!(config.los_mode, LosMode::RangeOnly);
        assert_eq!(config.ignite_temperature, 100.0);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(SimConfig::from_json(r#"{ "sight_range": "far" }"#).is_err());
    }
}
