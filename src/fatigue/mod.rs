//! Per-muscle fatigue accumulation
//!
//! Completed sets push a muscle's fatigue up, elapsed rest days pull it back
//! down. Scores are not capped at 100; anything above the deload threshold
//! flags the muscle as overreached.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::muscles::MuscleGroup;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FatigueConfig {
    /// Fatigue added per completed set
    pub fatigue_per_set: f64,
    /// Fatigue removed per day of rest
    pub decay_rate_per_day: f64,
    /// Fatigue above this flags a muscle for deload
    pub deload_threshold: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        // 14 sets reach the threshold, three rest days clear it
        Self {
            fatigue_per_set: 5.0,
            decay_rate_per_day: 25.0,
            deload_threshold: 70.0,
        }
    }
}

impl FatigueConfig {
    /// Every constant must be finite and non-negative, otherwise recorded
    /// volume could lower a score
    pub fn validate(&self) -> Result<(), InvalidFatigueConfig> {
        let fields = [
            ("fatigue_per_set", self.fatigue_per_set),
            ("decay_rate_per_day", self.decay_rate_per_day),
            ("deload_threshold", self.deload_threshold),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidFatigueConfig { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("fatigue setting {field} must be a finite non-negative number, got {value}")]
pub struct InvalidFatigueConfig {
    pub field: &'static str,
    pub value: f64,
}

/// Display bucket for a fatigue score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FatigueLevel {
    /// 30 or less, not shown
    Hidden,
    /// above 30
    Low,
    /// above 50
    Moderate,
    /// above 70
    High,
}

impl FatigueLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > 70.0 => FatigueLevel::High,
            s if s > 50.0 => FatigueLevel::Moderate,
            s if s > 30.0 => FatigueLevel::Low,
            _ => FatigueLevel::Hidden,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FatigueLevel::Hidden => "fresh",
            FatigueLevel::Low => "low",
            FatigueLevel::Moderate => "moderate",
            FatigueLevel::High => "high",
        }
    }

    pub fn bar(&self) -> &'static str {
        match self {
            FatigueLevel::Hidden => "[....]",
            FatigueLevel::Low => "[+...]",
            FatigueLevel::Moderate => "[++..]",
            FatigueLevel::High => "[+++!]",
        }
    }
}

impl std::fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fatigue for one muscle group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MuscleFatigue {
    pub group: MuscleGroup,
    pub current_fatigue: f64,
}

impl MuscleFatigue {
    pub fn needs_deload(&self, config: &FatigueConfig) -> bool {
        self.current_fatigue > config.deload_threshold
    }

    pub fn level(&self) -> FatigueLevel {
        FatigueLevel::from_score(self.current_fatigue)
    }
}

/// Tracks fatigue for every muscle touched during the active cycle.
/// Unseen muscles read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FatigueAccumulator {
    #[serde(default)]
    config: FatigueConfig,
    entries: BTreeMap<MuscleGroup, MuscleFatigue>,
}

impl FatigueAccumulator {
    pub fn new(config: FatigueConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &FatigueConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add fatigue for completed sets
    pub fn record_volume(&mut self, group: MuscleGroup, set_count: u32) {
        let entry = self.entries.entry(group).or_insert(MuscleFatigue {
            group,
            current_fatigue: 0.0,
        });
        entry.current_fatigue += set_count as f64 * self.config.fatigue_per_set;
        debug!(%group, sets = set_count, fatigue = entry.current_fatigue, "fatigue recorded");
    }

    /// Recover every muscle by `elapsed_days` of rest, never below zero
    pub fn decay(&mut self, elapsed_days: f64) {
        if elapsed_days.is_nan() || elapsed_days <= 0.0 {
            return;
        }
        let drop = self.config.decay_rate_per_day * elapsed_days;
        for entry in self.entries.values_mut() {
            entry.current_fatigue = (entry.current_fatigue - drop).max(0.0);
        }
    }

    /// Forget all fatigue
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn fatigue(&self, group: MuscleGroup) -> f64 {
        self.entries
            .get(&group)
            .map_or(0.0, |e| e.current_fatigue)
    }

    pub fn needs_deload(&self, group: MuscleGroup) -> bool {
        self.fatigue(group) > self.config.deload_threshold
    }

    /// Muscles over the deload threshold, most fatigued first
    pub fn muscles_needing_deload(&self) -> Vec<MuscleGroup> {
        self.ranked()
            .into_iter()
            .filter(|e| e.needs_deload(&self.config))
            .map(|e| e.group)
            .collect()
    }

    /// True when any muscle is over the threshold
    pub fn recommends_deload(&self) -> bool {
        self.entries.values().any(|e| e.needs_deload(&self.config))
    }

    /// Entries worth showing (above 30), most fatigued first
    pub fn visible(&self) -> Vec<MuscleFatigue> {
        self.ranked()
            .into_iter()
            .filter(|e| e.level() != FatigueLevel::Hidden)
            .collect()
    }

    /// All tracked entries sorted by fatigue, descending
    pub fn ranked(&self) -> Vec<MuscleFatigue> {
        let mut entries: Vec<MuscleFatigue> = self.entries.values().copied().collect();
        entries.sort_by(|a, b| b.current_fatigue.total_cmp(&a.current_fatigue));
        entries
    }
}
