//! Completed workout records and the per-muscle set tally fed to the tracker

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::muscles::MuscleGroup;

/// Completed working sets per muscle group
pub type SetsByMuscle = BTreeMap<MuscleGroup, u32>;

/// A set as logged by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedSet {
    pub muscle_group: MuscleGroup,
    pub exercise_name: String,
    pub weight: Option<f64>,
    pub reps: u32,
    /// Unticked sets are planned but not done
    pub completed: bool,
}

/// Workout submitted by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedWorkout {
    pub performed_at: DateTime<Utc>,
    pub sets: Vec<CompletedSet>,
}

impl LoggedWorkout {
    /// Count completed sets with at least one rep, per muscle
    pub fn sets_by_muscle(&self) -> SetsByMuscle {
        let mut tally = SetsByMuscle::new();
        for set in self.sets.iter().filter(|s| s.completed && s.reps > 0) {
            *tally.entry(set.muscle_group).or_insert(0) += 1;
        }
        tally
    }
}

/// Parse `chest=10,back=6` into a tally. Repeated muscles add up.
pub fn parse_sets_by_muscle(input: &str) -> Result<SetsByMuscle> {
    let mut tally = SetsByMuscle::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((muscle, count)) = part.split_once('=') else {
            bail!("expected muscle=sets, got '{}'", part);
        };
        let group = muscle.parse::<MuscleGroup>().map_err(anyhow::Error::msg)?;
        let sets: u32 = count
            .trim()
            .parse()
            .with_context(|| format!("invalid set count for {}", group))?;
        *tally.entry(group).or_insert(0) += sets;
    }
    Ok(tally)
}
