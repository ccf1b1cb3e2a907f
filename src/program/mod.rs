//! Program templates - read-only training programs a cycle is started from
//!
//! Features:
//! - Template data model (days, exercise prescriptions, muscle priorities)
//! - Template validation
//! - Next-day resolution with weekly volume progression (resolver)
//! - Deload week scheduling policies (deload)
//! - Built-in program catalog (catalog)

pub mod catalog;
pub mod deload;
pub mod resolver;

pub use catalog::{BuiltinCatalog, ProgramCatalog};
pub use deload::{DeloadPolicy, EveryNthWeek, FinalWeek, NoDeload};
pub use resolver::{ProgramResolver, ResolvedDay, ResolverConfig};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::muscles::MuscleGroup;

/// Malformed program template. Fatal to resolution and to starting a cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("program '{0}' has no days in its week template")]
    EmptyWeekTemplate(String),
    #[error("program '{0}' must last at least one week")]
    ZeroDuration(String),
    #[error("program '{program}' declares {declared} days per week but its template has {actual}")]
    DayCountMismatch {
        program: String,
        declared: u32,
        actual: usize,
    },
    #[error("day number {day} is outside 1..={days}")]
    DayNumberOutOfRange { day: u32, days: usize },
    #[error("day number {0} appears more than once")]
    DuplicateDayNumber(u32),
    #[error("'{exercise}' on day {day} prescribes zero sets")]
    ZeroSets { day: u32, exercise: String },
    #[error("'{exercise}' on day {day} has reps {min}-{max}")]
    InvalidRepRange {
        day: u32,
        exercise: String,
        min: u32,
        max: u32,
    },
    #[error("starting volume multiplier {0} must be a positive number")]
    InvalidMultiplier(f64),
    #[error("'{name}' schedules {weeks} weeks of {days} days, too many to track")]
    TooManyWorkouts { name: String, weeks: u32, days: u32 },
}

/// Days in a cycle of `weeks` x `days`, rejecting counts that overflow
pub fn checked_total_workouts(
    name: &str,
    weeks: u32,
    days: u32,
) -> Result<u32, ConfigurationError> {
    weeks
        .checked_mul(days)
        .ok_or_else(|| ConfigurationError::TooManyWorkouts {
            name: name.to_string(),
            weeks,
            days,
        })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// How much weekly volume a program directs at a muscle group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MusclePriority {
    Focus,
    Normal,
    Maintain,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Workout,
    Rest,
    Cardio,
    ActiveRecovery,
}

impl DayType {
    pub fn label(&self) -> &'static str {
        match self {
            DayType::Workout => "workout",
            DayType::Rest => "rest",
            DayType::Cardio => "cardio",
            DayType::ActiveRecovery => "active recovery",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Compound,
    Isolation,
}

/// One exercise slot in a program day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExercisePrescription {
    pub muscle_group: MuscleGroup,
    pub exercise_name: String,
    pub category: ExerciseCategory,
    /// Base set count before weekly scaling
    pub sets: u32,
    pub reps_min: u32,
    pub reps_max: u32,
    /// Reps in reserve
    pub rir_target: u32,
    pub rest_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramDay {
    /// 1-based, unique within the template
    pub day_number: u32,
    pub day_type: DayType,
    #[serde(default)]
    pub exercises: Vec<ExercisePrescription>,
    /// Passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardio_activities: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_suggestions: Option<serde_json::Value>,
}

impl ProgramDay {
    pub fn is_workout(&self) -> bool {
        self.day_type == DayType::Workout
    }
}

/// Training program template, immutable once selected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingProgram {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub duration_weeks: u32,
    pub days_per_week: u32,
    #[serde(default)]
    pub muscle_priorities: BTreeMap<MuscleGroup, MusclePriority>,
    /// Target sessions per week for each muscle
    #[serde(default)]
    pub weekly_frequency: BTreeMap<MuscleGroup, u32>,
    pub starting_volume_multiplier: f64,
    /// Extra sets per exercise added each week after the first
    pub volume_progression_per_week: u32,
    pub week_template: Vec<ProgramDay>,
}

impl TrainingProgram {
    /// Parse a program template from JSON and validate it
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let program: TrainingProgram = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    /// Check the template is well-formed enough to start a cycle from
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.week_template.is_empty() {
            return Err(ConfigurationError::EmptyWeekTemplate(self.id.clone()));
        }
        if self.duration_weeks == 0 {
            return Err(ConfigurationError::ZeroDuration(self.id.clone()));
        }
        if self.days_per_week as usize != self.week_template.len() {
            return Err(ConfigurationError::DayCountMismatch {
                program: self.id.clone(),
                declared: self.days_per_week,
                actual: self.week_template.len(),
            });
        }
        checked_total_workouts(&self.id, self.duration_weeks, self.days_per_week)?;
        if !self.starting_volume_multiplier.is_finite() || self.starting_volume_multiplier <= 0.0 {
            return Err(ConfigurationError::InvalidMultiplier(
                self.starting_volume_multiplier,
            ));
        }

        let days = self.week_template.len();
        let mut seen = BTreeSet::new();
        for day in &self.week_template {
            if day.day_number == 0 || day.day_number as usize > days {
                return Err(ConfigurationError::DayNumberOutOfRange {
                    day: day.day_number,
                    days,
                });
            }
            if !seen.insert(day.day_number) {
                return Err(ConfigurationError::DuplicateDayNumber(day.day_number));
            }
            for ex in &day.exercises {
                if ex.sets == 0 {
                    return Err(ConfigurationError::ZeroSets {
                        day: day.day_number,
                        exercise: ex.exercise_name.clone(),
                    });
                }
                if ex.reps_min > ex.reps_max {
                    return Err(ConfigurationError::InvalidRepRange {
                        day: day.day_number,
                        exercise: ex.exercise_name.clone(),
                        min: ex.reps_min,
                        max: ex.reps_max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Total scheduled days across the cycle, rest days included.
    /// Saturates on templates that fail validation.
    pub fn total_workouts(&self) -> u32 {
        self.duration_weeks.saturating_mul(self.days_per_week)
    }

    pub fn workout_days(&self) -> usize {
        self.week_template.iter().filter(|d| d.is_workout()).count()
    }

    pub fn priority(&self, group: MuscleGroup) -> MusclePriority {
        self.muscle_priorities
            .get(&group)
            .copied()
            .unwrap_or(MusclePriority::Normal)
    }

    /// Sessions per week that actually hit each muscle in the template
    pub fn template_frequency(&self) -> BTreeMap<MuscleGroup, u32> {
        let mut freq = BTreeMap::new();
        for day in self.week_template.iter().filter(|d| d.is_workout()) {
            let groups: BTreeSet<MuscleGroup> =
                day.exercises.iter().map(|e| e.muscle_group).collect();
            for group in groups {
                *freq.entry(group).or_insert(0) += 1;
            }
        }
        freq
    }

    /// Muscles whose declared weekly frequency differs from the template.
    /// Returns (muscle, declared, actual).
    pub fn frequency_mismatches(&self) -> Vec<(MuscleGroup, u32, u32)> {
        let actual = self.template_frequency();
        self.weekly_frequency
            .iter()
            .filter_map(|(group, declared)| {
                let got = actual.get(group).copied().unwrap_or(0);
                (got != *declared).then_some((*group, *declared, got))
            })
            .collect()
    }
}
