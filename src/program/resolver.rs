//! Program template resolver
//!
//! Maps (template, progress) to the next day's prescription with set counts
//! scaled for the current week:
//! - week 1 uses `starting_volume_multiplier` on the base sets
//! - each later week adds `volume_progression_per_week` sets
//! - deload weeks use `deload_factor` of the base sets instead

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ConfigurationError, ProgramDay, TrainingProgram};
use crate::cycle::{WeekInfo, week_for};
use crate::muscles::MuscleGroup;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Fraction of base sets prescribed during a deload week
    pub deload_factor: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { deload_factor: 0.5 }
    }
}

/// The day a user should train next
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedDay {
    /// Template day with `sets` already scaled for the week
    pub day: ProgramDay,
    /// 0-based position in the week template
    pub day_index: usize,
    /// 1-based position in the week template
    pub day_number: u32,
    pub total_days: u32,
    pub week: u32,
    pub is_deload: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramResolver {
    config: ResolverConfig,
}

impl ProgramResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Set count for one exercise in a given week
    pub fn effective_sets(&self, base_sets: u32, program: &TrainingProgram, week: u32, is_deload: bool) -> u32 {
        let scaled = if is_deload {
            base_sets as f64 * self.config.deload_factor
        } else {
            base_sets as f64 * program.starting_volume_multiplier
                + program.volume_progression_per_week as f64 * week.saturating_sub(1) as f64
        };
        (scaled.round() as u32).max(1)
    }

    /// Next day to train after `completed_workouts` days of the cycle.
    ///
    /// `weeks` carries the cycle's deload flags; a week missing from it is a
    /// normal week.
    pub fn resolve_next_day(
        &self,
        program: &TrainingProgram,
        completed_workouts: u32,
        weeks: &[WeekInfo],
    ) -> Result<ResolvedDay, ConfigurationError> {
        if program.week_template.is_empty() {
            return Err(ConfigurationError::EmptyWeekTemplate(program.id.clone()));
        }

        let total_days = program.week_template.len() as u32;
        let day_index = (completed_workouts % total_days) as usize;
        let week = week_for(completed_workouts, total_days, program.duration_weeks.max(1));
        let is_deload = is_deload_week(weeks, week);

        let mut day = program.week_template[day_index].clone();
        if day.is_workout() {
            for ex in &mut day.exercises {
                ex.sets = self.effective_sets(ex.sets, program, week, is_deload);
            }
        }

        Ok(ResolvedDay {
            day,
            day_index,
            day_number: day_index as u32 + 1,
            total_days,
            week,
            is_deload,
        })
    }

    /// Total prescribed sets per muscle across the workout days of one week
    pub fn weekly_volume_targets(
        &self,
        program: &TrainingProgram,
        week: u32,
        is_deload: bool,
    ) -> BTreeMap<MuscleGroup, u32> {
        let mut targets = BTreeMap::new();
        for day in program.week_template.iter().filter(|d| d.is_workout()) {
            for ex in &day.exercises {
                *targets.entry(ex.muscle_group).or_insert(0) +=
                    self.effective_sets(ex.sets, program, week, is_deload);
            }
        }
        targets
    }
}

fn is_deload_week(weeks: &[WeekInfo], week: u32) -> bool {
    weeks
        .iter()
        .find(|w| w.week_number == week)
        .is_some_and(|w| w.is_deload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::deload::{DeloadPolicy, EveryNthWeek, NoDeload};
    use crate::program::tests::{exercise, sample_program, workout_day};
    use crate::program::{DayType, Difficulty};

    fn single_exercise_program(sets: u32, multiplier: f64, progression: u32) -> TrainingProgram {
        TrainingProgram {
            id: "single".to_string(),
            name: "Single".to_string(),
            difficulty: Difficulty::Beginner,
            duration_weeks: 6,
            days_per_week: 1,
            muscle_priorities: BTreeMap::new(),
            weekly_frequency: BTreeMap::new(),
            starting_volume_multiplier: multiplier,
            volume_progression_per_week: progression,
            week_template: vec![workout_day(1, vec![exercise(MuscleGroup::Chest, "Bench Press", sets)])],
        }
    }

    #[test]
    fn test_day_index_is_completed_mod_days() {
        let program = sample_program();
        let resolver = ProgramResolver::default();
        let weeks = NoDeload.schedule(program.duration_weeks);
        for completed in 0..30 {
            let resolved = resolver.resolve_next_day(&program, completed, &weeks).unwrap();
            assert_eq!(resolved.day_index, (completed % 3) as usize);
            assert_eq!(resolved.day_number, resolved.day_index as u32 + 1);
            assert_eq!(resolved.total_days, 3);
        }
    }

    #[test]
    fn test_resolution_is_stable() {
        let program = sample_program();
        let resolver = ProgramResolver::default();
        let weeks = EveryNthWeek(2).schedule(4);
        let first = resolver.resolve_next_day(&program, 7, &weeks).unwrap();
        let second = resolver.resolve_next_day(&program, 7, &weeks).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scenario_three_days_five_completed() {
        let program = sample_program();
        let resolver = ProgramResolver::default();
        let resolved = resolver
            .resolve_next_day(&program, 5, &NoDeload.schedule(4))
            .unwrap();
        assert_eq!(resolved.day_index, 2);
        assert_eq!(resolved.week, 2);
        assert_eq!(resolved.day.day_type, DayType::Rest);
    }

    #[test]
    fn test_week_three_progression() {
        // 3 x 1.0 + 2 x (3 - 1) = 7
        let program = single_exercise_program(3, 1.0, 2);
        let resolver = ProgramResolver::default();
        let resolved = resolver
            .resolve_next_day(&program, 2, &NoDeload.schedule(6))
            .unwrap();
        assert_eq!(resolved.week, 3);
        assert!(!resolved.is_deload);
        assert_eq!(resolved.day.exercises[0].sets, 7);
    }

    #[test]
    fn test_deload_week_halves_base_sets() {
        let program = single_exercise_program(3, 1.0, 2);
        let resolver = ProgramResolver::default();
        let weeks = EveryNthWeek(3).schedule(6);
        let resolved = resolver.resolve_next_day(&program, 2, &weeks).unwrap();
        assert!(resolved.is_deload);

        let factor = resolver.config().deload_factor;
        let expected = ((3.0 * factor).round() as u32).max(1);
        assert_eq!(resolved.day.exercises[0].sets, expected);
        assert_eq!(expected, 2);
    }

    #[test]
    fn test_deload_ignores_progression() {
        let resolver = ProgramResolver::new(ResolverConfig { deload_factor: 0.5 });
        let program = single_exercise_program(4, 1.5, 3);
        assert_eq!(resolver.effective_sets(4, &program, 5, true), 2);
        assert_eq!(resolver.effective_sets(4, &program, 1, true), 2);
    }

    #[test]
    fn test_multiplier_applies_in_week_one() {
        let resolver = ProgramResolver::default();
        let program = single_exercise_program(4, 0.75, 1);
        assert_eq!(resolver.effective_sets(4, &program, 1, false), 3);
    }

    #[test]
    fn test_effective_sets_floored_at_one() {
        let resolver = ProgramResolver::new(ResolverConfig { deload_factor: 0.1 });
        let program = single_exercise_program(1, 0.2, 0);
        assert_eq!(resolver.effective_sets(1, &program, 1, false), 1);
        assert_eq!(resolver.effective_sets(1, &program, 1, true), 1);
    }

    #[test]
    fn test_week_clamped_after_last_week() {
        let program = single_exercise_program(3, 1.0, 1);
        let resolver = ProgramResolver::default();
        let resolved = resolver
            .resolve_next_day(&program, 40, &NoDeload.schedule(6))
            .unwrap();
        assert_eq!(resolved.week, 6);
        assert_eq!(resolved.day.exercises[0].sets, 8);
    }

    #[test]
    fn test_rest_day_passes_through() {
        let program = sample_program();
        let resolver = ProgramResolver::default();
        let resolved = resolver
            .resolve_next_day(&program, 2, &NoDeload.schedule(4))
            .unwrap();
        assert_eq!(resolved.day, program.week_template[2]);
    }

    #[test]
    fn test_empty_template_fails() {
        let mut program = sample_program();
        program.week_template.clear();
        let err = ProgramResolver::default()
            .resolve_next_day(&program, 0, &[])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyWeekTemplate(_)));
    }

    #[test]
    fn test_weekly_volume_targets() {
        let program = sample_program();
        let resolver = ProgramResolver::default();

        let week1 = resolver.weekly_volume_targets(&program, 1, false);
        assert_eq!(week1.get(&MuscleGroup::Chest), Some(&3));
        assert_eq!(week1.get(&MuscleGroup::Triceps), Some(&2));
        assert_eq!(week1.get(&MuscleGroup::Back), Some(&3));

        let week2 = resolver.weekly_volume_targets(&program, 2, false);
        assert_eq!(week2.get(&MuscleGroup::Chest), Some(&5));

        let deload = resolver.weekly_volume_targets(&program, 4, true);
        assert_eq!(deload.get(&MuscleGroup::Triceps), Some(&1));
    }
}
