//! Built-in program templates

use std::collections::BTreeMap;

use super::{
    DayType, Difficulty, ExerciseCategory, ExercisePrescription, MusclePriority, ProgramDay,
    TrainingProgram,
};
use crate::muscles::MuscleGroup;

/// Program template lookup by id
pub trait ProgramCatalog {
    fn programs(&self) -> Vec<TrainingProgram>;

    fn find(&self, id: &str) -> Option<TrainingProgram> {
        self.programs().into_iter().find(|p| p.id == id)
    }
}

/// Programs shipped with the app
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl ProgramCatalog for BuiltinCatalog {
    fn programs(&self) -> Vec<TrainingProgram> {
        vec![full_body_beginner(), upper_lower(), push_pull_legs()]
    }
}

fn lift(
    group: MuscleGroup,
    name: &str,
    category: ExerciseCategory,
    sets: u32,
    reps: (u32, u32),
    rir: u32,
) -> ExercisePrescription {
    let rest_seconds = match category {
        ExerciseCategory::Compound => 150,
        ExerciseCategory::Isolation => 90,
    };
    ExercisePrescription {
        muscle_group: group,
        exercise_name: name.to_string(),
        category,
        sets,
        reps_min: reps.0,
        reps_max: reps.1,
        rir_target: rir,
        rest_seconds,
    }
}

fn day(day_number: u32, day_type: DayType, exercises: Vec<ExercisePrescription>) -> ProgramDay {
    ProgramDay {
        day_number,
        day_type,
        exercises,
        cardio_activities: None,
        recovery_suggestions: None,
    }
}

fn full_body_beginner() -> TrainingProgram {
    use ExerciseCategory::*;
    use MuscleGroup::*;

    let full_body = |n| {
        day(
            n,
            DayType::Workout,
            vec![
                lift(Quads, "Goblet Squat", Compound, 3, (8, 12), 3),
                lift(Chest, "Dumbbell Bench Press", Compound, 3, (8, 12), 3),
                lift(Back, "Lat Pulldown", Compound, 3, (10, 12), 3),
                lift(Hamstrings, "Romanian Deadlift", Compound, 2, (10, 12), 3),
                lift(Core, "Plank Hold", Isolation, 2, (1, 1), 2),
            ],
        )
    };
    let mut recovery = day(2, DayType::ActiveRecovery, vec![]);
    recovery.recovery_suggestions = Some(serde_json::json!(["20 min walk", "hip mobility"]));

    TrainingProgram {
        id: "full-body-beginner".to_string(),
        name: "Full Body Foundations".to_string(),
        difficulty: Difficulty::Beginner,
        duration_weeks: 4,
        days_per_week: 4,
        muscle_priorities: BTreeMap::from([
            (Quads, MusclePriority::Normal),
            (Chest, MusclePriority::Normal),
            (Back, MusclePriority::Normal),
            (Core, MusclePriority::Maintain),
        ]),
        weekly_frequency: BTreeMap::from([
            (Quads, 2),
            (Chest, 2),
            (Back, 2),
            (Hamstrings, 2),
            (Core, 2),
        ]),
        starting_volume_multiplier: 1.0,
        volume_progression_per_week: 0,
        week_template: vec![full_body(1), recovery, full_body(3), day(4, DayType::Rest, vec![])],
    }
}

fn upper_lower() -> TrainingProgram {
    use ExerciseCategory::*;
    use MuscleGroup::*;

    let upper = |n| {
        day(
            n,
            DayType::Workout,
            vec![
                lift(Chest, "Barbell Bench Press", Compound, 3, (6, 10), 2),
                lift(Back, "Barbell Row", Compound, 3, (6, 10), 2),
                lift(Shoulders, "Overhead Press", Compound, 2, (8, 12), 2),
                lift(Biceps, "Incline Curl", Isolation, 2, (10, 15), 1),
                lift(Triceps, "Cable Pushdown", Isolation, 2, (10, 15), 1),
            ],
        )
    };
    let lower = |n| {
        day(
            n,
            DayType::Workout,
            vec![
                lift(Quads, "Back Squat", Compound, 3, (6, 10), 2),
                lift(Hamstrings, "Romanian Deadlift", Compound, 3, (8, 10), 2),
                lift(Glutes, "Hip Thrust", Compound, 2, (8, 12), 2),
                lift(Calves, "Standing Calf Raise", Isolation, 3, (10, 15), 1),
            ],
        )
    };
    let mut cardio = day(5, DayType::Cardio, vec![]);
    cardio.cardio_activities = Some(serde_json::json!([{ "activity": "zone 2 bike", "minutes": 30 }]));

    TrainingProgram {
        id: "upper-lower".to_string(),
        name: "Upper / Lower Hypertrophy".to_string(),
        difficulty: Difficulty::Intermediate,
        duration_weeks: 5,
        days_per_week: 5,
        muscle_priorities: BTreeMap::from([
            (Chest, MusclePriority::Focus),
            (Back, MusclePriority::Focus),
            (Calves, MusclePriority::Maintain),
        ]),
        weekly_frequency: BTreeMap::from([
            (Chest, 2),
            (Back, 2),
            (Quads, 2),
            (Hamstrings, 2),
        ]),
        starting_volume_multiplier: 1.0,
        volume_progression_per_week: 1,
        week_template: vec![upper(1), lower(2), upper(3), lower(4), cardio],
    }
}

fn push_pull_legs() -> TrainingProgram {
    use ExerciseCategory::*;
    use MuscleGroup::*;

    let push = day(
        1,
        DayType::Workout,
        vec![
            lift(Chest, "Incline Dumbbell Press", Compound, 4, (6, 10), 2),
            lift(Chest, "Cable Fly", Isolation, 3, (12, 15), 1),
            lift(Shoulders, "Lateral Raise", Isolation, 4, (12, 20), 1),
            lift(Triceps, "Overhead Extension", Isolation, 3, (10, 15), 1),
        ],
    );
    let pull = day(
        2,
        DayType::Workout,
        vec![
            lift(Back, "Weighted Pull-Up", Compound, 4, (6, 10), 2),
            lift(Back, "Chest-Supported Row", Compound, 3, (8, 12), 2),
            lift(Traps, "Dumbbell Shrug", Isolation, 2, (10, 15), 1),
            lift(Biceps, "Preacher Curl", Isolation, 3, (10, 15), 1),
            lift(Forearms, "Wrist Curl", Isolation, 2, (15, 20), 1),
        ],
    );
    let legs = day(
        3,
        DayType::Workout,
        vec![
            lift(Quads, "Hack Squat", Compound, 4, (6, 10), 2),
            lift(Hamstrings, "Lying Leg Curl", Isolation, 3, (10, 15), 1),
            lift(Glutes, "Bulgarian Split Squat", Compound, 3, (8, 12), 2),
            lift(Calves, "Seated Calf Raise", Isolation, 3, (12, 20), 1),
            lift(Core, "Cable Crunch", Isolation, 3, (12, 15), 1),
        ],
    );

    TrainingProgram {
        id: "push-pull-legs".to_string(),
        name: "Push Pull Legs".to_string(),
        difficulty: Difficulty::Advanced,
        duration_weeks: 6,
        days_per_week: 4,
        muscle_priorities: BTreeMap::from([
            (Shoulders, MusclePriority::Focus),
            (Back, MusclePriority::Focus),
            (Forearms, MusclePriority::Maintain),
            (Traps, MusclePriority::Maintain),
        ]),
        weekly_frequency: BTreeMap::from([(Chest, 1), (Back, 1), (Quads, 1)]),
        starting_volume_multiplier: 0.75,
        volume_progression_per_week: 1,
        week_template: vec![push, pull, legs, day(4, DayType::Rest, vec![])],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_programs_are_valid() {
        for program in BuiltinCatalog.programs() {
            assert!(program.validate().is_ok(), "{} failed validation", program.id);
        }
    }

    #[test]
    fn test_builtin_programs_match_declared_frequency() {
        for program in BuiltinCatalog.programs() {
            assert!(
                program.frequency_mismatches().is_empty(),
                "{}: {:?}",
                program.id,
                program.frequency_mismatches()
            );
        }
    }

    #[test]
    fn test_find_by_id() {
        let program = BuiltinCatalog.find("upper-lower").unwrap();
        assert_eq!(program.days_per_week, 5);
        assert!(BuiltinCatalog.find("does-not-exist").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let programs = BuiltinCatalog.programs();
        let mut ids: Vec<_> = programs.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), programs.len());
    }
}
