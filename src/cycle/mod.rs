//! Mesocycle state tracker
//!
//! One active cycle at a time. States: not started -> active <-> deload ->
//! completed, where deload is the active cycle sitting in a week flagged
//! `is_deload`. Events on a missing or finished cycle return a
//! [`CycleError`] and leave everything untouched; callers that want the
//! forgiving UI behaviour simply ignore it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fatigue::FatigueAccumulator;
use crate::program::{ConfigurationError, DeloadPolicy, TrainingProgram, checked_total_workouts};
use crate::workout::SetsByMuscle;

/// Week of the cycle after `completed` days: `1 + completed / days_per_week`,
/// clamped to `total_weeks`
pub fn week_for(completed: u32, days_per_week: u32, total_weeks: u32) -> u32 {
    if days_per_week == 0 {
        return 1;
    }
    (1 + completed / days_per_week).min(total_weeks.max(1))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekInfo {
    pub week_number: u32,
    pub is_deload: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Active,
    Completed,
}

/// Coarse state for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    NotStarted,
    Active,
    Deload,
    Completed,
}

impl CyclePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::NotStarted => "not started",
            CyclePhase::Active => "active",
            CyclePhase::Deload => "deload",
            CyclePhase::Completed => "completed",
        }
    }
}

/// Why an event did nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("no active mesocycle")]
    NoActiveCycle,
    #[error("mesocycle {0} is not active")]
    NotActive(String),
    #[error("all {total} scheduled days are already recorded")]
    AllWorkoutsRecorded { total: u32 },
    #[error("mesocycle {requested} is not the active cycle ({active})")]
    UnknownCycle { requested: String, active: String },
}

/// Progress through one mesocycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MesoCycleState {
    pub id: String,
    /// None for custom cycles
    pub program_id: Option<String>,
    pub name: String,
    pub current_week: u32,
    pub total_weeks: u32,
    pub days_per_week: u32,
    pub total_workouts: u32,
    pub completed_workouts: u32,
    pub status: CycleStatus,
    pub weeks: Vec<WeekInfo>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl MesoCycleState {
    fn new(
        program_id: Option<String>,
        name: String,
        total_weeks: u32,
        days_per_week: u32,
        total_workouts: u32,
        policy: &dyn DeloadPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            program_id,
            name,
            current_week: 1,
            total_weeks,
            days_per_week,
            total_workouts,
            completed_workouts: 0,
            status: CycleStatus::Active,
            weeks: policy.schedule(total_weeks),
            start_date: Utc::now(),
            end_date: None,
        }
    }

    pub fn is_deload_week(&self) -> bool {
        self.weeks
            .iter()
            .find(|w| w.week_number == self.current_week)
            .is_some_and(|w| w.is_deload)
    }

    pub fn phase(&self) -> CyclePhase {
        match self.status {
            CycleStatus::Completed => CyclePhase::Completed,
            CycleStatus::Active if self.is_deload_week() => CyclePhase::Deload,
            CycleStatus::Active => CyclePhase::Active,
        }
    }

    /// Every scheduled day is recorded; the caller decides when to complete
    pub fn is_finished(&self) -> bool {
        self.completed_workouts >= self.total_workouts
    }

    /// Share of scheduled days recorded (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_workouts == 0 {
            return 0.0;
        }
        (self.completed_workouts as f64 / self.total_workouts as f64).min(1.0)
    }

    /// 1-based day within the current week
    pub fn day_in_week(&self) -> u32 {
        if self.days_per_week == 0 {
            return 1;
        }
        self.completed_workouts % self.days_per_week + 1
    }

    fn record_day(&mut self) -> Result<(), CycleError> {
        if self.is_finished() {
            return Err(CycleError::AllWorkoutsRecorded {
                total: self.total_workouts,
            });
        }
        self.completed_workouts += 1;
        self.current_week = week_for(self.completed_workouts, self.days_per_week, self.total_weeks);
        Ok(())
    }
}

fn active_cycle(active: &mut Option<MesoCycleState>) -> Result<&mut MesoCycleState, CycleError> {
    let state = active.as_mut().ok_or(CycleError::NoActiveCycle)?;
    if state.status != CycleStatus::Active {
        return Err(CycleError::NotActive(state.id.clone()));
    }
    Ok(state)
}

/// Owns the active cycle and its muscle fatigue
#[derive(Debug, Clone, Default)]
pub struct MesoCycleTracker {
    active: Option<MesoCycleState>,
    fatigue: FatigueAccumulator,
}

impl MesoCycleTracker {
    pub fn new(fatigue: FatigueAccumulator) -> Self {
        Self {
            active: None,
            fatigue,
        }
    }

    /// Rebuild a tracker from persisted snapshots
    pub fn restore(active: Option<MesoCycleState>, fatigue: FatigueAccumulator) -> Self {
        Self { active, fatigue }
    }

    pub fn state(&self) -> Option<&MesoCycleState> {
        self.active.as_ref()
    }

    pub fn fatigue(&self) -> &FatigueAccumulator {
        &self.fatigue
    }

    pub fn fatigue_mut(&mut self) -> &mut FatigueAccumulator {
        &mut self.fatigue
    }

    pub fn phase(&self) -> CyclePhase {
        self.active
            .as_ref()
            .map_or(CyclePhase::NotStarted, MesoCycleState::phase)
    }

    /// Start a cycle from a program template, replacing any active cycle
    pub fn start(
        &mut self,
        program: &TrainingProgram,
        policy: &dyn DeloadPolicy,
    ) -> Result<&MesoCycleState, ConfigurationError> {
        program.validate()?;
        for (group, declared, actual) in program.frequency_mismatches() {
            warn!(program = %program.id, %group, declared, actual, "weekly frequency differs from template");
        }

        let state = MesoCycleState::new(
            Some(program.id.clone()),
            program.name.clone(),
            program.duration_weeks,
            program.days_per_week,
            program.total_workouts(),
            policy,
        );
        Ok(self.replace_active(state))
    }

    /// Start a cycle without a program template
    pub fn start_custom(
        &mut self,
        name: &str,
        total_weeks: u32,
        days_per_week: u32,
        policy: &dyn DeloadPolicy,
    ) -> Result<&MesoCycleState, ConfigurationError> {
        if total_weeks == 0 {
            return Err(ConfigurationError::ZeroDuration(name.to_string()));
        }
        if days_per_week == 0 {
            return Err(ConfigurationError::EmptyWeekTemplate(name.to_string()));
        }
        let total_workouts = checked_total_workouts(name, total_weeks, days_per_week)?;
        let state = MesoCycleState::new(
            None,
            name.to_string(),
            total_weeks,
            days_per_week,
            total_workouts,
            policy,
        );
        Ok(self.replace_active(state))
    }

    fn replace_active(&mut self, state: MesoCycleState) -> &MesoCycleState {
        if let Some(previous) = &self.active {
            warn!(previous = %previous.id, "replacing active mesocycle");
        }
        info!(
            id = %state.id,
            name = %state.name,
            weeks = state.total_weeks,
            days_per_week = state.days_per_week,
            "mesocycle started"
        );
        self.fatigue.reset();
        self.active.insert(state)
    }

    /// Count a finished workout and feed its sets into fatigue
    pub fn record_workout_completion(
        &mut self,
        sets_by_muscle: &SetsByMuscle,
    ) -> Result<&MesoCycleState, CycleError> {
        let state = active_cycle(&mut self.active)?;
        state.record_day()?;
        for (group, sets) in sets_by_muscle {
            self.fatigue.record_volume(*group, *sets);
        }
        debug!(
            completed = state.completed_workouts,
            total = state.total_workouts,
            week = state.current_week,
            muscles = sets_by_muscle.len(),
            "workout recorded"
        );
        Ok(&*state)
    }

    /// Count a rest, cardio or recovery day. Fatigue is untouched.
    pub fn advance_day(&mut self) -> Result<&MesoCycleState, CycleError> {
        let state = active_cycle(&mut self.active)?;
        state.record_day()?;
        debug!(
            completed = state.completed_workouts,
            week = state.current_week,
            "day advanced"
        );
        Ok(&*state)
    }

    /// Mark the current week as a deload. Repeating it changes nothing.
    pub fn trigger_deload(&mut self) -> Result<&MesoCycleState, CycleError> {
        let state = active_cycle(&mut self.active)?;
        let week = state.current_week;
        match state.weeks.iter().position(|w| w.week_number == week) {
            Some(idx) if !state.weeks[idx].is_deload => {
                state.weeks[idx].is_deload = true;
                info!(id = %state.id, week, "deload triggered");
            }
            Some(_) => {}
            None => {
                state.weeks.push(WeekInfo {
                    week_number: week,
                    is_deload: true,
                });
                info!(id = %state.id, week, "deload triggered");
            }
        }
        Ok(&*state)
    }

    /// Finish the active cycle and hand it back for archiving
    pub fn complete(&mut self, cycle_id: &str) -> Result<MesoCycleState, CycleError> {
        let state = active_cycle(&mut self.active)?;
        if state.id != cycle_id {
            return Err(CycleError::UnknownCycle {
                requested: cycle_id.to_string(),
                active: state.id.clone(),
            });
        }
        state.status = CycleStatus::Completed;
        state.end_date = Some(Utc::now());
        info!(
            id = %state.id,
            completed = state.completed_workouts,
            total = state.total_workouts,
            "mesocycle completed"
        );
        let archived = self.active.take().ok_or(CycleError::NoActiveCycle)?;
        self.fatigue.reset();
        Ok(archived)
    }

    /// Abandon the active cycle and hand it back for archiving
    pub fn stop(&mut self) -> Result<MesoCycleState, CycleError> {
        let mut state = self.active.take().ok_or(CycleError::NoActiveCycle)?;
        state.end_date = Some(Utc::now());
        info!(id = %state.id, completed = state.completed_workouts, "mesocycle stopped");
        self.fatigue.reset();
        Ok(state)
    }
}
