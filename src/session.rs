//! Training session - applies user events to the tracker and persists the result
//!
//! Every event loads the snapshots, runs the tracker operation and saves the
//! new snapshots. Events the tracker refuses (no cycle, finished cycle) are
//! logged and otherwise ignored so repeated taps are harmless.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cycle::{CycleError, CyclePhase, MesoCycleState, MesoCycleTracker};
use crate::db::{CycleOutcome, CycleStore};
use crate::fatigue::{FatigueAccumulator, FatigueConfig};
use crate::muscles::MuscleGroup;
use crate::program::{
    BuiltinCatalog, DeloadPolicy, ProgramCatalog, ProgramResolver, ResolvedDay, TrainingProgram,
};
use crate::workout::SetsByMuscle;

/// Everything the UI shows for the current cycle
#[derive(Debug, Clone)]
pub struct Overview {
    pub phase: CyclePhase,
    pub state: Option<MesoCycleState>,
    pub fatigue: FatigueAccumulator,
    pub next_day: Option<ResolvedDay>,
    /// Prescribed sets per muscle for the current week
    pub volume_targets: BTreeMap<MuscleGroup, u32>,
}

pub struct TrainingSession<S: CycleStore, C: ProgramCatalog = BuiltinCatalog> {
    store: S,
    catalog: C,
    resolver: ProgramResolver,
    fatigue_config: FatigueConfig,
}

impl<S: CycleStore> TrainingSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_catalog(store, BuiltinCatalog)
    }
}

impl<S: CycleStore, C: ProgramCatalog> TrainingSession<S, C> {
    pub fn with_catalog(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            resolver: ProgramResolver::default(),
            fatigue_config: FatigueConfig::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: ProgramResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Used only when no fatigue snapshot exists yet
    pub fn with_fatigue_config(mut self, config: FatigueConfig) -> Self {
        self.fatigue_config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self) -> Result<(MesoCycleTracker, Option<DateTime<Utc>>)> {
        let state = self.store.load_cycle()?;
        let (fatigue, saved_at) = match self.store.load_fatigue()? {
            Some((fatigue, at)) => {
                fatigue.config().validate()?;
                (fatigue, Some(at))
            }
            None => (FatigueAccumulator::new(self.fatigue_config), None),
        };
        Ok((MesoCycleTracker::restore(state, fatigue), saved_at))
    }

    /// Load the snapshots and recover fatigue for the time since it was last
    /// saved. Returns the time the new snapshot should be stamped with.
    fn load_decayed(&self, now: DateTime<Utc>) -> Result<(MesoCycleTracker, DateTime<Utc>)> {
        let (mut tracker, saved_at) = self.load()?;
        let Some(saved_at) = saved_at else {
            return Ok((tracker, now));
        };
        tracker.fatigue_mut().decay(elapsed_days(saved_at, now));
        Ok((tracker, now.max(saved_at)))
    }

    fn save(&self, tracker: &MesoCycleTracker, at: DateTime<Utc>) -> Result<()> {
        self.store.save_cycle(tracker.state())?;
        self.store.save_fatigue(tracker.fatigue(), at)
    }

    /// Template by id: built-ins first, then user-supplied ones
    pub fn find_program(&self, id: &str) -> Result<Option<TrainingProgram>> {
        match self.catalog.find(id) {
            Some(program) => Ok(Some(program)),
            None => self.store.load_program(id),
        }
    }

    pub fn programs(&self) -> Vec<TrainingProgram> {
        self.catalog.programs()
    }

    /// Start a program. A cycle already running is archived as stopped.
    pub fn start_program(
        &self,
        program: &TrainingProgram,
        policy: &dyn DeloadPolicy,
        now: DateTime<Utc>,
    ) -> Result<MesoCycleState> {
        let (mut tracker, _) = self.load()?;
        let previous = tracker.state().cloned();

        let state = tracker.start(program, policy)?.clone();
        if self.catalog.find(&program.id).is_none() {
            self.store.save_program(program)?;
        }
        if let Some(previous) = previous {
            self.store.archive_cycle(&previous, CycleOutcome::Stopped)?;
        }
        self.save(&tracker, now)?;
        Ok(state)
    }

    /// Start a cycle without a template
    pub fn start_custom(
        &self,
        name: &str,
        weeks: u32,
        days_per_week: u32,
        policy: &dyn DeloadPolicy,
        now: DateTime<Utc>,
    ) -> Result<MesoCycleState> {
        let (mut tracker, _) = self.load()?;
        let previous = tracker.state().cloned();

        let state = tracker
            .start_custom(name, weeks, days_per_week, policy)?
            .clone();
        if let Some(previous) = previous {
            self.store.archive_cycle(&previous, CycleOutcome::Stopped)?;
        }
        self.save(&tracker, now)?;
        Ok(state)
    }

    /// Record a finished workout. Fatigue first recovers for the time since
    /// it was last saved.
    pub fn complete_workout(
        &self,
        sets_by_muscle: &SetsByMuscle,
        now: DateTime<Utc>,
    ) -> Result<Option<MesoCycleState>> {
        let (mut tracker, at) = self.load_decayed(now)?;
        let result = tracker.record_workout_completion(sets_by_muscle).map(|_| ());
        self.finish_event(tracker, result, "complete workout", at)
    }

    /// Mark a rest, cardio or recovery day as done
    pub fn advance_day(&self, now: DateTime<Utc>) -> Result<Option<MesoCycleState>> {
        let (mut tracker, at) = self.load_decayed(now)?;
        let result = tracker.advance_day().map(|_| ());
        self.finish_event(tracker, result, "advance day", at)
    }

    pub fn trigger_deload(&self, now: DateTime<Utc>) -> Result<Option<MesoCycleState>> {
        let (mut tracker, at) = self.load_decayed(now)?;
        let result = tracker.trigger_deload().map(|_| ());
        self.finish_event(tracker, result, "trigger deload", at)
    }

    fn finish_event(
        &self,
        tracker: MesoCycleTracker,
        result: Result<(), CycleError>,
        event: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MesoCycleState>> {
        match result {
            Ok(()) => {
                self.save(&tracker, now)?;
                if let Some(state) = tracker.state().filter(|s| s.is_finished()) {
                    info!(id = %state.id, "all scheduled days recorded, cycle can be completed");
                }
            }
            Err(err) => warn!(event, %err, "event ignored"),
        }
        Ok(tracker.state().cloned())
    }

    /// Apply `days` of recovery to every muscle, on top of the time that
    /// passed since the last save
    pub fn rest(&self, days: f64, now: DateTime<Utc>) -> Result<FatigueAccumulator> {
        let (mut tracker, at) = self.load_decayed(now)?;
        tracker.fatigue_mut().decay(days);
        self.store.save_fatigue(tracker.fatigue(), at)?;
        Ok(tracker.fatigue().clone())
    }

    /// Complete the active cycle and move it to history
    pub fn finish_cycle(&self, now: DateTime<Utc>) -> Result<Option<MesoCycleState>> {
        let (mut tracker, _) = self.load()?;
        let id = match tracker.state() {
            Some(state) => state.id.clone(),
            None => {
                warn!(event = "finish cycle", err = %CycleError::NoActiveCycle, "event ignored");
                return Ok(None);
            }
        };
        match tracker.complete(&id) {
            Ok(archived) => {
                self.store.archive_cycle(&archived, CycleOutcome::Completed)?;
                self.save(&tracker, now)?;
                Ok(Some(archived))
            }
            Err(err) => {
                warn!(event = "finish cycle", %err, "event ignored");
                Ok(None)
            }
        }
    }

    /// Abandon the active cycle and move it to history
    pub fn stop_program(&self, now: DateTime<Utc>) -> Result<Option<MesoCycleState>> {
        let (mut tracker, _) = self.load()?;
        match tracker.stop() {
            Ok(stopped) => {
                self.store.archive_cycle(&stopped, CycleOutcome::Stopped)?;
                self.save(&tracker, now)?;
                Ok(Some(stopped))
            }
            Err(err) => {
                warn!(event = "stop program", %err, "event ignored");
                Ok(None)
            }
        }
    }

    /// What to train next, if the active cycle follows a template
    pub fn next_day(&self) -> Result<Option<ResolvedDay>> {
        let (tracker, _) = self.load()?;
        let Some(state) = tracker.state().filter(|s| !s.is_finished()) else {
            return Ok(None);
        };
        let Some(program_id) = state.program_id.as_deref() else {
            return Ok(None);
        };
        let program = self
            .find_program(program_id)?
            .ok_or_else(|| anyhow!("program '{}' not found", program_id))?;
        Ok(Some(self.resolver.resolve_next_day(
            &program,
            state.completed_workouts,
            &state.weeks,
        )?))
    }

    pub fn overview(&self) -> Result<Overview> {
        let (tracker, _) = self.load()?;
        let next_day = self.next_day()?;

        let mut volume_targets = BTreeMap::new();
        if let Some(state) = tracker.state()
            && let Some(program_id) = state.program_id.as_deref()
            && let Some(program) = self.find_program(program_id)?
        {
            volume_targets = self.resolver.weekly_volume_targets(
                &program,
                state.current_week,
                state.is_deload_week(),
            );
        }

        Ok(Overview {
            phase: tracker.phase(),
            state: tracker.state().cloned(),
            fatigue: tracker.fatigue().clone(),
            next_day,
            volume_targets,
        })
    }
}

fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let secs = (to - from).num_seconds();
    if secs <= 0 {
        return 0.0;
    }
    secs as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::Database;
    use crate::program::tests::sample_program;
    use crate::program::{FinalWeek, NoDeload};

    fn session() -> TrainingSession<Database> {
        TrainingSession::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_events_without_cycle_are_ignored() {
        let session = session();
        let now = Utc::now();
        let sets = SetsByMuscle::from([(MuscleGroup::Chest, 5)]);
        assert!(session.complete_workout(&sets, now).unwrap().is_none());
        assert!(session.advance_day(now).unwrap().is_none());
        assert!(session.trigger_deload(now).unwrap().is_none());
        assert!(session.stop_program(now).unwrap().is_none());
        assert!(session.finish_cycle(now).unwrap().is_none());
        assert!(session.next_day().unwrap().is_none());
        assert!(session.store().load_cycle().unwrap().is_none());
    }

    #[test]
    fn test_builtin_program_flow() {
        let session = session();
        let now = Utc::now();
        let program = session.find_program("upper-lower").unwrap().unwrap();
        let state = session.start_program(&program, &FinalWeek, now).unwrap();
        assert_eq!(state.total_workouts, 25);

        let next = session.next_day().unwrap().unwrap();
        assert_eq!(next.day_number, 1);
        assert_eq!(next.week, 1);

        let sets = SetsByMuscle::from([(MuscleGroup::Chest, 3), (MuscleGroup::Back, 3)]);
        let state = session.complete_workout(&sets, now).unwrap().unwrap();
        assert_eq!(state.completed_workouts, 1);
        assert_eq!(session.next_day().unwrap().unwrap().day_number, 2);

        let overview = session.overview().unwrap();
        assert_eq!(overview.phase, CyclePhase::Active);
        assert_eq!(overview.fatigue.fatigue(MuscleGroup::Chest), 15.0);
        assert_eq!(overview.volume_targets.get(&MuscleGroup::Chest), Some(&6));
    }

    #[test]
    fn test_custom_program_is_remembered() {
        let session = session();
        let now = Utc::now();
        session.start_program(&sample_program(), &NoDeload, now).unwrap();
        for _ in 0..5 {
            session.advance_day(now).unwrap();
        }
        let next = session.next_day().unwrap().unwrap();
        assert_eq!(next.day_index, 2);
        assert_eq!(next.week, 2);
    }

    #[test]
    fn test_fatigue_recovers_between_workouts() {
        let session = session();
        let start = Utc::now();
        session.start_custom("Block", 4, 3, &NoDeload, start).unwrap();

        let heavy = SetsByMuscle::from([(MuscleGroup::Quads, 12)]);
        session.complete_workout(&heavy, start).unwrap();
        assert_eq!(session.overview().unwrap().fatigue.fatigue(MuscleGroup::Quads), 60.0);

        // Two days later: 60 - 2 * 25 = 10, then 12 more sets
        session
            .complete_workout(&heavy, start + Duration::days(2))
            .unwrap();
        assert_eq!(session.overview().unwrap().fatigue.fatigue(MuscleGroup::Quads), 70.0);
    }

    #[test]
    fn test_rest_decays_fatigue() {
        let session = session();
        let now = Utc::now();
        session.start_custom("Block", 4, 3, &NoDeload, now).unwrap();
        session
            .complete_workout(&SetsByMuscle::from([(MuscleGroup::Back, 10)]), now)
            .unwrap();
        let fatigue = session.rest(1.0, now).unwrap();
        assert_eq!(fatigue.fatigue(MuscleGroup::Back), 25.0);
    }

    #[test]
    fn test_fatigue_recovers_across_non_workout_events() {
        let session = session();
        let start = Utc::now();
        session.start_custom("Block", 4, 3, &NoDeload, start).unwrap();
        session
            .complete_workout(&SetsByMuscle::from([(MuscleGroup::Quads, 12)]), start)
            .unwrap();

        session.advance_day(start + Duration::days(1)).unwrap();
        session.trigger_deload(start + Duration::hours(36)).unwrap();
        session
            .complete_workout(&SetsByMuscle::new(), start + Duration::days(2))
            .unwrap();
        // 60 - 2 * 25
        assert_eq!(session.overview().unwrap().fatigue.fatigue(MuscleGroup::Quads), 10.0);
    }

    #[test]
    fn test_rest_adds_to_elapsed_recovery() {
        let session = session();
        let start = Utc::now();
        session.start_custom("Block", 4, 3, &NoDeload, start).unwrap();
        session
            .complete_workout(&SetsByMuscle::from([(MuscleGroup::Back, 12)]), start)
            .unwrap();

        // One elapsed day plus half a day of explicit rest
        let fatigue = session.rest(0.5, start + Duration::days(1)).unwrap();
        assert_eq!(fatigue.fatigue(MuscleGroup::Back), 22.5);

        session
            .complete_workout(&SetsByMuscle::new(), start + Duration::hours(36))
            .unwrap();
        assert_eq!(session.overview().unwrap().fatigue.fatigue(MuscleGroup::Back), 10.0);
    }

    #[test]
    fn test_invalid_fatigue_snapshot_is_rejected() {
        let session = session();
        let now = Utc::now();
        session.start_custom("Block", 4, 3, &NoDeload, now).unwrap();
        let broken = FatigueAccumulator::new(FatigueConfig {
            fatigue_per_set: -5.0,
            ..FatigueConfig::default()
        });
        session.store().save_fatigue(&broken, now).unwrap();

        let sets = SetsByMuscle::from([(MuscleGroup::Chest, 4)]);
        assert!(session.complete_workout(&sets, now).is_err());
        assert_eq!(session.store().load_cycle().unwrap().unwrap().completed_workouts, 0);
    }

    #[test]
    fn test_oversized_custom_cycle_is_refused() {
        let session = session();
        assert!(
            session
                .start_custom("Huge", 70_000, 70_000, &NoDeload, Utc::now())
                .is_err()
        );
        assert!(session.store().load_cycle().unwrap().is_none());
    }

    #[test]
    fn test_no_next_day_once_every_day_is_recorded() {
        let session = session();
        let now = Utc::now();
        let state = session.start_program(&sample_program(), &NoDeload, now).unwrap();
        for _ in 0..state.total_workouts {
            session.advance_day(now).unwrap();
        }
        assert!(session.store().load_cycle().unwrap().unwrap().is_finished());
        assert!(session.next_day().unwrap().is_none());
        assert!(session.overview().unwrap().next_day.is_none());
    }

    #[test]
    fn test_finish_archives_and_blocks_further_workouts() {
        let session = session();
        let now = Utc::now();
        session.start_custom("Short", 1, 2, &NoDeload, now).unwrap();
        let sets = SetsByMuscle::from([(MuscleGroup::Chest, 4)]);
        session.complete_workout(&sets, now).unwrap();
        let state = session.complete_workout(&sets, now).unwrap().unwrap();
        assert!(state.is_finished());

        let archived = session.finish_cycle(now).unwrap().unwrap();
        assert_eq!(archived.completed_workouts, 2);

        assert!(session.complete_workout(&sets, now).unwrap().is_none());
        let history = session.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, CycleOutcome::Completed);
        assert!(session.overview().unwrap().fatigue.is_empty());
    }

    #[test]
    fn test_restart_archives_previous_as_stopped() {
        let session = session();
        let now = Utc::now();
        let first = session.start_custom("First", 2, 2, &NoDeload, now).unwrap();
        session.start_custom("Second", 2, 2, &NoDeload, now).unwrap();

        let history = session.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state.id, first.id);
        assert_eq!(history[0].outcome, CycleOutcome::Stopped);
    }

    #[test]
    fn test_deload_changes_next_day_volume() {
        let session = session();
        let now = Utc::now();
        session.start_program(&sample_program(), &NoDeload, now).unwrap();
        let normal = session.next_day().unwrap().unwrap();
        assert_eq!(normal.day.exercises[0].sets, 3);

        session.trigger_deload(now).unwrap();
        let deload = session.next_day().unwrap().unwrap();
        assert!(deload.is_deload);
        assert_eq!(deload.day.exercises[0].sets, 2);
        assert_eq!(session.overview().unwrap().phase, CyclePhase::Deload);
    }

    #[test]
    fn test_bad_program_is_not_started() {
        let session = session();
        let mut program = sample_program();
        program.week_template.clear();
        assert!(session.start_program(&program, &NoDeload, Utc::now()).is_err());
        assert!(session.store().load_cycle().unwrap().is_none());
    }

    #[test]
    fn test_elapsed_days() {
        let now = Utc::now();
        assert_eq!(elapsed_days(now, now - Duration::hours(5)), 0.0);
        assert_eq!(elapsed_days(now, now + Duration::hours(36)), 1.5);
    }
}
