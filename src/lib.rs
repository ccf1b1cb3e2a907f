//! mesocycle - Training block planner
//!
//! Resolves program templates into weekly prescriptions, tracks progress
//! through a mesocycle and accumulates per-muscle fatigue.

pub mod cycle;
pub mod db;
pub mod fatigue;
pub mod muscles;
pub mod program;
pub mod session;
pub mod workout;

pub use cycle::{CycleError, CyclePhase, MesoCycleState, MesoCycleTracker};
pub use db::{CycleStore, Database};
pub use fatigue::{FatigueAccumulator, FatigueConfig, InvalidFatigueConfig};
pub use muscles::MuscleGroup;
pub use program::{ConfigurationError, ProgramResolver, TrainingProgram};
pub use session::TrainingSession;
