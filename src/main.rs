//! mesocycle - Training block planner

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use mesocycle::cycle::MesoCycleState;
use mesocycle::db::{CycleStore, Database};
use mesocycle::program::{DeloadPolicy, EveryNthWeek, FinalWeek, NoDeload, ResolvedDay, TrainingProgram};
use mesocycle::session::TrainingSession;
use mesocycle::workout::{LoggedWorkout, parse_sets_by_muscle};

#[derive(Parser)]
#[command(name = "mesocycle")]
#[command(author, version, about = "Mesocycle planner with volume progression and fatigue tracking")]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "MESOCYCLE_DB", default_value = "mesocycle.db", global = true)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct DeloadArgs {
    /// Schedule a deload every N weeks instead of in the final week
    #[arg(long, conflicts_with = "no_deload")]
    deload_every: Option<u32>,

    /// Do not schedule any deload weeks
    #[arg(long)]
    no_deload: bool,
}

impl DeloadArgs {
    fn policy(&self) -> Box<dyn DeloadPolicy> {
        match (self.no_deload, self.deload_every) {
            (true, _) => Box::new(NoDeload),
            (false, Some(n)) => Box::new(EveryNthWeek(n)),
            (false, None) => Box::new(FinalWeek),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in programs
    Programs,

    /// Start a program by id, or from a JSON template file
    Start {
        /// Built-in program id (e.g., "upper-lower")
        program: Option<String>,

        /// Path to a JSON program template
        #[arg(short, long, conflicts_with = "program")]
        file: Option<String>,

        #[command(flatten)]
        deload: DeloadArgs,
    },

    /// Start a custom cycle without a template
    StartCustom {
        name: String,

        #[arg(short, long, default_value = "4")]
        weeks: u32,

        #[arg(short, long, default_value = "4")]
        days: u32,

        #[command(flatten)]
        deload: DeloadArgs,
    },

    /// Record a completed workout
    Complete {
        /// Completed sets per muscle, e.g. "chest=10,triceps=6"
        #[arg(short, long, default_value = "")]
        sets: String,

        /// JSON file with the logged workout sets
        #[arg(short, long, conflicts_with = "sets")]
        file: Option<String>,
    },

    /// Mark a rest, cardio or recovery day as done
    Advance,

    /// Make the current week a deload week
    Deload,

    /// Apply days of recovery to muscle fatigue
    Rest {
        #[arg(default_value = "1")]
        days: f64,
    },

    /// Show the next training day
    Next,

    /// Show cycle status
    Status,

    /// Show muscle fatigue
    Fatigue {
        /// Include muscles below the display threshold
        #[arg(short, long)]
        all: bool,
    },

    /// Complete the active cycle
    Finish,

    /// Stop the active cycle
    Stop,

    /// List archived cycles
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let session = TrainingSession::new(Database::open(&cli.db)?);
    let now = Utc::now();

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Programs => {
            println!("Programs:");
            println!("{:-<60}", "");
            for p in session.programs() {
                println!(
                    "{:20} | {:28} | {:?} | {}w x {}d",
                    p.id, p.name, p.difficulty, p.duration_weeks, p.days_per_week
                );
            }
        }

        Commands::Start { program, file, deload } => {
            let program = match (program, file) {
                (_, Some(path)) => TrainingProgram::from_json(&std::fs::read_to_string(path)?)?,
                (Some(id), None) => match session.find_program(&id)? {
                    Some(p) => p,
                    None => bail!("Unknown program: {}", id),
                },
                (None, None) => bail!("Give a program id or --file"),
            };
            let state = session.start_program(&program, deload.policy().as_ref(), now)?;
            println!("Started: {} ({} days over {} weeks)", state.name, state.total_workouts, state.total_weeks);
            print_next(session.next_day()?);
        }

        Commands::StartCustom { name, weeks, days, deload } => {
            let state = session.start_custom(&name, weeks, days, deload.policy().as_ref(), now)?;
            println!("Started: {} ({} days over {} weeks)", state.name, state.total_workouts, state.total_weeks);
        }

        Commands::Complete { sets, file } => {
            let sets_by_muscle = match file {
                Some(path) => {
                    let workout: LoggedWorkout = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                    workout.sets_by_muscle()
                }
                None => parse_sets_by_muscle(&sets)?,
            };
            let state = session.complete_workout(&sets_by_muscle, now)?;
            print_progress(state.as_ref());
            print_next(session.next_day()?);
        }

        Commands::Advance => {
            let state = session.advance_day(now)?;
            print_progress(state.as_ref());
            print_next(session.next_day()?);
        }

        Commands::Deload => {
            let state = session.trigger_deload(now)?;
            if let Some(s) = state {
                println!("Week {} is now a deload week", s.current_week);
            } else {
                println!("No active cycle");
            }
        }

        Commands::Rest { days } => {
            let fatigue = session.rest(days, now)?;
            println!("Recovered {} days; {} muscles still fatigued", days, fatigue.visible().len());
        }

        Commands::Next => print_next(session.next_day()?),

        Commands::Status => {
            let overview = session.overview()?;
            println!("Phase: {}", overview.phase.label());
            print_progress(overview.state.as_ref());

            if !overview.volume_targets.is_empty() {
                println!("\nWeekly set targets:");
                for (group, sets) in &overview.volume_targets {
                    println!("  {:12} {}", group.name(), sets);
                }
            }

            let flagged = overview.fatigue.muscles_needing_deload();
            if !flagged.is_empty() {
                let names: Vec<_> = flagged.iter().map(|g| g.name()).collect();
                println!("\nDeload recommended: {}", names.join(", "));
            }
            print_next(overview.next_day);
        }

        Commands::Fatigue { all } => {
            let overview = session.overview()?;
            let entries = if all { overview.fatigue.ranked() } else { overview.fatigue.visible() };
            println!("Muscle fatigue");
            println!("{:-<40}", "");
            if entries.is_empty() {
                println!("All muscles fresh");
            }
            for e in entries {
                println!(
                    "{:12} {} {:6.1} {}",
                    e.group.name(),
                    e.level().bar(),
                    e.current_fatigue,
                    e.level()
                );
            }
        }

        Commands::Finish => match session.finish_cycle(now)? {
            Some(s) => println!("Completed: {} ({}/{} days)", s.name, s.completed_workouts, s.total_workouts),
            None => println!("No active cycle"),
        },

        Commands::Stop => match session.stop_program(now)? {
            Some(s) => println!("Stopped: {} after {} days", s.name, s.completed_workouts),
            None => println!("No active cycle"),
        },

        Commands::History { limit } => {
            println!("Past cycles:");
            println!("{:-<60}", "");
            for entry in session.store().history()?.iter().take(limit) {
                println!(
                    "{} | {:24} | {:9} | {}/{}",
                    entry.archived_at.format("%Y-%m-%d"),
                    entry.state.name,
                    entry.outcome.as_str(),
                    entry.state.completed_workouts,
                    entry.state.total_workouts
                );
            }
        }
    }

    Ok(())
}

fn print_progress(state: Option<&MesoCycleState>) {
    let Some(s) = state else {
        println!("No active cycle");
        return;
    };
    println!(
        "{} | week {}/{}{} | day {}/{} | {}/{} done ({:.0}%)",
        s.name,
        s.current_week,
        s.total_weeks,
        if s.is_deload_week() { " (deload)" } else { "" },
        s.day_in_week(),
        s.days_per_week,
        s.completed_workouts,
        s.total_workouts,
        s.progress() * 100.0
    );
    if s.is_finished() {
        println!("All scheduled days done - run `mesocycle finish` to complete the cycle");
    }
}

fn print_next(next: Option<ResolvedDay>) {
    let Some(next) = next else {
        return;
    };
    println!(
        "\nNext: week {}, day {}/{} - {}{}",
        next.week,
        next.day_number,
        next.total_days,
        next.day.day_type.label(),
        if next.is_deload { " (deload)" } else { "" }
    );
    for ex in &next.day.exercises {
        println!(
            "  {:28} {}x{}-{} @ {} RIR, rest {}s",
            ex.exercise_name, ex.sets, ex.reps_min, ex.reps_max, ex.rir_target, ex.rest_seconds
        );
    }
}
