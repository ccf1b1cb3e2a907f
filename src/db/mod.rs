//! Database module - SQLite storage for cycle snapshots and history

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};

use crate::cycle::MesoCycleState;
use crate::fatigue::FatigueAccumulator;
use crate::program::TrainingProgram;

const ACTIVE_CYCLE_KEY: &str = "active_cycle";
const FATIGUE_KEY: &str = "muscle_fatigue";

/// How an archived cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Stopped,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Stopped => "stopped",
        }
    }
}

impl std::str::FromStr for CycleOutcome {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "stopped" => Ok(Self::Stopped),
            _ => Err(format!("Unknown cycle outcome: {}", s)),
        }
    }
}

/// Cycle moved out of the active slot
#[derive(Debug, Clone)]
pub struct ArchivedCycle {
    pub state: MesoCycleState,
    pub outcome: CycleOutcome,
    pub archived_at: DateTime<Utc>,
}

/// Persistence collaborator for the tracker
pub trait CycleStore {
    fn load_cycle(&self) -> Result<Option<MesoCycleState>>;
    /// `None` clears the active slot
    fn save_cycle(&self, state: Option<&MesoCycleState>) -> Result<()>;
    /// Fatigue snapshot and the time it was last saved
    fn load_fatigue(&self) -> Result<Option<(FatigueAccumulator, DateTime<Utc>)>>;
    fn save_fatigue(&self, fatigue: &FatigueAccumulator, at: DateTime<Utc>) -> Result<()>;
    fn archive_cycle(&self, state: &MesoCycleState, outcome: CycleOutcome) -> Result<()>;
    /// Archived cycles, newest first
    fn history(&self) -> Result<Vec<ArchivedCycle>>;
    /// Keep a user-supplied template so later lookups by id succeed
    fn save_program(&self, program: &TrainingProgram) -> Result<()>;
    fn load_program(&self, id: &str) -> Result<Option<TrainingProgram>>;
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc))
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cycle_history (
                id TEXT PRIMARY KEY,
                program_id TEXT,
                name TEXT NOT NULL,
                outcome TEXT NOT NULL,
                completed_workouts INTEGER NOT NULL,
                total_workouts INTEGER NOT NULL,
                archived_at TEXT NOT NULL,
                state TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn put<T: Serialize>(&self, key: &str, value: &T, at: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json, at.to_rfc3339_opts(SecondsFormat::Micros, true)],
        )?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, DateTime<Utc>)>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT value, updated_at FROM snapshots WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((json, updated_at)) = row else {
            return Ok(None);
        };
        let value = serde_json::from_str(&json)
            .with_context(|| format!("corrupt snapshot '{}'", key))?;
        let updated_at = parse_timestamp(&updated_at)
            .with_context(|| format!("bad timestamp on snapshot '{}'", key))?;
        Ok(Some((value, updated_at)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM snapshots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl CycleStore for Database {
    fn load_cycle(&self) -> Result<Option<MesoCycleState>> {
        Ok(self.get(ACTIVE_CYCLE_KEY)?.map(|(state, _)| state))
    }

    fn save_cycle(&self, state: Option<&MesoCycleState>) -> Result<()> {
        match state {
            Some(state) => self.put(ACTIVE_CYCLE_KEY, state, Utc::now()),
            None => self.delete(ACTIVE_CYCLE_KEY),
        }
    }

    fn load_fatigue(&self) -> Result<Option<(FatigueAccumulator, DateTime<Utc>)>> {
        self.get(FATIGUE_KEY)
    }

    fn save_fatigue(&self, fatigue: &FatigueAccumulator, at: DateTime<Utc>) -> Result<()> {
        self.put(FATIGUE_KEY, fatigue, at)
    }

    fn archive_cycle(&self, state: &MesoCycleState, outcome: CycleOutcome) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cycle_history (id, program_id, name, outcome, completed_workouts, total_workouts, archived_at, state) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                state.id,
                state.program_id,
                state.name,
                outcome.as_str(),
                state.completed_workouts,
                state.total_workouts,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                serde_json::to_string(state)?,
            ],
        )?;
        Ok(())
    }

    fn save_program(&self, program: &TrainingProgram) -> Result<()> {
        self.put(&format!("program:{}", program.id), program, Utc::now())
    }

    fn load_program(&self, id: &str) -> Result<Option<TrainingProgram>> {
        Ok(self.get(&format!("program:{}", id))?.map(|(program, _)| program))
    }

    fn history(&self) -> Result<Vec<ArchivedCycle>> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, archived_at, state FROM cycle_history ORDER BY rowid DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(outcome, archived_at, state)| -> Result<ArchivedCycle> {
                Ok(ArchivedCycle {
                    state: serde_json::from_str(&state)?,
                    outcome: outcome.parse::<CycleOutcome>().map_err(anyhow::Error::msg)?,
                    archived_at: parse_timestamp(&archived_at)
                        .with_context(|| format!("bad archive timestamp '{}'", archived_at))?,
                })
            })
            .collect()
    }
}
