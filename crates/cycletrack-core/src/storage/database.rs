//! SQLite-based observation, forecast and correction storage.
//!
//! Provides persistent storage for:
//! - Daily observations, one row per date
//! - Forecast windows, upserted by (start date, kind)
//! - Corrections, upserted by (date, kind)

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::accuracy::{Correction, CorrectionKind};
use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::forecast::{ForecastKind, ForecastWindow};
use crate::observation::{parse_date, BleedingLevel, Mucus, Observation, Sensation};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A forecast window as persisted, with the day it was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForecast {
    #[serde(flatten)]
    pub window: ForecastWindow,
    pub generated_on: NaiveDate,
}

/// Raw observation row before decoding.
struct ObservationRow {
    date: String,
    bleeding_level: String,
    sensation: String,
    mucus: String,
    had_intercourse: bool,
    note: Option<String>,
}

/// SQLite database for cycle data.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/cycletrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("cycletrack.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Observations ─────────────────────────────────────────────────

    /// Insert or replace the observation for its date.
    pub fn upsert_observation(&self, observation: &Observation) -> Result<(), DatabaseError> {
        upsert_observation_on(&self.conn, observation)
    }

    /// Upsert many observations in one transaction. Returns the number written.
    pub fn upsert_observations(&self, observations: &[Observation]) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for observation in observations {
            upsert_observation_on(&tx, observation)?;
        }
        tx.commit()?;
        tracing::debug!(count = observations.len(), "upserted observations");
        Ok(observations.len())
    }

    /// Upsert every observation in a JSON array file. Returns the number written.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not a JSON array of observations
    /// (unknown tags included), or the batch cannot be written. Nothing is
    /// written unless the whole file parses.
    pub fn import_observations(&self, path: &Path) -> Result<usize, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let observations: Vec<Observation> = serde_json::from_str(&content)?;
        let count = self.upsert_observations(&observations)?;
        tracing::info!(count, path = %path.display(), "imported observations");
        Ok(count)
    }

    /// Observation logged for `date`, if any.
    pub fn get_observation(&self, date: NaiveDate) -> Result<Option<Observation>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT date, bleeding_level, sensation, mucus, had_intercourse, note
                 FROM observations WHERE date = ?1",
                params![format_date(date)],
                read_observation_row,
            )
            .optional()?;
        row.map(decode_observation).transpose()
    }

    /// All observations, oldest first.
    pub fn observations(&self) -> Result<Vec<Observation>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, bleeding_level, sensation, mucus, had_intercourse, note
             FROM observations ORDER BY date",
        )?;
        let rows = stmt.query_map([], read_observation_row)?;
        let mut observations = Vec::new();
        for row in rows {
            observations.push(decode_observation(row?)?);
        }
        Ok(observations)
    }

    /// Observations dated within `[from, to]`, oldest first.
    pub fn observations_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Observation>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, bleeding_level, sensation, mucus, had_intercourse, note
             FROM observations WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![format_date(from), format_date(to)], read_observation_row)?;
        let mut observations = Vec::new();
        for row in rows {
            observations.push(decode_observation(row?)?);
        }
        Ok(observations)
    }

    /// Delete the observation for `date`. Returns whether a row existed.
    pub fn delete_observation(&self, date: NaiveDate) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM observations WHERE date = ?1",
            params![format_date(date)],
        )?;
        Ok(deleted > 0)
    }

    // ── Forecasts ────────────────────────────────────────────────────

    /// Upsert forecast windows keyed by (start, kind).
    pub fn save_forecasts(
        &self,
        windows: &[ForecastWindow],
        generated_on: NaiveDate,
    ) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for window in windows {
            tx.execute(
                "INSERT INTO forecasts (start_date, kind, end_date, confidence, generated_on)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(start_date, kind) DO UPDATE SET
                    end_date = excluded.end_date,
                    confidence = excluded.confidence,
                    generated_on = excluded.generated_on",
                params![
                    format_date(window.start),
                    window.kind.as_str(),
                    format_date(window.end),
                    window.confidence,
                    format_date(generated_on),
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = windows.len(), %generated_on, "saved forecasts");
        Ok(windows.len())
    }

    /// Drop forecasts starting on or after `from`. Returns rows removed.
    ///
    /// Used before saving a recomputed plan so stale future windows do not
    /// linger next to the new ones.
    pub fn clear_forecasts_from(&self, from: NaiveDate) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute(
            "DELETE FROM forecasts WHERE start_date >= ?1",
            params![format_date(from)],
        )?)
    }

    /// All stored forecasts ordered by start date, then kind.
    pub fn forecasts(&self) -> Result<Vec<StoredForecast>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT start_date, kind, end_date, confidence, generated_on
             FROM forecasts ORDER BY start_date, kind",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut forecasts = Vec::new();
        for row in rows {
            let (start, kind, end, confidence, generated_on) = row?;
            forecasts.push(StoredForecast {
                window: ForecastWindow {
                    start: decode_date("forecasts", &start)?,
                    end: decode_date("forecasts", &end)?,
                    kind: decode_tag("forecasts", &kind)?,
                    confidence,
                },
                generated_on: decode_date("forecasts", &generated_on)?,
            });
        }
        Ok(forecasts)
    }

    // ── Corrections ──────────────────────────────────────────────────

    /// Upsert corrections keyed by (key date, kind).
    pub fn save_corrections(&self, corrections: &[Correction]) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for correction in corrections {
            tx.execute(
                "INSERT INTO corrections (date, kind, original_predicted_date, actual_date, days)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(date, kind) DO UPDATE SET
                    original_predicted_date = excluded.original_predicted_date,
                    actual_date = excluded.actual_date,
                    days = excluded.days",
                params![
                    format_date(correction.key_date()),
                    correction.kind.as_str(),
                    format_date(correction.original_predicted_date),
                    format_date(correction.actual_date),
                    correction.days(),
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = corrections.len(), "saved corrections");
        Ok(corrections.len())
    }

    /// All stored corrections ordered by key date.
    pub fn corrections(&self) -> Result<Vec<Correction>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, original_predicted_date, actual_date
             FROM corrections ORDER BY date, kind",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut corrections = Vec::new();
        for row in rows {
            let (kind, original, actual) = row?;
            let kind = match kind.as_str() {
                "delay" => CorrectionKind::Delay,
                "anticipation" => CorrectionKind::Anticipation,
                other => {
                    return Err(DatabaseError::CorruptRow {
                        table: "corrections",
                        message: format!("unknown kind '{other}'"),
                    })
                }
            };
            corrections.push(Correction {
                original_predicted_date: decode_date("corrections", &original)?,
                actual_date: decode_date("corrections", &actual)?,
                kind,
            });
        }
        Ok(corrections)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn upsert_observation_on(conn: &Connection, observation: &Observation) -> Result<(), DatabaseError> {
    let sensation = encode_tags(observation.sensation.iter().map(|s| s.as_str()))?;
    let mucus = encode_tags(observation.mucus.iter().map(|m| m.as_str()))?;
    conn.execute(
        "INSERT INTO observations (date, bleeding_level, sensation, mucus, had_intercourse, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(date) DO UPDATE SET
            bleeding_level = excluded.bleeding_level,
            sensation = excluded.sensation,
            mucus = excluded.mucus,
            had_intercourse = excluded.had_intercourse,
            note = excluded.note",
        params![
            format_date(observation.date),
            observation.bleeding_level.as_str(),
            sensation,
            mucus,
            observation.had_intercourse,
            observation.note,
        ],
    )?;
    Ok(())
}

fn encode_tags<'a>(tags: impl Iterator<Item = &'a str>) -> Result<String, DatabaseError> {
    serde_json::to_string(&tags.collect::<Vec<_>>())
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
}

fn read_observation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObservationRow> {
    Ok(ObservationRow {
        date: row.get(0)?,
        bleeding_level: row.get(1)?,
        sensation: row.get(2)?,
        mucus: row.get(3)?,
        had_intercourse: row.get(4)?,
        note: row.get(5)?,
    })
}

fn decode_observation(row: ObservationRow) -> Result<Observation, DatabaseError> {
    let table = "observations";
    Ok(Observation {
        date: decode_date(table, &row.date)?,
        bleeding_level: decode_tag::<BleedingLevel>(table, &row.bleeding_level)?,
        sensation: decode_tag_set::<Sensation>(table, &row.sensation)?,
        mucus: decode_tag_set::<Mucus>(table, &row.mucus)?,
        had_intercourse: row.had_intercourse,
        note: row.note,
    })
}

fn decode_date(table: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    parse_date(raw).map_err(|e| DatabaseError::CorruptRow {
        table,
        message: e.to_string(),
    })
}

fn decode_tag<T>(table: &'static str, raw: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse::<T>().map_err(|e| DatabaseError::CorruptRow {
        table,
        message: e.to_string(),
    })
}

fn decode_tag_set<T>(table: &'static str, raw: &str) -> Result<BTreeSet<T>, DatabaseError>
where
    T: FromStr<Err = ValidationError> + Ord,
{
    let tags: Vec<String> = serde_json::from_str(raw).map_err(|e| DatabaseError::CorruptRow {
        table,
        message: e.to_string(),
    })?;
    tags.iter().map(|tag| decode_tag(table, tag)).collect()
}
