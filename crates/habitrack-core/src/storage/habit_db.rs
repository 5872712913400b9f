//! SQLite-backed habit store.
//!
//! Habits live in `habits`, with the schedule and the completed-date cache
//! as JSON text columns. Per-day progress counters live in `habit_progress`,
//! one row per (habit, date).

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{check_weekdays, Habit, TimeWindow};
use crate::store::HabitStore;

const HABIT_COLUMNS: &str = "id, title, description, recurrence_days, target_count, project_id,
    start_date, completed_dates, streak, created_at, updated_at,
    revision, time_window_start, time_window_end, goal_id";

/// Raw column values of one `habits` row, decoded separately so that a bad
/// value surfaces as [`DatabaseError::Corrupt`].
struct HabitRow {
    id: String,
    title: String,
    description: Option<String>,
    recurrence_days: String,
    target_count: u32,
    project_id: Option<String>,
    start_date: String,
    completed_dates: String,
    streak: u32,
    created_at: String,
    updated_at: String,
    revision: u64,
    time_window_start: Option<String>,
    time_window_end: Option<String>,
    goal_id: Option<String>,
}

fn read_habit_row(row: &rusqlite::Row) -> Result<HabitRow, rusqlite::Error> {
    Ok(HabitRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        recurrence_days: row.get(3)?,
        target_count: row.get(4)?,
        project_id: row.get(5)?,
        start_date: row.get(6)?,
        completed_dates: row.get(7)?,
        streak: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        revision: row.get(11)?,
        time_window_start: row.get(12)?,
        time_window_end: row.get(13)?,
        goal_id: row.get(14)?,
    })
}

fn corrupt(column: &str, message: impl ToString) -> DatabaseError {
    DatabaseError::Corrupt {
        column: column.to_string(),
        message: message.to_string(),
    }
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| corrupt(column, e))
}

fn parse_datetime(column: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(column, e))
}

fn decode_habit(
    row: HabitRow,
    daily_progress: BTreeMap<NaiveDate, u32>,
) -> Result<Habit, DatabaseError> {
    let recurrence_days: BTreeSet<u8> =
        serde_json::from_str(&row.recurrence_days).map_err(|e| corrupt("recurrence_days", e))?;
    check_weekdays(&recurrence_days).map_err(|e| corrupt("recurrence_days", e))?;
    let completed_dates: BTreeSet<NaiveDate> =
        serde_json::from_str(&row.completed_dates).map_err(|e| corrupt("completed_dates", e))?;
    let time_window = match (row.time_window_start, row.time_window_end) {
        (Some(start), Some(end)) => Some(TimeWindow { start, end }),
        _ => None,
    };

    Ok(Habit::restore(
        row.id,
        row.title,
        row.description,
        recurrence_days,
        row.target_count,
        time_window,
        row.project_id,
        row.goal_id,
        parse_date("start_date", &row.start_date)?,
        daily_progress,
        completed_dates,
        row.streak,
        row.revision,
        parse_datetime("created_at", &row.created_at)?,
        parse_datetime("updated_at", &row.updated_at)?,
    ))
}

fn encode_json<T: serde::Serialize>(column: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| corrupt(column, e))
}

/// SQLite database holding habit records.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/habitrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("habitrack.db"))
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS habits (
                    id              TEXT PRIMARY KEY,
                    title           TEXT NOT NULL,
                    description     TEXT,
                    recurrence_days TEXT NOT NULL DEFAULT '[]',
                    target_count    INTEGER NOT NULL DEFAULT 1,
                    project_id      TEXT,
                    start_date      TEXT NOT NULL,
                    completed_dates TEXT NOT NULL DEFAULT '[]',
                    streak          INTEGER NOT NULL DEFAULT 0,
                    created_at      TEXT NOT NULL,
                    updated_at      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS habit_progress (
                    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                    date     TEXT NOT NULL,
                    count    INTEGER NOT NULL,
                    PRIMARY KEY (habit_id, date)
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn load_progress(&self, habit_id: &str) -> Result<BTreeMap<NaiveDate, u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, count FROM habit_progress WHERE habit_id = ?1")?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut progress = BTreeMap::new();
        for row in rows {
            let (date, count) = row?;
            progress.insert(parse_date("habit_progress.date", &date)?, count);
        }
        Ok(progress)
    }

    fn write_progress(conn: &Connection, habit: &Habit) -> Result<(), rusqlite::Error> {
        conn.execute(
            "DELETE FROM habit_progress WHERE habit_id = ?1",
            params![habit.id()],
        )?;
        let mut stmt = conn.prepare(
            "INSERT INTO habit_progress (habit_id, date, count) VALUES (?1, ?2, ?3)",
        )?;
        for (date, count) in habit.daily_progress() {
            stmt.execute(params![habit.id(), date.format("%Y-%m-%d").to_string(), count])?;
        }
        Ok(())
    }

    fn hydrate(&self, row: HabitRow) -> Result<Habit> {
        let progress = self.load_progress(&row.id)?;
        Ok(decode_habit(row, progress)?)
    }
}

impl HabitStore for HabitDb {
    fn create_habit(&self, habit: &Habit) -> Result<()> {
        let recurrence = encode_json("recurrence_days", habit.recurrence_days())?;
        let completed = encode_json("completed_dates", habit.completed_dates())?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO habits ({HABIT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                habit.id(),
                habit.title,
                habit.description,
                recurrence,
                habit.stored_target_count(),
                habit.project_id,
                habit.start_date.format("%Y-%m-%d").to_string(),
                completed,
                habit.streak(),
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
                habit.revision(),
                habit.time_window.as_ref().map(|w| w.start.clone()),
                habit.time_window.as_ref().map(|w| w.end.clone()),
                habit.goal_id,
            ],
        )?;
        Self::write_progress(&tx, habit)?;
        tx.commit()?;

        info!(habit_id = habit.id(), title = %habit.title, "created habit");
        Ok(())
    }

    fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                read_habit_row,
            )
            .optional()?;

        row.map(|row| self.hydrate(row)).transpose()
    }

    fn list_habits(&self) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits ORDER BY created_at, title"
        ))?;
        let rows = stmt
            .query_map([], read_habit_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    fn update_habit(&self, habit: &Habit) -> Result<Habit> {
        let recurrence = encode_json("recurrence_days", habit.recurrence_days())?;
        let completed = encode_json("completed_dates", habit.completed_dates())?;
        let expected = habit.revision();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE habits SET
                title = ?2, description = ?3, recurrence_days = ?4, target_count = ?5,
                project_id = ?6, start_date = ?7, completed_dates = ?8, streak = ?9,
                updated_at = ?10, time_window_start = ?11, time_window_end = ?12,
                goal_id = ?13, revision = revision + 1
             WHERE id = ?1 AND revision = ?14",
            params![
                habit.id(),
                habit.title,
                habit.description,
                recurrence,
                habit.stored_target_count(),
                habit.project_id,
                habit.start_date.format("%Y-%m-%d").to_string(),
                completed,
                habit.streak(),
                habit.updated_at.to_rfc3339(),
                habit.time_window.as_ref().map(|w| w.start.clone()),
                habit.time_window.as_ref().map(|w| w.end.clone()),
                habit.goal_id,
                expected,
            ],
        )?;

        if changed == 0 {
            let actual: Option<u64> = tx
                .query_row(
                    "SELECT revision FROM habits WHERE id = ?1",
                    params![habit.id()],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                None => Err(CoreError::NotFound(habit.id().to_string())),
                Some(actual) => {
                    warn!(
                        habit_id = habit.id(),
                        expected, actual, "rejected stale habit snapshot"
                    );
                    Err(DatabaseError::Conflict {
                        id: habit.id().to_string(),
                        expected,
                        actual,
                    }
                    .into())
                }
            };
        }

        Self::write_progress(&tx, habit)?;
        tx.commit()?;

        let mut stored = habit.clone();
        stored.set_revision(expected + 1);
        debug!(habit_id = habit.id(), revision = expected + 1, "updated habit");
        Ok(stored)
    }

    fn delete_habit(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM habit_progress WHERE habit_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        tx.commit()?;

        if removed > 0 {
            info!(habit_id = id, "deleted habit");
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{record_progress, TimeWindow};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_test_habit() -> Habit {
        let mut habit = Habit::new("Morning run", date(2024, 4, 1))
            .with_recurrence_days([1, 3, 5])
            .unwrap()
            .with_target_count(2);
        habit.description = Some("5k around the park".to_string());
        habit.time_window = Some(TimeWindow::new("06:30", "07:30").unwrap());
        habit.project_id = Some("project-1".to_string());
        habit.goal_id = Some("goal-1".to_string());
        habit
    }

    #[test]
    fn create_and_get_habit() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();

        let retrieved = db.get_habit(habit.id()).unwrap().unwrap();
        assert_eq!(retrieved, habit);
    }

    #[test]
    fn get_missing_habit_is_none() {
        let db = HabitDb::open_memory().unwrap();
        assert!(db.get_habit("nope").unwrap().is_none());
    }

    #[test]
    fn list_habits() {
        let db = HabitDb::open_memory().unwrap();
        db.create_habit(&make_test_habit()).unwrap();
        db.create_habit(&Habit::new("Read", date(2024, 4, 1))).unwrap();
        assert_eq!(db.list_habits().unwrap().len(), 2);
    }

    #[test]
    fn update_persists_progress_and_bumps_revision() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();

        let monday = date(2024, 4, 8);
        let progressed = record_progress(&record_progress(&habit, monday, monday), monday, monday);
        let stored = db.update_habit(&progressed).unwrap();
        assert_eq!(stored.revision(), 1);

        let retrieved = db.get_habit(habit.id()).unwrap().unwrap();
        assert_eq!(retrieved, stored);
        assert_eq!(retrieved.progress_on(monday), 2);
        assert!(retrieved.is_completed_on(monday));
        assert_eq!(retrieved.streak(), 1);
    }

    #[test]
    fn stale_snapshot_is_rejected() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();
        let today = date(2024, 4, 8);

        let first = record_progress(&habit, today, today);
        let second = record_progress(&habit, today, today);
        db.update_habit(&first).unwrap();

        let err = db.update_habit(&second).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::Conflict { expected: 0, actual: 1, .. })
        ));
        assert_eq!(db.get_habit(habit.id()).unwrap().unwrap().progress_on(today), 1);
    }

    #[test]
    fn update_of_missing_habit_is_not_found() {
        let db = HabitDb::open_memory().unwrap();
        let err = db.update_habit(&make_test_habit()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn delete_removes_habit_and_progress() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();
        let today = date(2024, 4, 8);
        db.update_habit(&record_progress(&habit, today, today)).unwrap();

        assert!(db.delete_habit(habit.id()).unwrap());
        assert!(!db.delete_habit(habit.id()).unwrap());
        assert!(db.get_habit(habit.id()).unwrap().is_none());

        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM habit_progress", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn corrupt_column_is_reported() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();
        db.conn()
            .execute(
                "UPDATE habits SET completed_dates = 'not json' WHERE id = ?1",
                params![habit.id()],
            )
            .unwrap();

        let err = db.get_habit(habit.id()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::Corrupt { ref column, .. }) if column == "completed_dates"
        ));
    }

    #[test]
    fn out_of_range_weekday_is_reported_as_corrupt() {
        let db = HabitDb::open_memory().unwrap();
        let habit = make_test_habit();
        db.create_habit(&habit).unwrap();
        db.conn()
            .execute(
                "UPDATE habits SET recurrence_days = '[1,9]' WHERE id = ?1",
                params![habit.id()],
            )
            .unwrap();

        let err = db.get_habit(habit.id()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::Corrupt { ref column, .. }) if column == "recurrence_days"
        ));
        assert!(db.list_habits().is_err());
    }

    #[test]
    fn open_at_persists_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("habitrack.db");
        let habit = make_test_habit();
        {
            let db = HabitDb::open_at(&path).unwrap();
            db.create_habit(&habit).unwrap();
        }
        let db = HabitDb::open_at(&path).unwrap();
        assert_eq!(db.get_habit(habit.id()).unwrap().unwrap(), habit);
        assert_eq!(
            migrations::get_schema_version(db.conn()),
            migrations::SCHEMA_VERSION
        );
    }

    #[test]
    fn v1_database_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("habitrack.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE habits (
                    id              TEXT PRIMARY KEY,
                    title           TEXT NOT NULL,
                    description     TEXT,
                    recurrence_days TEXT NOT NULL DEFAULT '[]',
                    target_count    INTEGER NOT NULL DEFAULT 1,
                    project_id      TEXT,
                    start_date      TEXT NOT NULL,
                    completed_dates TEXT NOT NULL DEFAULT '[]',
                    streak          INTEGER NOT NULL DEFAULT 0,
                    created_at      TEXT NOT NULL,
                    updated_at      TEXT NOT NULL
                );
                CREATE TABLE schema_version (version INTEGER PRIMARY KEY);
                INSERT INTO schema_version (version) VALUES (1);
                INSERT INTO habits (id, title, recurrence_days, target_count, start_date,
                                    completed_dates, streak, created_at, updated_at)
                VALUES ('legacy', 'Floss', '[0,6]', 0, '2024-01-01', '[\"2024-01-06\"]', 1,
                        '2024-01-01T00:00:00+00:00', '2024-01-06T00:00:00+00:00');",
            )
            .unwrap();
        }

        let db = HabitDb::open_at(&path).unwrap();
        let habit = db.get_habit("legacy").unwrap().unwrap();
        assert_eq!(habit.revision(), 0);
        assert!(habit.time_window.is_none());
        assert_eq!(habit.target_count(), 1);
        assert!(habit.is_completed_on(date(2024, 1, 6)));
        assert_eq!(habit.recurrence_days(), &BTreeSet::from([0, 6]));
    }
}
