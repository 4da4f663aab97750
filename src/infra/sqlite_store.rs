//! SQLite implementation of the work-log store.
//!
//! Timestamps are stored as RFC 3339 UTC text so that lexical order matches
//! chronological order; they are converted back to host-local time on read.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension, Row};

use crate::{
    domain::employee::{Employee, EmployeeId, WorkLog, WorkLogId},
    usecases::contracts::{StoreError, WorkLogStore},
};

const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_employees_name ON employees(name);

CREATE TABLE IF NOT EXISTS work_logs (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id    INTEGER NOT NULL REFERENCES employees(id),
    check_in_time  TEXT NOT NULL,
    check_out_time TEXT
);
CREATE INDEX IF NOT EXISTS idx_work_logs_employee
    ON work_logs(employee_id, check_in_time);
"#;

const WORK_LOG_COLUMNS: &str = "id, employee_id, check_in_time, check_out_time";

pub struct SqliteWorkLogStore {
    conn: Mutex<Connection>,
}

impl SqliteWorkLogStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(map_sqlite_error)?;
        Self::from_connection(conn)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(map_sqlite_error)?;
        migrate(&conn).map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn query_work_log(
        &self,
        filter: &str,
        employee_id: EmployeeId,
    ) -> Result<Option<WorkLog>, StoreError> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {WORK_LOG_COLUMNS} FROM work_logs
             WHERE employee_id = ?1 {filter}
             ORDER BY check_in_time DESC, id DESC
             LIMIT 1"
        );
        conn.query_row(&sql, params![employee_id.0], map_work_log)
            .optional()
            .map_err(map_sqlite_error)
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(SCHEMA_V1)?;
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tracing::info!(from = version, to = SCHEMA_VERSION, "database schema migrated");
    Ok(())
}

impl WorkLogStore for SqliteWorkLogStore {
    fn create_employee(&self, name: &str) -> Result<EmployeeId, StoreError> {
        let conn = self.conn();
        conn.execute("INSERT INTO employees (name) VALUES (?1)", params![name])
            .map_err(map_sqlite_error)?;
        Ok(EmployeeId(conn.last_insert_rowid()))
    }

    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        self.conn()
            .query_row(
                "SELECT id, name FROM employees WHERE id = ?1",
                params![id.0],
                map_employee,
            )
            .optional()
            .map_err(map_sqlite_error)
    }

    fn find_employees_by_name(&self, name: &str) -> Result<Vec<Employee>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare_cached("SELECT id, name FROM employees WHERE name = ?1 ORDER BY id")
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(params![name], map_employee)
            .map_err(map_sqlite_error)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)
    }

    fn create_work_log(
        &self,
        employee_id: EmployeeId,
        check_in_time: DateTime<Local>,
    ) -> Result<WorkLogId, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO work_logs (employee_id, check_in_time) VALUES (?1, ?2)",
            params![employee_id.0, to_stored(check_in_time)],
        )
        .map_err(map_sqlite_error)?;
        Ok(WorkLogId(conn.last_insert_rowid()))
    }

    fn find_open_work_log(&self, employee_id: EmployeeId) -> Result<Option<WorkLog>, StoreError> {
        self.query_work_log("AND check_out_time IS NULL", employee_id)
    }

    fn find_latest_work_log(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<WorkLog>, StoreError> {
        self.query_work_log("", employee_id)
    }

    fn close_work_log(
        &self,
        id: WorkLogId,
        check_out_time: DateTime<Local>,
    ) -> Result<(), StoreError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE work_logs SET check_out_time = ?1 WHERE id = ?2",
                params![to_stored(check_out_time), id.0],
            )
            .map_err(map_sqlite_error)?;

        if changed == 0 {
            return Err(StoreError::WorkLogNotFound(id));
        }
        Ok(())
    }

    fn list_work_logs(&self, employee_id: EmployeeId) -> Result<Vec<WorkLog>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {WORK_LOG_COLUMNS} FROM work_logs
                 WHERE employee_id = ?1
                 ORDER BY check_in_time ASC, id ASC"
            ))
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(params![employee_id.0], map_work_log)
            .map_err(map_sqlite_error)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)
    }
}

fn map_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee::new(
        EmployeeId(row.get("id")?),
        row.get::<_, String>("name")?,
    ))
}

fn map_work_log(row: &Row<'_>) -> rusqlite::Result<WorkLog> {
    let check_in: String = row.get("check_in_time")?;
    let check_out: Option<String> = row.get("check_out_time")?;

    Ok(WorkLog {
        id: WorkLogId(row.get("id")?),
        employee_id: EmployeeId(row.get("employee_id")?),
        check_in_time: from_stored(2, &check_in)?,
        check_out_time: check_out
            .as_deref()
            .map(|raw| from_stored(3, raw))
            .transpose()?,
    })
}

fn to_stored(at: DateTime<Local>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_stored(column: usize, raw: &str) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Local))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
        })
}

fn map_sqlite_error(error: rusqlite::Error) -> StoreError {
    match error {
        rusqlite::Error::SqliteFailure(ref failure, ref message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Constraint(
                message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_owned()),
            )
        }
        rusqlite::Error::FromSqlConversionFailure(..) => StoreError::Corrupt(error.to_string()),
        other => StoreError::Backend(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_support::local_time;

    fn store() -> SqliteWorkLogStore {
        SqliteWorkLogStore::open_in_memory().expect("in-memory database should open")
    }

    #[test]
    fn creates_and_finds_employees() {
        let store = store();
        let alice = store.create_employee("Alice").expect("insert");
        let bob_one = store.create_employee("Bob").expect("insert");
        let bob_two = store.create_employee("Bob").expect("insert");

        assert_eq!(
            store.find_employee_by_id(alice).expect("query"),
            Some(Employee::new(alice, "Alice"))
        );
        assert_eq!(store.find_employee_by_id(EmployeeId(999)).expect("query"), None);

        let bobs = store.find_employees_by_name("Bob").expect("query");
        assert_eq!(
            bobs.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![bob_one, bob_two]
        );
        assert!(store.find_employees_by_name("bob").expect("query").is_empty());
    }

    #[test]
    fn work_log_round_trips_local_timestamps() {
        let store = store();
        let alice = store.create_employee("Alice").expect("insert");
        let check_in = local_time(2026, 2, 10, 8, 45);

        let id = store.create_work_log(alice, check_in).expect("insert");
        let open = store
            .find_open_work_log(alice)
            .expect("query")
            .expect("log should be open");

        assert_eq!(open.id, id);
        assert_eq!(open.check_in_time, check_in);
        assert!(open.is_open());

        store
            .close_work_log(id, check_in + Duration::hours(9))
            .expect("update");

        assert_eq!(store.find_open_work_log(alice).expect("query"), None);
        let latest = store
            .find_latest_work_log(alice)
            .expect("query")
            .expect("log should exist");
        assert_eq!(latest.check_out_time, Some(check_in + Duration::hours(9)));
    }

    #[test]
    fn open_and_latest_lookups_pick_most_recent_check_in() {
        let store = store();
        let alice = store.create_employee("Alice").expect("insert");
        let earlier = store
            .create_work_log(alice, local_time(2026, 2, 10, 8, 0))
            .expect("insert");
        let later = store
            .create_work_log(alice, local_time(2026, 2, 11, 8, 0))
            .expect("insert");
        store
            .close_work_log(later, local_time(2026, 2, 11, 16, 0))
            .expect("update");

        let open = store.find_open_work_log(alice).expect("query").expect("open");
        let latest = store.find_latest_work_log(alice).expect("query").expect("latest");

        assert_eq!(open.id, earlier);
        assert_eq!(latest.id, later);
    }

    #[test]
    fn lists_logs_chronologically() {
        let store = store();
        let alice = store.create_employee("Alice").expect("insert");
        store
            .create_work_log(alice, local_time(2026, 2, 12, 8, 0))
            .expect("insert");
        store
            .create_work_log(alice, local_time(2026, 2, 10, 8, 0))
            .expect("insert");

        let logs = store.list_work_logs(alice).expect("query");

        assert_eq!(logs.len(), 2);
        assert!(logs[0].check_in_time < logs[1].check_in_time);
    }

    #[test]
    fn closing_missing_log_is_an_error() {
        let store = store();

        let result = store.close_work_log(WorkLogId(41), local_time(2026, 2, 10, 17, 0));

        assert!(matches!(result, Err(StoreError::WorkLogNotFound(WorkLogId(41)))));
    }

    #[test]
    fn foreign_key_rejects_unknown_employee() {
        let store = store();

        let result = store.create_work_log(EmployeeId(5), local_time(2026, 2, 10, 8, 0));

        assert!(matches!(result, Err(StoreError::Constraint(_))));
    }

    #[test]
    fn reopening_a_database_keeps_data_and_schema() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shifts.sqlite");

        let id = {
            let store = SqliteWorkLogStore::open(&path).expect("open");
            store.create_employee("Alice").expect("insert")
        };

        let reopened = SqliteWorkLogStore::open(&path).expect("reopen");
        assert_eq!(
            reopened.find_employee_by_id(id).expect("query").map(|e| e.name),
            Some("Alice".to_owned())
        );
    }

    #[test]
    fn malformed_timestamps_surface_as_corrupt_data() {
        let store = store();
        let alice = store.create_employee("Alice").expect("insert");
        store
            .conn()
            .execute(
                "INSERT INTO work_logs (employee_id, check_in_time) VALUES (?1, 'yesterday')",
                params![alice.0],
            )
            .expect("raw insert");

        let result = store.list_work_logs(alice);

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
