//! SQLite-backed department counter store.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection};

use super::{Department, DepartmentError, DepartmentStore};

/// SQLite-backed department store.
pub struct SqliteDepartmentStore {
    conn: Mutex<Connection>,
}

impl SqliteDepartmentStore {
    /// Create a new SQLite department store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, DepartmentError> {
        let conn = Connection::open(path).map_err(|e| DepartmentError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite department store (useful for testing).
    pub fn in_memory() -> Result<Self, DepartmentError> {
        let conn =
            Connection::open_in_memory().map_err(|e| DepartmentError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), DepartmentError> {
        // Other stores may hold their own connection to the same file.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS departments (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                facility TEXT NOT NULL,
                last_ticket_assigned INTEGER NOT NULL DEFAULT 0,
                current_ticket INTEGER NOT NULL DEFAULT 0
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_departments_name_facility
                ON departments(name, facility);
            "#,
        )
        .map_err(|e| DepartmentError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_department(row: &rusqlite::Row) -> rusqlite::Result<Department> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            facility: row.get(2)?,
            last_ticket_assigned: row.get(3)?,
            current_ticket: row.get(4)?,
        })
    }
}

impl DepartmentStore for SqliteDepartmentStore {
    fn create(&self, name: &str, facility: &str) -> Result<Department, DepartmentError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO departments (id, name, facility, last_ticket_assigned, current_ticket) VALUES (?, ?, ?, 0, 0)",
            params![id, name, facility],
        )
        .map_err(|e| DepartmentError::Database(e.to_string()))?;

        Ok(Department {
            id,
            name: name.to_string(),
            facility: facility.to_string(),
            last_ticket_assigned: 0,
            current_ticket: 0,
        })
    }

    fn get(&self, id: &str) -> Result<Department, DepartmentError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, name, facility, last_ticket_assigned, current_ticket FROM departments WHERE id = ?",
            params![id],
            Self::row_to_department,
        );

        match result {
            Ok(department) => Ok(department),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(DepartmentError::NotFound(id.to_string()))
            }
            Err(e) => Err(DepartmentError::Database(e.to_string())),
        }
    }

    fn find_by_name(
        &self,
        name: &str,
        facility: &str,
    ) -> Result<Option<Department>, DepartmentError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, name, facility, last_ticket_assigned, current_ticket FROM departments WHERE name = ? AND facility = ?",
            params![name, facility],
            Self::row_to_department,
        );

        match result {
            Ok(department) => Ok(Some(department)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DepartmentError::Database(e.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<Department>, DepartmentError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, facility, last_ticket_assigned, current_ticket FROM departments ORDER BY facility, name",
            )
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_department)
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        let mut departments = Vec::new();
        for row_result in rows {
            let department = row_result.map_err(|e| DepartmentError::Database(e.to_string()))?;
            departments.push(department);
        }

        Ok(departments)
    }

    fn bump_last_ticket(&self, id: &str) -> Result<u64, DepartmentError> {
        let conn = self.conn.lock().unwrap();

        // Single-statement read-modify-write; two concurrent joiners can
        // never observe the same value.
        let result = conn.query_row(
            "UPDATE departments SET last_ticket_assigned = last_ticket_assigned + 1 WHERE id = ? RETURNING last_ticket_assigned",
            params![id],
            |row| row.get::<_, u64>(0),
        );

        match result {
            Ok(number) => Ok(number),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(DepartmentError::NotFound(id.to_string()))
            }
            Err(e) => Err(DepartmentError::Database(e.to_string())),
        }
    }

    fn set_current_ticket(&self, id: &str, number: u64) -> Result<(), DepartmentError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn
            .execute(
                "UPDATE departments SET current_ticket = ? WHERE id = ?",
                params![number, id],
            )
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(DepartmentError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
