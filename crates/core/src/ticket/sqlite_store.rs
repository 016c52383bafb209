//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{NewTicket, Ticket, TicketError, TicketStatus, TicketStore};

const TICKET_COLUMNS: &str =
    "id, department_id, holder_id, holder_name, phone, ticket_number, status, created_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                department_id TEXT NOT NULL,
                holder_id TEXT,
                holder_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                ticket_number INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (department_id, ticket_number)
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_department_status
                ON tickets(department_id, status);
            CREATE INDEX IF NOT EXISTS idx_tickets_holder ON tickets(holder_id);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let created_at_str: String = row.get(7)?;
        // Parse timestamp - use now if parsing fails (shouldn't happen with valid data)
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let status_str: String = row.get(6)?;
        let status = TicketStatus::parse(&status_str).unwrap_or(TicketStatus::Pending);

        Ok(Ticket {
            id: row.get(0)?,
            department_id: row.get(1)?,
            holder_id: row.get(2)?,
            holder_name: row.get(3)?,
            phone: row.get(4)?,
            ticket_number: row.get(5)?,
            status,
            created_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Ticket, TicketError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS),
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(ticket),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(TicketError::NotFound(id.to_string())),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn optional_row(
        result: rusqlite::Result<Ticket>,
    ) -> Result<Option<Ticket>, TicketError> {
        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: NewTicket) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = TicketStatus::Pending;

        conn.execute(
            "INSERT INTO tickets (id, department_id, holder_id, holder_name, phone, ticket_number, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.department_id,
                request.holder_id,
                request.holder_name,
                request.phone,
                request.ticket_number,
                status.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id,
            department_id: request.department_id,
            holder_id: request.holder_id,
            holder_name: request.holder_name,
            phone: request.phone,
            ticket_number: request.ticket_number,
            status,
            created_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        Self::optional_row(conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS),
            params![id],
            Self::row_to_ticket,
        ))
    }

    fn find_by_number(
        &self,
        department_id: &str,
        number: u64,
    ) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        Self::optional_row(conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE department_id = ? AND ticket_number = ?",
                TICKET_COLUMNS
            ),
            params![department_id, number],
            Self::row_to_ticket,
        ))
    }

    fn find_pending_by_phone(
        &self,
        department_id: &str,
        phone: &str,
    ) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        Self::optional_row(conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE department_id = ? AND phone = ? AND status = 'pending' LIMIT 1",
                TICKET_COLUMNS
            ),
            params![department_id, phone],
            Self::row_to_ticket,
        ))
    }

    fn next_pending(&self, department_id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        Self::optional_row(conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE department_id = ? AND status = 'pending' ORDER BY ticket_number ASC LIMIT 1",
                TICKET_COLUMNS
            ),
            params![department_id],
            Self::row_to_ticket,
        ))
    }

    fn list_active_by_department(&self, department_id: &str) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tickets WHERE department_id = ? AND status IN ('pending', 'serving') ORDER BY ticket_number ASC",
                TICKET_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![department_id], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn list_active_by_holder(&self, holder_id: &str) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tickets WHERE holder_id = ? AND status IN ('pending', 'serving') ORDER BY created_at DESC",
                TICKET_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![holder_id], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count_pending(&self, department_id: &str) -> Result<u64, TicketError> {
        let conn = self.conn.lock().unwrap();

        let count: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM tickets WHERE department_id = ? AND status = 'pending'",
                params![department_id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }

    fn set_status(&self, id: &str, status: TicketStatus) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        if !current.status.can_transition_to(status) {
            return Err(TicketError::InvalidTransition {
                ticket_id: id.to_string(),
                from: current.status,
                to: status,
            });
        }

        conn.execute(
            "UPDATE tickets SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket { status, ..current })
    }
}
