use serde::Serialize;
use thiserror::Error;

use crate::department::DepartmentError;
use crate::ticket::TicketError;

/// Error type for queue engine operations.
///
/// `Invalid` input (a malformed contact string) never reaches the engine:
/// callers validate at the boundary. Inconsistencies found during advance
/// are logged and recovered, not surfaced.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Department not found: {0}")]
    DepartmentNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DepartmentError> for QueueError {
    fn from(err: DepartmentError) -> Self {
        match err {
            DepartmentError::NotFound(id) => QueueError::DepartmentNotFound(id),
            DepartmentError::Database(msg) => QueueError::Storage(msg),
        }
    }
}

impl From<TicketError> for QueueError {
    fn from(err: TicketError) -> Self {
        // The engine only requests legal transitions on tickets it just
        // resolved, so every ticket-level failure here is internal.
        QueueError::Storage(err.to_string())
    }
}

/// A request to join a department's queue. The contact string is already in
/// canonical 10-digit form when this is built.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub department_id: String,
    pub holder_name: String,
    pub phone: String,
    pub holder_id: Option<String>,
}

/// Result of a join: the assigned number, or the number recovered from an
/// existing pending ticket for the same contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    pub ticket_number: u64,
    pub already_queued: bool,
}

/// Result of an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next ticket is now being served.
    Serving(u64),
    /// No pending tickets; the department's current ticket was cleared.
    /// A valid terminal condition, not an error.
    Empty,
}

/// Read-only snapshot of a department's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub department_name: String,
    pub current_ticket: u64,
    pub last_ticket: u64,
    pub queue_length: u64,
    pub estimated_wait_minutes: u64,
}
