//! Department counter storage trait.

use std::fmt;

use crate::department::Department;

/// Error type for department counter operations.
#[derive(Debug)]
pub enum DepartmentError {
    /// Department not found. Never silently defaulted; callers decide.
    NotFound(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for DepartmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartmentError::NotFound(id) => write!(f, "Department not found: {}", id),
            DepartmentError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DepartmentError {}

/// Trait for department counter storage backends.
///
/// This is the single source of truth for `last_ticket_assigned` and
/// `current_ticket`; the queue engine never computes a ticket number from
/// anything but this store's current value.
pub trait DepartmentStore: Send + Sync {
    /// Create a department with fresh counters.
    fn create(&self, name: &str, facility: &str) -> Result<Department, DepartmentError>;

    /// Get a department by id.
    fn get(&self, id: &str) -> Result<Department, DepartmentError>;

    /// Look a department up by its name + facility pair.
    fn find_by_name(
        &self,
        name: &str,
        facility: &str,
    ) -> Result<Option<Department>, DepartmentError>;

    /// List all departments.
    fn list(&self) -> Result<Vec<Department>, DepartmentError>;

    /// Atomically increment `last_ticket_assigned` and return the new value.
    /// This is the sole source of ticket numbers.
    fn bump_last_ticket(&self, id: &str) -> Result<u64, DepartmentError>;

    /// Point `current_ticket` at `number` (0 clears it).
    fn set_current_ticket(&self, id: &str, number: u64) -> Result<(), DepartmentError>;
}
