//! Ticket storage trait and types.

use std::fmt;

use crate::ticket::{Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Ticket not found.
    NotFound(String),
    /// The transition graph forbids this status change.
    InvalidTransition {
        ticket_id: String,
        from: TicketStatus,
        to: TicketStatus,
    },
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::InvalidTransition {
                ticket_id,
                from,
                to,
            } => write!(
                f,
                "Cannot move ticket {} from {} to {}",
                ticket_id,
                from.as_str(),
                to.as_str()
            ),
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// Request to create a new ticket. The number must come from the department
/// counter store's atomic increment; the ticket collection never invents one.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub department_id: String,
    pub holder_id: Option<String>,
    pub holder_name: String,
    pub phone: String,
    pub ticket_number: u64,
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket with status `pending`.
    fn create(&self, request: NewTicket) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Find the ticket holding `number` within a department.
    fn find_by_number(
        &self,
        department_id: &str,
        number: u64,
    ) -> Result<Option<Ticket>, TicketError>;

    /// Find a `pending` ticket for this exact contact string within a
    /// department. De-duplication probe for idempotent joins.
    fn find_pending_by_phone(
        &self,
        department_id: &str,
        phone: &str,
    ) -> Result<Option<Ticket>, TicketError>;

    /// The `pending` ticket with the smallest number, if any.
    fn next_pending(&self, department_id: &str) -> Result<Option<Ticket>, TicketError>;

    /// All pending and serving tickets of a department, ascending by number.
    fn list_active_by_department(&self, department_id: &str) -> Result<Vec<Ticket>, TicketError>;

    /// All pending and serving tickets of a holder, newest first.
    fn list_active_by_holder(&self, holder_id: &str) -> Result<Vec<Ticket>, TicketError>;

    /// Number of `pending` tickets in a department.
    fn count_pending(&self, department_id: &str) -> Result<u64, TicketError>;

    /// Move a ticket to `status`, enforcing the forward-only transition
    /// graph.
    fn set_status(&self, id: &str, status: TicketStatus) -> Result<Ticket, TicketError>;
}
