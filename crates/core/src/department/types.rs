use serde::{Deserialize, Serialize};

/// A logical service queue with its own independent ticket numbering.
///
/// `current_ticket` is the authoritative pointer for "who is being served":
/// 0 means nobody, otherwise it names the number of the department's single
/// `serving` ticket. Only the queue engine's join/advance operations mutate
/// the two counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    /// Owning facility label, e.g. the hospital or branch the queue runs in.
    pub facility: String,
    /// Highest ticket number issued so far. Monotonically non-decreasing,
    /// starts at 0.
    pub last_ticket_assigned: u64,
    /// Number of the ticket currently being served, 0 when none.
    pub current_ticket: u64,
}
