//! Core ticket data types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9]{10}$").unwrap());

/// Whether `phone` is in the canonical 10-digit form the queue accepts.
///
/// Callers normalize and reject before invoking the engine; nothing inside
/// the engine coerces a malformed contact string.
pub fn is_canonical_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Lifecycle state of a ticket.
///
/// Transitions only move forward: `pending → serving → completed`, with
/// `pending → cancelled` as the orthogonal exit. `completed` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Serving,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Serving => "serving",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TicketStatus::Pending),
            "serving" => Some(TicketStatus::Serving),
            "completed" => Some(TicketStatus::Completed),
            "cancelled" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a ticket still occupies a queue position.
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Pending | TicketStatus::Serving)
    }

    /// Whether the transition graph allows moving to `next` from here.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Pending, TicketStatus::Serving)
                | (TicketStatus::Serving, TicketStatus::Completed)
                | (TicketStatus::Pending, TicketStatus::Cancelled)
        )
    }
}

/// A single queue position issued to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub department_id: String,
    /// Weak back-reference to the holder identity, used only for lookup.
    pub holder_id: Option<String>,
    pub holder_name: String,
    /// Canonical 10-digit contact string.
    pub phone: String,
    /// Unique within the department, assigned in strictly increasing order
    /// of issuance. Never changes after creation.
    pub ticket_number: u64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}
