//! Queue API handlers: join, advance, status and ticket listings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vestibule_core::{
    is_canonical_phone, AdvanceOutcome, JoinOutcome, JoinRequest, QueueError, QueueStatus, Ticket,
    TicketStatus,
};

use crate::metrics::{QUEUE_ADVANCES_TOTAL, QUEUE_JOINS_TOTAL};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for joining a queue
#[derive(Debug, Deserialize)]
pub struct JoinBody {
    /// Holder display name
    pub name: String,
    /// Contact string in canonical 10-digit form
    pub phone: String,
    /// Optional holder identity reference
    pub holder_id: Option<String>,
}

/// Response for an advance
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AdvanceResponse {
    Serving { current_ticket: u64 },
    Empty { empty: bool },
}

/// Wire shape of a ticket
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub department_id: String,
    pub holder_id: Option<String>,
    pub holder_name: String,
    pub phone: String,
    pub ticket_number: u64,
    pub status: TicketStatus,
    pub created_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            department_id: ticket.department_id,
            holder_id: ticket.holder_id,
            holder_name: ticket.holder_name,
            phone: ticket.phone,
            ticket_number: ticket.ticket_number,
            status: ticket.status,
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: QueueError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        QueueError::DepartmentNotFound(_) => StatusCode::NOT_FOUND,
        QueueError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Join a department's queue
pub async fn join(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<String>,
    Json(body): Json<JoinBody>,
) -> Result<Json<JoinOutcome>, (StatusCode, Json<ErrorResponse>)> {
    // Invalid input is rejected here, before the engine is invoked
    if !is_canonical_phone(&body.phone) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid phone: expected canonical 10-digit form".to_string(),
            }),
        ));
    }

    let request = JoinRequest {
        department_id: department_id.clone(),
        holder_name: body.name,
        phone: body.phone,
        holder_id: body.holder_id,
    };

    match state.engine().join(request) {
        Ok(outcome) => {
            let result = if outcome.already_queued {
                "recovered"
            } else {
                "issued"
            };
            QUEUE_JOINS_TOTAL
                .with_label_values(&[&department_id, result])
                .inc();
            Ok(Json(outcome))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Complete the current ticket and call the next one
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<String>,
) -> Result<Json<AdvanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine().advance(&department_id) {
        Ok(AdvanceOutcome::Serving(number)) => {
            QUEUE_ADVANCES_TOTAL
                .with_label_values(&[&department_id, "serving"])
                .inc();
            Ok(Json(AdvanceResponse::Serving {
                current_ticket: number,
            }))
        }
        Ok(AdvanceOutcome::Empty) => {
            QUEUE_ADVANCES_TOTAL
                .with_label_values(&[&department_id, "empty"])
                .inc();
            Ok(Json(AdvanceResponse::Empty { empty: true }))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Queue status snapshot for displays and status pages
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<String>,
) -> Result<Json<QueueStatus>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine().status(&department_id) {
        Ok(status) => Ok(Json(status)),
        Err(e) => Err(error_response(e)),
    }
}

/// Active (pending + serving) tickets of a department, ascending by number
pub async fn list_active(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<String>,
) -> Result<Json<Vec<TicketResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine().list_active(&department_id) {
        Ok(tickets) => Ok(Json(tickets.into_iter().map(TicketResponse::from).collect())),
        Err(e) => Err(error_response(e)),
    }
}

/// Active tickets of a holder, newest first
pub async fn list_for_holder(
    State(state): State<Arc<AppState>>,
    Path(holder_id): Path<String>,
) -> Result<Json<Vec<TicketResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine().list_for_holder(&holder_id) {
        Ok(tickets) => Ok(Json(tickets.into_iter().map(TicketResponse::from).collect())),
        Err(e) => Err(error_response(e)),
    }
}
