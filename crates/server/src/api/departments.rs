//! Department listing for the narrow read surface.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use vestibule_core::Department;

use super::queue::ErrorResponse;
use crate::state::AppState;

/// Wire shape of a department; counters are served by the status endpoint.
#[derive(Debug, Serialize)]
pub struct DepartmentSummary {
    pub id: String,
    pub name: String,
    pub facility: String,
}

impl From<Department> for DepartmentSummary {
    fn from(department: Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
            facility: department.facility,
        }
    }
}

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DepartmentSummary>>, (StatusCode, Json<ErrorResponse>)> {
    match state.departments().list() {
        Ok(departments) => Ok(Json(
            departments
                .into_iter()
                .map(DepartmentSummary::from)
                .collect(),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
