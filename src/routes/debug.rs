//! Debug endpoints for development
//!
//! Only mounted when ROUTER_DEBUG=true. They expose session affinity state.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    session::SessionAffinity,
    AppState,
};

/// Look up a session's tier/model binding
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionAffinity>> {
    state
        .router
        .sessions()
        .get(&session_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("session '{}'", session_id)))
}
