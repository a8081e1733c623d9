use axum::extract::State;
use axum::Json;

use crate::api::ApiError;
use crate::models::{AskRequest, AskResponse};
use crate::state::AppState;

/// POST /api/ask - Rank catalog profiles against a natural-language question
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let results = state.retrieval.ask(&req.question, &req.filter).await?;
    Ok(Json(AskResponse { results }))
}
