use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AssistResult;
use crate::extractors::JsonBody;
use crate::store::{FEEDBACK_COLLECTION, WAITLIST_COLLECTION};
use crate::AppState;

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct SubmissionResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
}

async fn submit(
    state: &AppState,
    collection: &str,
    body: Map<String, Value>,
) -> AssistResult<Json<SubmissionResponse>> {
    let id = state.store.insert(collection, &Value::Object(body)).await?;
    Ok(Json(SubmissionResponse { id }))
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_feedback_submit(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> AssistResult<Json<SubmissionResponse>> {
    submit(&state, FEEDBACK_COLLECTION, body).await
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_waitlist_submit(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> AssistResult<Json<SubmissionResponse>> {
    submit(&state, WAITLIST_COLLECTION, body).await
}
