use axum::extract::State;
use axum::Json;

use crate::error::AssistResult;
use crate::extractors::JsonBody;
use crate::prediction::{ModelKind, PredictionRequest, PredictionResponse};
use crate::AppState;

fn predict_with(
    state: &AppState,
    kind: ModelKind,
    request: &PredictionRequest,
) -> AssistResult<Json<PredictionResponse>> {
    let response = state.salary_models.predict(kind, request)?;
    tracing::debug!(
        model = ?kind,
        age = request.age,
        weight = request.weight,
        salary = response.predicted_salary,
        "Predicted salary"
    );
    Ok(Json(response))
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_linear_prediction(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PredictionRequest>,
) -> AssistResult<Json<PredictionResponse>> {
    predict_with(&state, ModelKind::Linear, &request)
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_decision_tree_prediction(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PredictionRequest>,
) -> AssistResult<Json<PredictionResponse>> {
    predict_with(&state, ModelKind::DecisionTree, &request)
}

#[axum_macros::debug_handler]
pub(crate) async fn handle_logistic_prediction(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PredictionRequest>,
) -> AssistResult<Json<PredictionResponse>> {
    predict_with(&state, ModelKind::Logistic, &request)
}
