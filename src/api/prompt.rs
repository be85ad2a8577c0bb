use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::completion::endpoints::{PromptEndpoint, PROMPT_ENDPOINTS};
use crate::completion::pipeline::{run_prompt, PromptRequest, PromptResponse};
use crate::error::AssistResult;
use crate::extractors::JsonBody;
use crate::AppState;

type PromptBody = JsonBody<PromptRequest>;

/// One POST route per entry of the prompt endpoint table
pub(crate) fn prompt_routes() -> Router<AppState> {
    let mut router = Router::new();
    for endpoint in PROMPT_ENDPOINTS.iter() {
        let handler = move |State(state): State<AppState>, JsonBody(request): PromptBody| {
            handle_prompt_request(state, endpoint, request)
        };
        router = router.route(endpoint.path, post(handler));
    }
    router
}

async fn handle_prompt_request(
    state: AppState,
    endpoint: &'static PromptEndpoint,
    request: PromptRequest,
) -> AssistResult<Json<PromptResponse>> {
    let response = run_prompt(state.completion.as_ref(), endpoint, &request.input_text).await?;
    Ok(Json(response))
}
