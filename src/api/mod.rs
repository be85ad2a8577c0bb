use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub(crate) mod dataset;
pub(crate) mod prediction;
pub(crate) mod prompt;
pub(crate) mod submission;

pub(crate) fn router(state: AppState) -> Router {
    let prediction_router = Router::new()
        .route("/predict", post(prediction::handle_linear_prediction))
        .route(
            "/predict-decision-tree",
            post(prediction::handle_decision_tree_prediction),
        )
        .route(
            "/predict-logistic",
            post(prediction::handle_logistic_prediction),
        );

    let submission_router = Router::new()
        .route("/feedback-submit", post(submission::handle_feedback_submit))
        .route("/waitlist-submit", post(submission::handle_waitlist_submit));

    Router::new()
        .merge(prediction_router)
        .merge(prompt::prompt_routes())
        .merge(submission_router)
        .route("/data", get(dataset::handle_data_download))
        .route("/health", get(handle_health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use axum::async_trait;
    use reqwest::StatusCode;
    use tokio::net::TcpListener;

    use super::*;
    use crate::completion::client::{OpenAiClient, Upstream};
    use crate::completion::endpoints::PROMPT_ENDPOINTS;
    use crate::completion::{CompletionHandler, CompletionOutcome, CompletionRequest};
    use crate::prediction::dataset::SalaryDataset;
    use crate::prediction::SalaryModels;
    use crate::store::tests::memory_store;
    use crate::store::{FEEDBACK_COLLECTION, WAITLIST_COLLECTION};

    const DATASET: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/Data.csv");
    const PREDICT_PATHS: [&str; 3] = ["/predict", "/predict-decision-tree", "/predict-logistic"];

    enum StubCompletion {
        Answer(&'static str),
        NoChoices,
        Unreachable,
    }

    #[async_trait]
    impl CompletionHandler for StubCompletion {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionOutcome> {
            match self {
                StubCompletion::Answer(text) => Ok(CompletionOutcome::Answered(text.to_string())),
                StubCompletion::NoChoices => Ok(CompletionOutcome::NoChoices(
                    json!({"error": {"message": "quota exceeded"}}),
                )),
                StubCompletion::Unreachable => Err(anyhow!("connection refused")),
            }
        }
    }

    async fn state(completion: StubCompletion, dataset_path: &str) -> AppState {
        let dataset = SalaryDataset::from_path(DATASET).unwrap();
        AppState {
            completion: Arc::new(completion),
            salary_models: Arc::new(SalaryModels::from_dataset(&dataset).unwrap()),
            store: memory_store().await,
            dataset_path: Arc::new(PathBuf::from(dataset_path)),
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::serve(listener, router);
        tokio::spawn(async move { server.await.unwrap() });
        format!("http://{addr}")
    }

    async fn serve(state: AppState) -> String {
        spawn(router(state)).await
    }

    async fn post_json(base: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{base}{path}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    fn error_message(body: &Value) -> &str {
        body["error"].as_str().unwrap()
    }

    #[tokio::test]
    async fn prompt_endpoint_returns_lines() {
        let base = serve(state(StubCompletion::Answer("\na\nb\nc\n"), DATASET).await).await;
        let (status, body) = post_json(&base, "/tasks", json!({"inputText": "x, y, z"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"predicted_items": ["a", "b", "c"]}));
    }

    #[tokio::test]
    async fn every_table_entry_is_routed() {
        let base = serve(state(StubCompletion::Answer("one"), DATASET).await).await;
        for endpoint in PROMPT_ENDPOINTS.iter() {
            let (status, _) = post_json(&base, endpoint.path, json!({"inputText": "idea"})).await;
            assert_eq!(status, StatusCode::OK, "{}", endpoint.path);
        }
    }

    #[tokio::test]
    async fn code_endpoints_return_a_single_string() {
        let state = state(StubCompletion::Answer("  line1\nline2 "), DATASET).await;
        let base = serve(state).await;
        let (status, body) = post_json(&base, "/backend-code", json!({"inputText": "login"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"predicted_items": "line1\nline2"}));
    }

    #[tokio::test]
    async fn missing_choices_is_a_200_error_body() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        let input = json!({"inputText": "dark mode"});
        let (status, body) = post_json(&base, "/hypothesis", input).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "No 'choices' in API response"}));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_server_error() {
        let base = serve(state(StubCompletion::Unreachable, DATASET).await).await;
        let input = json!({"inputText": "pet app"});
        let (status, body) = post_json(&base, "/marketSize", input).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error_message(&body).contains("connection refused"));
    }

    #[tokio::test]
    async fn non_json_upstream_body_is_a_server_error() {
        let upstream = Router::new().route(
            "/v1/completions",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_GATEWAY,
                    axum::response::Html("<html><body>502 Bad Gateway</body></html>"),
                )
            }),
        );
        let upstream_url = format!("{}/v1/completions", spawn(upstream).await);
        let completion = OpenAiClient::new(
            None,
            Upstream::parse(&upstream_url, "text-model").unwrap(),
            Upstream::parse(&upstream_url, "chat-model").unwrap(),
        )
        .unwrap();

        let mut state = state(StubCompletion::NoChoices, DATASET).await;
        state.completion = Arc::new(completion);
        let base = serve(state).await;

        let input = json!({"inputText": "login page"});
        let (status, body) = post_json(&base, "/tasks", input).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error_message(&body).contains("without a JSON body"));
    }

    #[tokio::test]
    async fn predictions_are_non_negative_integers() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        for path in PREDICT_PATHS {
            for (age, weight) in [(30, 70), (0, 400), (90, 40)] {
                let input = json!({"age": age, "weight": weight});
                let (status, body) = post_json(&base, path, input).await;
                assert_eq!(status, StatusCode::OK);
                let salary = body["predicted_salary"].as_i64().unwrap();
                assert!(salary >= 0, "{path}: {body}");
            }
        }
    }

    #[tokio::test]
    async fn malformed_prediction_input_fails() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        let (status, body) = post_json(&base, "/predict", json!({"age": 30})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());

        let input = json!({"age": "thirty", "weight": 70});
        let (status, _) = post_json(&base, "/predict", input).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_finite_prediction_input_fails() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        for path in PREDICT_PATHS {
            for age in ["nan", "inf", "-inf", "1e400"] {
                let input = json!({"age": age, "weight": 70});
                let (status, body) = post_json(&base, path, input).await;
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}: {age}");
                assert!(body["error"].is_string());
            }
        }
    }

    #[tokio::test]
    async fn unrepresentable_salary_fails() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        let input = json!({"age": 1e300, "weight": 70});
        let (status, body) = post_json(&base, "/predict", input).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error_message(&body).contains("out of range"));
    }

    #[tokio::test]
    async fn submissions_must_be_objects() {
        let state = state(StubCompletion::NoChoices, DATASET).await;
        let store = state.store.clone();
        let base = serve(state).await;
        for payload in [json!(["a", "b"]), json!("text"), json!(5)] {
            let (status, body) = post_json(&base, "/waitlist-submit", payload).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body["error"].is_string());
        }
        assert_eq!(store.count(WAITLIST_COLLECTION).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn submissions_are_never_deduplicated() {
        let state = state(StubCompletion::NoChoices, DATASET).await;
        let store = state.store.clone();
        let base = serve(state).await;
        let payload = json!({"message": "love it", "rating": 5});

        let (_, first) = post_json(&base, "/feedback-submit", payload.clone()).await;
        let (_, second) = post_json(&base, "/feedback-submit", payload.clone()).await;
        let (status, waitlisted) =
            post_json(&base, "/waitlist-submit", json!({"email": "a@b.c"})).await;

        assert_eq!(status, StatusCode::OK);
        assert!(waitlisted["_id"].is_string());
        assert_ne!(first["_id"], second["_id"]);
        assert_eq!(store.count(FEEDBACK_COLLECTION).await.unwrap(), 2);
        let records = store.list(FEEDBACK_COLLECTION, 10).await.unwrap();
        assert!(records.iter().all(|r| r.body == payload));
    }

    #[tokio::test]
    async fn dataset_is_downloadable() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        let response = reqwest::get(format!("{base}/data")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"Data.csv\""
        );
        let text = response.text().await.unwrap();
        assert!(text.starts_with("Age,Weight,Salary"));
    }

    #[tokio::test]
    async fn missing_dataset_is_not_found() {
        let state = state(StubCompletion::NoChoices, "/nonexistent/Data.csv").await;
        let base = serve(state).await;
        let response = reqwest::get(format!("{base}/data")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_cors() {
        let base = serve(state(StubCompletion::NoChoices, DATASET).await).await;
        let response = reqwest::Client::new()
            .get(format!("{base}/health"))
            .header("origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }
}
