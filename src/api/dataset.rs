use std::io::ErrorKind;

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::bail_assist;
use crate::error::AssistResult;
use crate::AppState;

/// Serves the training CSV as an attachment
#[axum_macros::debug_handler]
pub(crate) async fn handle_data_download(State(state): State<AppState>) -> AssistResult<Response> {
    let path = state.dataset_path.as_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            bail_assist!(StatusCode::NOT_FOUND, "Dataset not found")
        }
        Err(err) => return Err(err.into()),
    };
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Data.csv".to_string());

    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
