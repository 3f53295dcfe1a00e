use axum::{
    extract::{Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::server::AppState;
use crate::{Error, SortOrder};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ListParams {
    pub directory: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)>;

fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidOrder(_) => StatusCode::BAD_REQUEST,
        Error::Parse { .. } | Error::DuplicateKey { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Request failed: {}", err);
    }
    (status, Json(ErrorResponse { error: err.to_string() }))
}

/// Wildcard captures carry no leading `/`
fn virtual_path(captured: &str) -> String {
    format!("/{}", captured.trim_start_matches('/'))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> ApiResult {
    let cms = state.cms.lock().await;
    let page = cms.get_content(&virtual_path(&path)).map_err(error_response)?;
    Ok(Json(page.to_value()))
}

pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> ApiResult {
    let cms = state.cms.lock().await;
    let doc = cms.get_data(&virtual_path(&path)).map_err(error_response)?;
    Ok(Json(doc.to_value()))
}

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let order = match params.order.as_deref() {
        Some(order) => order.parse::<SortOrder>().map_err(error_response)?,
        None => SortOrder::default(),
    };
    let directory = params.directory.unwrap_or_else(|| "/".to_string());

    let cms = state.cms.lock().await;
    let pages = cms.list_content(&directory, order).map_err(error_response)?;
    Ok(Json(serde_json::json!({
        "directory": directory,
        "pages": pages,
    })))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let cms = state.cms.lock().await;
    let stats = cms.stats().map_err(error_response)?;
    Ok(Json(serde_json::json!(stats)))
}

/// The walk and the SQLite transaction block, so they run on the blocking
/// pool with the lock held until commit.
pub async fn rebuild(State(state): State<Arc<AppState>>) -> ApiResult {
    let mut cms = state.cms.clone().lock_owned().await;
    let stats = tokio::task::spawn_blocking(move || cms.rebuild())
        .await
        .map_err(|e| {
            tracing::error!("Rebuild task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: format!("rebuild task failed: {}", e) }),
            )
        })?
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({
        "pages": stats.pages,
        "documents": stats.documents,
        "skipped": stats.skipped,
        "elapsed_ms": stats.elapsed.as_millis() as u64,
    })))
}
