//! Sync trigger endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::remote::DriveCatalog;
use crate::storage::{HttpObjectStore, ObjectStateStore, SecretsClient};
use crate::sync::orchestrator::{PassSummary, SyncOrchestrator};
use crate::transfer::DriveToObjectTransferer;
use crate::utils::errors::Result;

/// POST /sync - Run one sync pass.
///
/// Always answers with a structured result: 200 when the pass completed
/// (including "nothing to do"), 500 when it failed, 409 when another pass
/// is already holding the checkpoint.
pub async fn trigger_sync(State(app): State<super::AppState>) -> Response {
    let Ok(_guard) = app.pass_lock.try_lock() else {
        tracing::warn!("Sync trigger rejected, a pass is already running");
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "busy",
                "message": "A sync pass is already running",
            })),
        )
            .into_response();
    };

    match run_one_pass(&app).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": summary.message(),
                "pass_id": summary.pass_id,
                "pass_started_at": summary.pass_started_at,
                "processed": summary.processed.len(),
                "skipped": summary.skipped,
                "failed": summary.failed,
                "catalog_unavailable": summary.catalog_unavailable,
                "processed_files": summary.processed,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Sync pass failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": format!("Sync pass failed: {e}"),
                })),
            )
                .into_response()
        }
    }
}

/// Wire up per-pass collaborators and run the pass. Credentials are fetched
/// fresh on every invocation, before the listing can start.
async fn run_one_pass(app: &super::AppState) -> Result<PassSummary> {
    let credentials = SecretsClient::new(app.http.clone(), &app.config.secrets)
        .fetch(&app.config.secrets.secret_id)
        .await?;

    let drive = DriveCatalog::new(app.http.clone(), &app.config.remote, credentials.token);
    let object_store = HttpObjectStore::new(app.http.clone(), &app.config.storage);

    let state_store = ObjectStateStore::new(
        object_store.clone(),
        app.config.storage.state_key.clone(),
    );
    let transferer = DriveToObjectTransferer::new(drive.clone(), object_store);

    let orchestrator = SyncOrchestrator::new(
        state_store,
        drive,
        transferer,
        app.config.storage.data_prefix.clone(),
        app.cancel_token.child_token(),
    );

    orchestrator.run_pass().await
}
