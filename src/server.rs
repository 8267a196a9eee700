//! HTTP surface: routes that feed request bodies to the ingestor.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;

use crate::ingestor::SubmissionIngestor;
use crate::response::SubmissionResponse;
use crate::storage::Repository;

/// Build the router.
///
/// `POST /` and `POST /submission` both accept a JSON submission. The body
/// is taken as raw bytes, and an unreadable or oversized body still gets a
/// JSON `{success, message}` reply.
pub fn router<R: Repository>(ingestor: Arc<SubmissionIngestor<R>>) -> Router {
    let body_limit = ingestor.config().body_limit();
    Router::new()
        .route("/", post(submit::<R>))
        .route("/submission", post(submit::<R>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ingestor)
}

async fn submit<R: Repository>(
    State(ingestor): State<Arc<SubmissionIngestor<R>>>,
    body: Result<Bytes, BytesRejection>,
) -> SubmissionResponse {
    match body {
        Ok(body) => ingestor.handle_submission(&body).await,
        Err(rejection) => ingestor.reject_unreadable(rejection.body_text()),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
