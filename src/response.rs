//! The `{success, message}` reply and its mapping from ingest outcomes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::ingestor::{IngestFailure, Ingested};

pub const UNREACHABLE_MESSAGE: &str = "Could not connect to GitHub";

/// JSON body of every reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub success: bool,
    pub message: String,
}

/// Status code plus body.
///
/// Only configuration faults use a server-error status. Every other failure
/// is a soft failure: `200` with `success: false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl SubmissionResponse {
    fn new(status: StatusCode, success: bool, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody {
                success,
                message: message.into(),
            },
        }
    }

    pub fn ingested(done: &Ingested) -> Self {
        Self::new(
            StatusCode::OK,
            true,
            format!("Successfully created/updated {}", done.file_name),
        )
    }

    pub fn failed(failure: &IngestFailure) -> Self {
        match &failure.error {
            IngestError::Config { .. } | IngestError::InvalidConfig { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                failure.error.to_string(),
            ),
            IngestError::InvalidRequest(message) => {
                Self::new(StatusCode::OK, false, message.clone())
            }
            IngestError::Unreachable(_) => Self::new(StatusCode::OK, false, UNREACHABLE_MESSAGE),
            other => Self::new(
                StatusCode::OK,
                false,
                format!(
                    "Error creating/updating {} or index, original error: {}",
                    failure.file_name.as_deref().unwrap_or("submission"),
                    other.remote_message().unwrap_or_default()
                ),
            ),
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }
}

impl IntoResponse for SubmissionResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::SagaStage;

    fn failure(stage: SagaStage, error: IngestError) -> IngestFailure {
        IngestFailure {
            stage,
            file_name: Some("alice1234.html".into()),
            error,
        }
    }

    #[test]
    fn config_fault_is_server_error() {
        let resp = SubmissionResponse::failed(&IngestFailure {
            stage: SagaStage::Preflight,
            file_name: None,
            error: IngestError::Config {
                missing: vec!["GITHUB_TOKEN"],
            },
        });
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!resp.is_success());
        assert_eq!(resp.body.message, "Missing configuration: GITHUB_TOKEN");
    }

    #[test]
    fn invalid_setting_is_server_error() {
        let resp = SubmissionResponse::failed(&IngestFailure {
            stage: SagaStage::Preflight,
            file_name: None,
            error: IngestError::InvalidConfig {
                setting: "GITHUB_API_URL",
                reason: "not a base URL".into(),
            },
        });
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.body.message,
            "Invalid configuration: GITHUB_API_URL: not a base URL"
        );
    }

    #[test]
    fn remote_fault_surfaces_remote_message() {
        let resp = SubmissionResponse::failed(&failure(
            SagaStage::SubmissionFile,
            IngestError::Remote {
                status: 403,
                message: "Resource not accessible by integration".into(),
            },
        ));
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            resp.body.message,
            concat!(
                "Error creating/updating alice1234.html or index, ",
                "original error: Resource not accessible by integration"
            )
        );
    }

    #[test]
    fn unreachable_is_generic() {
        let resp = SubmissionResponse::failed(&failure(
            SagaStage::Index,
            IngestError::Unreachable("dns error".into()),
        ));
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body.message, UNREACHABLE_MESSAGE);
    }

    #[test]
    fn body_serializes_success_field() {
        let resp = SubmissionResponse::ingested(&Ingested {
            file_name: "bob.html".into(),
            index: crate::IndexUpdate::Created,
        });
        let json = serde_json::to_value(&resp.body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "message": "Successfully created/updated bob.html"})
        );
    }
}
