//! The write-submission-and-update-index pipeline.
//!
//! A submission is two independent remote writes: the submission file, then
//! the index. There is no transaction between them. If the second write
//! fails the submission file stays written and the failure is reported with
//! [`SagaStage::Index`]. Resubmitting the same request converges, because the
//! first write is a plain overwrite and the index never duplicates a link.

use crate::config::IngestorConfig;
use crate::error::IngestError;
use crate::index::{self, IndexUpdate};
use crate::response::SubmissionResponse;
use crate::storage::{Lookup, RepoTarget, Repository, RepositoryFile};
use crate::submission::SubmissionRequest;

/// Step of the pipeline at which a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStage {
    /// Configuration or input checks; nothing was sent to the remote.
    Preflight,
    /// Writing the submission file; the index was not touched.
    SubmissionFile,
    /// Updating the index; the submission file is already written.
    Index,
}

/// A failed submission and how far it got.
#[derive(Debug)]
pub struct IngestFailure {
    pub stage: SagaStage,
    /// Derived file name, once known.
    pub file_name: Option<String>,
    pub error: IngestError,
}

impl IngestFailure {
    fn preflight(error: IngestError) -> Self {
        Self {
            stage: SagaStage::Preflight,
            file_name: None,
            error,
        }
    }

    /// `true` when the submission file was written but the index was not.
    pub fn is_partial(&self) -> bool {
        self.stage == SagaStage::Index
    }
}

/// A completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub file_name: String,
    pub index: IndexUpdate,
}

/// Accepts submissions and writes them into the configured repository.
///
/// Holds no per-request state; one instance serves every request.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use submission_ingestor::{GithubContents, IngestorConfig};
///
/// # async fn example() -> submission_ingestor::Result<()> {
/// let config = IngestorConfig::from_env();
/// let contents = GithubContents::new(config.api_base_url(), Duration::from_secs(10))?;
/// let ingestor = config.build(contents);
///
/// let response = ingestor
///     .handle_submission(r#"{"discord":"alice#1234","name":"Alice","html":"<b>hi</b>"}"#)
///     .await;
/// assert!(response.is_success());
/// # Ok(())
/// # }
/// ```
pub struct SubmissionIngestor<R: Repository> {
    config: IngestorConfig,
    repository: R,
}

impl<R: Repository> SubmissionIngestor<R> {
    pub fn new(config: IngestorConfig, repository: R) -> Self {
        Self { config, repository }
    }

    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    /// Handle a raw request body and produce the reply.
    pub async fn handle_submission(&self, body: impl AsRef<[u8]>) -> SubmissionResponse {
        let outcome = match SubmissionRequest::from_body(body) {
            Ok(request) => self.ingest(&request).await,
            Err(e) => Err(self.reject_body(e)),
        };

        match outcome {
            Ok(done) => SubmissionResponse::ingested(&done),
            Err(failure) => SubmissionResponse::failed(&failure),
        }
    }

    /// Run the pipeline for an already-parsed request.
    pub async fn ingest(&self, request: &SubmissionRequest) -> Result<Ingested, IngestFailure> {
        tracing::info!(
            "Received submission request for name: {:?}, discord: {:?}",
            request.name,
            request.discord
        );

        let target = self.config.target().map_err(|e| {
            tracing::error!("{e}");
            IngestFailure::preflight(e)
        })?;
        request.validate().map_err(|e| {
            tracing::error!("Rejected submission: {e}");
            IngestFailure::preflight(e)
        })?;

        let file_name = request.file_name();
        let fail = |stage, error| IngestFailure {
            stage,
            file_name: Some(file_name.clone()),
            error,
        };

        self.write_submission(&target, &file_name, request.file_contents())
            .await
            .map_err(|e| {
                tracing::error!("Failed to write {file_name}: {e}");
                fail(SagaStage::SubmissionFile, e)
            })?;

        let fragment = index::link_fragment(self.config.link_base(), &file_name);
        let index = index::link_into_index(
            &self.repository,
            &target,
            self.config.index_file(),
            &fragment,
            self.config.index_attempts(),
        )
        .await
        .map_err(|e| {
            tracing::warn!(
                "{file_name} was written but {} does not link it yet: {e}",
                self.config.index_file()
            );
            fail(SagaStage::Index, e)
        })?;

        match index {
            IndexUpdate::AlreadyLinked => {
                tracing::info!("Index file already has link to {file_name}")
            }
            _ => tracing::info!("Created/Updated index with link to {file_name}"),
        }

        Ok(Ingested { file_name, index })
    }

    async fn write_submission(
        &self,
        target: &RepoTarget,
        file_name: &str,
        contents: String,
    ) -> crate::Result<()> {
        let revision = match self.repository.fetch(target, file_name).await {
            Lookup::Found(existing) => {
                tracing::info!("File {file_name} already exists, updating it");
                existing.revision
            }
            Lookup::NotFound => None,
            Lookup::Transient(e) => {
                tracing::warn!("Could not check whether {file_name} exists, creating it: {e}");
                None
            }
        };

        let file = RepositoryFile::new(file_name, contents).with_revision(revision);
        self.repository
            .put(target, &file, &format!("Add/Update {file_name}"))
            .await?;
        tracing::info!("File {file_name} created/updated");
        Ok(())
    }

    /// Reply for a body that could not be read at all (too large, broken
    /// stream).
    pub fn reject_unreadable(&self, reason: impl Into<String>) -> SubmissionResponse {
        SubmissionResponse::failed(&self.reject_body(IngestError::InvalidRequest(reason.into())))
    }

    // A configuration fault outranks an unreadable body.
    fn reject_body(&self, error: IngestError) -> IngestFailure {
        match self.config.target() {
            Err(config) => {
                tracing::error!("{config}");
                IngestFailure::preflight(config)
            }
            Ok(_) => {
                tracing::error!("Rejected submission: {error}");
                IngestFailure::preflight(error)
            }
        }
    }
}
