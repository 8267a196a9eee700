//! # submission_ingestor
//!
//! Accepts contest submissions (a handle, a display name and an HTML
//! snippet), stores each one as a file in a remote repository and links it
//! from the repository's index page.
//!
//! ## Overview
//!
//! A [`SubmissionIngestor`] runs one linear pipeline per request:
//!
//! 1. check that the repository is configured (`500` otherwise);
//! 2. check that the submission has all fields (soft failure otherwise);
//! 3. write `<handle>.html` through a [`Repository`] backend, updating it in
//!    place when it already exists;
//! 4. append a link to the index page unless it is already there.
//!
//! Replies are always `{"success": bool, "message": string}`. See
//! [`SubmissionResponse`] for the status mapping.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use submission_ingestor::{GithubContents, IngestorConfig, server};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestorConfig::new()
//!     .token("ghp_example")
//!     .owner("acme")
//!     .repository("submissions");
//! let contents = GithubContents::new(config.api_base_url(), config.timeout())?;
//! let app = server::router(Arc::new(config.build(contents)));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8888").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `github` | **yes** | Enables [`GithubContents`], the GitHub contents API backend. |
//! | `rustls-tls` | no | Use `rustls` for the GitHub client. |

pub mod config;
pub mod error;
pub mod index;
pub mod ingestor;
pub mod logging;
pub mod response;
pub mod server;
pub mod storage;
pub mod submission;

pub use config::IngestorConfig;
pub use error::{IngestError, Result};
pub use index::{IndexUpdate, link_fragment};
pub use ingestor::{IngestFailure, Ingested, SagaStage, SubmissionIngestor};
pub use response::{ResponseBody, SubmissionResponse};
#[cfg(feature = "github")]
pub use storage::GithubContents;
pub use storage::{Lookup, RepoTarget, Repository, RepositoryFile, Revision};
pub use submission::SubmissionRequest;
