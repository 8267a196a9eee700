//! The remote repository seam.
//!
//! The ingestor talks to the remote store only through the [`Repository`]
//! trait. The crate ships with [`GithubContents`], a client for the GitHub
//! contents API (requires the `github` feature). Implement the trait to
//! target another store or to test without a network.

#[cfg(feature = "github")]
mod github;

#[cfg(feature = "github")]
pub use github::GithubContents;

use std::fmt;
use std::future::Future;

use crate::error::{IngestError, Result};

/// Coordinates and credential of the repository being written to.
///
/// Passed to every [`Repository`] call so transports stay free of
/// per-repository state.
#[derive(Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
    pub token: String,
}

impl fmt::Debug for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoTarget")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Opaque version token of a remote file (a blob SHA on GitHub).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file as read from, or about to be written to, the remote repository.
///
/// `revision` is `None` for a file that does not exist yet. Writing with
/// `Some(revision)` asks the remote to update the file at that version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub path: String,
    pub content: Vec<u8>,
    pub revision: Option<Revision>,
}

impl RepositoryFile {
    /// A file that will be created.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            revision: None,
        }
    }

    /// Attach the revision being overwritten.
    pub fn with_revision(mut self, revision: Option<Revision>) -> Self {
        self.revision = revision;
        self
    }

    /// Content as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.content)
            .map_err(|e| IngestError::Decode(format!("{} is not UTF-8: {e}", self.path)))
    }
}

/// Result of looking a file up.
///
/// Absence and failure are kept apart so the caller decides how a failed
/// lookup should be treated.
#[derive(Debug)]
pub enum Lookup {
    Found(RepositoryFile),
    NotFound,
    Transient(IngestError),
}

/// Trait for remote stores that hold the submission and index files.
///
/// Implementations must be `Send + Sync + 'static` so one instance can be
/// shared by every request the server handles.
///
/// # Implementing a custom backend
///
/// ```rust,no_run
/// use submission_ingestor::{Lookup, RepoTarget, Repository, RepositoryFile, Result};
///
/// struct NullRepository;
///
/// impl Repository for NullRepository {
///     async fn fetch(&self, _target: &RepoTarget, _path: &str) -> Lookup {
///         Lookup::NotFound
///     }
///
///     async fn put(
///         &self,
///         _target: &RepoTarget,
///         _file: &RepositoryFile,
///         _message: &str,
///     ) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Repository: Send + Sync + 'static {
    /// Look up `path`, returning its content and revision when it exists.
    fn fetch(&self, target: &RepoTarget, path: &str) -> impl Future<Output = Lookup> + Send;

    /// Create or update `file` with the commit `message`.
    ///
    /// A stale or missing revision must be reported as
    /// [`IngestError::Conflict`].
    fn put(
        &self,
        target: &RepoTarget,
        file: &RepositoryFile,
        message: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_debug_hides_token() {
        let target = RepoTarget {
            owner: "acme".into(),
            name: "submissions".into(),
            token: "ghp_secret".into(),
        };
        let printed = format!("{target:?}");
        assert!(printed.contains("acme"));
        assert!(!printed.contains("ghp_secret"));
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let file = RepositoryFile::new("index.html", vec![0xff, 0xfe]);
        assert!(matches!(file.text(), Err(IngestError::Decode(_))));
    }
}
