//! Maintenance of the index page that links every submission.
//!
//! The index is append-only and never holds the same link fragment twice.
//! Writes race with other submissions, so each update is a
//! compare-and-swap: read with revision, append, write at that revision, and
//! start over when the remote reports a conflict.

use crate::error::Result;
use crate::storage::{Lookup, RepoTarget, Repository, RepositoryFile};

pub const INDEX_COMMIT_MESSAGE: &str = "Update index file";

/// What happened to the index during one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexUpdate {
    /// The index did not exist and was created with the new link.
    Created,
    /// The link was appended to the existing index.
    Appended,
    /// The index already held the link; nothing was written.
    AlreadyLinked,
}

/// Markup that links `file_name` from the index.
///
/// The output is deterministic: the containment check relies on an exact
/// string match.
pub fn link_fragment(base_path: &str, file_name: &str) -> String {
    format!("<p><a href=\"{base_path}/{file_name}\">{file_name}</a></p>\n")
}

/// New index content for `current`, or `None` when the fragment is already
/// present.
pub fn append_link(current: Option<&str>, fragment: &str) -> Option<(String, IndexUpdate)> {
    match current {
        Some(text) if text.contains(fragment) => None,
        Some(text) => Some((format!("{text}{fragment}"), IndexUpdate::Appended)),
        None => Some((fragment.to_string(), IndexUpdate::Created)),
    }
}

/// Ensure the index at `index_path` contains `fragment`, retrying on
/// revision conflicts up to `max_attempts` times.
pub(crate) async fn link_into_index<R: Repository>(
    repository: &R,
    target: &RepoTarget,
    index_path: &str,
    fragment: &str,
    max_attempts: usize,
) -> Result<IndexUpdate> {
    let mut attempt = 1;
    loop {
        match try_link(repository, target, index_path, fragment).await {
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                tracing::warn!("Index update attempt {attempt}/{max_attempts} conflicted: {e}");
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

async fn try_link<R: Repository>(
    repository: &R,
    target: &RepoTarget,
    index_path: &str,
    fragment: &str,
) -> Result<IndexUpdate> {
    let existing = match repository.fetch(target, index_path).await {
        Lookup::Found(file) => Some(file),
        Lookup::NotFound => None,
        Lookup::Transient(e) => {
            // A revision-less write fails if the index does exist, which
            // lands back here as a conflict.
            tracing::warn!("Could not read {index_path}, treating it as absent: {e}");
            None
        }
    };

    let current = existing.as_ref().map(RepositoryFile::text).transpose()?;
    let Some((content, update)) = append_link(current, fragment) else {
        tracing::info!("{index_path} already links {}", fragment.trim_end());
        return Ok(IndexUpdate::AlreadyLinked);
    };

    let revision = existing.and_then(|file| file.revision);
    let file = RepositoryFile::new(index_path, content).with_revision(revision);
    repository.put(target, &file, INDEX_COMMIT_MESSAGE).await?;
    Ok(update)
}
