//! Configuration for the ingestor, built once at startup.

use std::time::Duration;

use crate::error::{IngestError, Result};
use crate::ingestor::SubmissionIngestor;
use crate::storage::{RepoTarget, Repository};

pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const REPO_VAR: &str = "GITHUB_REPO";
pub const OWNER_VAR: &str = "GITHUB_REPO_OWNER";
pub const SUBMISSIONS_PATH_VAR: &str = "SUBMISSIONS_PATH";
pub const API_URL_VAR: &str = "GITHUB_API_URL";
pub const INDEX_PATH_VAR: &str = "INDEX_PATH";
pub const INDEX_MAX_ATTEMPTS_VAR: &str = "INDEX_MAX_ATTEMPTS";
pub const MAX_BODY_BYTES_VAR: &str = "MAX_BODY_BYTES";

pub const DEFAULT_SUBMISSIONS_PATH: &str = "/submissions";
pub const DEFAULT_INDEX_PATH: &str = "index.html";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Settings for a [`SubmissionIngestor`].
///
/// The credential and repository coordinates are optional here so that a
/// misconfigured deployment still starts and answers every request with a
/// server-configuration error instead of crashing.
///
/// # Example
///
/// ```rust,no_run
/// use submission_ingestor::IngestorConfig;
///
/// let config = IngestorConfig::new()
///     .token("ghp_example")
///     .owner("acme")
///     .repository("code-in-the-dark-submissions")
///     .submissions_path("/cid/submissions")
///     .max_index_attempts(5);
/// ```
#[derive(Clone)]
pub struct IngestorConfig {
    token: Option<String>,
    owner: Option<String>,
    repository: Option<String>,
    submissions_path: String,
    index_path: String,
    api_url: String,
    max_index_attempts: usize,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl std::fmt::Debug for IngestorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestorConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("submissions_path", &self.submissions_path)
            .field("index_path", &self.index_path)
            .field("api_url", &self.api_url)
            .field("max_index_attempts", &self.max_index_attempts)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestorConfig {
    /// Create a config with no repository and sensible defaults.
    ///
    /// Defaults: submissions path `/submissions`, index `index.html`,
    /// GitHub's public API, 3 index write attempts, 10 s request timeout,
    /// 2 MiB request bodies.
    pub fn new() -> Self {
        Self {
            token: None,
            owner: None,
            repository: None,
            submissions_path: DEFAULT_SUBMISSIONS_PATH.to_string(),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            max_index_attempts: 3,
            request_timeout: Duration::from_secs(10),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::new();
        config.token = get(TOKEN_VAR);
        config.owner = get(OWNER_VAR);
        config.repository = get(REPO_VAR);
        if let Some(path) = get(SUBMISSIONS_PATH_VAR) {
            config.submissions_path = path;
        }
        if let Some(path) = get(INDEX_PATH_VAR) {
            config.index_path = path;
        }
        if let Some(url) = get(API_URL_VAR) {
            config.api_url = url;
        }
        match get(INDEX_MAX_ATTEMPTS_VAR).map(|v| v.parse::<usize>()) {
            Some(Ok(n)) if n > 0 => config.max_index_attempts = n,
            Some(_) => tracing::warn!(
                "Ignoring invalid {INDEX_MAX_ATTEMPTS_VAR}, keeping {}",
                config.max_index_attempts
            ),
            None => {}
        }
        match get(MAX_BODY_BYTES_VAR).map(|v| v.parse::<usize>()) {
            Some(Ok(n)) if n > 0 => config.max_body_bytes = n,
            Some(_) => tracing::warn!(
                "Ignoring invalid {MAX_BODY_BYTES_VAR}, keeping {}",
                config.max_body_bytes
            ),
            None => {}
        }
        config
    }

    /// Access token with write permission on the repository.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Owner (user or organisation) of the repository.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Name of the repository holding the submissions.
    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// URL path under which the repository's pages are served. Used as the
    /// href prefix of index links.
    pub fn submissions_path(mut self, path: impl Into<String>) -> Self {
        self.submissions_path = path.into();
        self
    }

    /// Repository path of the index page.
    pub fn index_path(mut self, path: impl Into<String>) -> Self {
        self.index_path = path.into();
        self
    }

    /// Base URL of the contents API.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// How many times an index write is attempted when it hits a revision
    /// conflict. Values below 1 are raised to 1.
    pub fn max_index_attempts(mut self, attempts: usize) -> Self {
        self.max_index_attempts = attempts.max(1);
        self
    }

    /// Timeout applied to each remote request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Largest request body the server reads.
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn link_base(&self) -> &str {
        self.submissions_path.trim_end_matches('/')
    }

    pub fn index_file(&self) -> &str {
        &self.index_path
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_url
    }

    pub fn index_attempts(&self) -> usize {
        self.max_index_attempts
    }

    pub fn timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn body_limit(&self) -> usize {
        self.max_body_bytes
    }

    /// The repository to write to, or the list of settings that are missing.
    pub fn target(&self) -> Result<RepoTarget> {
        let mut missing = Vec::new();
        if self.token.is_none() {
            missing.push(TOKEN_VAR);
        }
        if self.repository.is_none() {
            missing.push(REPO_VAR);
        }
        if self.owner.is_none() {
            missing.push(OWNER_VAR);
        }
        match (&self.token, &self.owner, &self.repository) {
            (Some(token), Some(owner), Some(name)) => Ok(RepoTarget {
                owner: owner.clone(),
                name: name.clone(),
                token: token.clone(),
            }),
            _ => Err(IngestError::Config { missing }),
        }
    }

    /// Consume the config and pair it with a repository backend.
    pub fn build<R: Repository>(self, repository: R) -> SubmissionIngestor<R> {
        SubmissionIngestor::new(self, repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = IngestorConfig::new();
        assert_eq!(config.link_base(), "/submissions");
        assert_eq!(config.index_file(), "index.html");
        assert_eq!(config.api_base_url(), "https://api.github.com");
        assert_eq!(config.index_attempts(), 3);
    }

    #[test]
    fn target_reports_all_missing_settings() {
        let err = IngestorConfig::new().owner("acme").target().unwrap_err();
        match err {
            IngestError::Config { missing } => assert_eq!(missing, vec![TOKEN_VAR, REPO_VAR]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn target_when_complete() {
        let target = IngestorConfig::new()
            .token("t")
            .owner("acme")
            .repository("subs")
            .target()
            .unwrap();
        assert_eq!(target.owner, "acme");
        assert_eq!(target.name, "subs");
        assert_eq!(target.token, "t");
    }

    #[test]
    fn lookup_reads_all_settings() {
        let config = IngestorConfig::from_lookup(lookup(&[
            (TOKEN_VAR, "t"),
            (REPO_VAR, "subs"),
            (OWNER_VAR, "acme"),
            (SUBMISSIONS_PATH_VAR, "/cid/"),
            (INDEX_PATH_VAR, "docs/index.html"),
            (API_URL_VAR, "http://localhost:9000"),
            (INDEX_MAX_ATTEMPTS_VAR, "7"),
            (MAX_BODY_BYTES_VAR, "4096"),
        ]));
        assert!(config.target().is_ok());
        assert_eq!(config.link_base(), "/cid");
        assert_eq!(config.index_file(), "docs/index.html");
        assert_eq!(config.api_base_url(), "http://localhost:9000");
        assert_eq!(config.index_attempts(), 7);
        assert_eq!(config.body_limit(), 4096);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = IngestorConfig::from_lookup(lookup(&[
            (TOKEN_VAR, ""),
            (REPO_VAR, "subs"),
            (OWNER_VAR, "acme"),
            (SUBMISSIONS_PATH_VAR, ""),
        ]));
        assert!(matches!(config.target(), Err(IngestError::Config { .. })));
        assert_eq!(config.link_base(), "/submissions");
    }

    #[test]
    fn invalid_attempts_keep_default() {
        let config = IngestorConfig::from_lookup(lookup(&[(INDEX_MAX_ATTEMPTS_VAR, "zero")]));
        assert_eq!(config.index_attempts(), 3);
        assert_eq!(IngestorConfig::new().max_index_attempts(0).index_attempts(), 1);
    }

    #[test]
    fn debug_redacts_token() {
        let printed = format!("{:?}", IngestorConfig::new().token("ghp_secret"));
        assert!(!printed.contains("ghp_secret"));
    }
}
