//! GitHub contents API backend (requires the `github` feature).

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::API_URL_VAR;
use crate::error::{IngestError, Result};
use crate::storage::{Lookup, RepoTarget, Repository, RepositoryFile, Revision};

const USER_AGENT: &str = concat!("submission-ingestor/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Repository backend that reads and writes files through
/// `GET`/`PUT /repos/{owner}/{repo}/contents/{path}`.
///
/// Content travels base64-encoded in both directions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use submission_ingestor::GithubContents;
///
/// let contents =
///     GithubContents::new("https://api.github.com", Duration::from_secs(10)).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GithubContents {
    client: Client,
    api_url: Url,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GithubContents {
    /// Create a backend with its own HTTP client.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Unreachable(Box::new(e)))?;
        Self::with_client(client, api_url)
    }

    /// Create a backend around an existing [`Client`].
    pub fn with_client(client: Client, api_url: &str) -> Result<Self> {
        let invalid = |reason: String| {
            tracing::error!("Invalid GitHub API URL {api_url:?}: {reason}");
            IngestError::InvalidConfig {
                setting: API_URL_VAR,
                reason,
            }
        };
        let parsed = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a base URL".into()));
        }
        Ok(Self {
            client,
            api_url: parsed,
        })
    }

    pub(crate) fn contents_url(&self, target: &RepoTarget, path: &str) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", target.owner.as_str(), target.name.as_str(), "contents"])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        target: &RepoTarget,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&target.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    async fn try_fetch(&self, target: &RepoTarget, path: &str) -> Result<Option<RepositoryFile>> {
        let url = self.contents_url(target, path);
        let response = self
            .request(reqwest::Method::GET, url, target)
            .send()
            .await
            .map_err(|e| IngestError::Unreachable(Box::new(e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(error_from_response(response, path, false).await);
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Decode(format!("{path}: {e}")))?;

        match body.encoding.as_deref() {
            None | Some("base64") => {}
            Some(other) => {
                return Err(IngestError::Decode(format!(
                    "{path}: unsupported content encoding {other:?}"
                )));
            }
        }

        Ok(Some(RepositoryFile {
            path: path.to_string(),
            content: decode_content(&body.content)
                .map_err(|e| IngestError::Decode(format!("{path}: {e}")))?,
            revision: Some(Revision::new(body.sha)),
        }))
    }
}

/// Decode the API's base64 payload, which is wrapped with newlines.
pub(crate) fn decode_content(encoded: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

async fn error_from_response(
    response: reqwest::Response,
    path: &str,
    creating: bool,
) -> IngestError {
    let status = response.status();
    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    if status == StatusCode::CONFLICT
        || (creating
            && status == StatusCode::UNPROCESSABLE_ENTITY
            && is_missing_sha(&message))
    {
        return IngestError::Conflict {
            path: path.to_string(),
            message,
        };
    }
    IngestError::Remote {
        status: status.as_u16(),
        message,
    }
}

/// The contents API answers a create over an existing file with
/// 422 `"sha" wasn't supplied.`
pub(crate) fn is_missing_sha(message: &str) -> bool {
    message.contains(r#""sha" wasn't supplied"#)
}

impl Repository for GithubContents {
    async fn fetch(&self, target: &RepoTarget, path: &str) -> Lookup {
        match self.try_fetch(target, path).await {
            Ok(Some(file)) => Lookup::Found(file),
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::Transient(e),
        }
    }

    async fn put(&self, target: &RepoTarget, file: &RepositoryFile, message: &str) -> Result<()> {
        let url = self.contents_url(target, &file.path);
        let body = PutBody {
            message,
            content: STANDARD.encode(&file.content),
            sha: file.revision.as_ref().map(Revision::as_str),
        };

        let response = self
            .request(reqwest::Method::PUT, url, target)
            .json(&body)
            .send()
            .await
            .map_err(|e| IngestError::Unreachable(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &file.path, file.revision.is_none()).await);
        }

        tracing::debug!(
            "Wrote {} bytes to {}/{}:{}",
            file.content.len(),
            target.owner,
            target.name,
            file.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_URL;

    fn target() -> RepoTarget {
        RepoTarget {
            owner: "acme".into(),
            name: "code-in-the-dark".into(),
            token: "t".into(),
        }
    }

    #[test]
    fn contents_url_layout() {
        let gh = GithubContents::with_client(Client::new(), DEFAULT_API_URL).unwrap();
        let url = gh.contents_url(&target(), "alice1234.html");
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/code-in-the-dark/contents/alice1234.html"
        );
    }

    #[test]
    fn contents_url_keeps_api_prefix_and_encodes() {
        let gh =
            GithubContents::with_client(Client::new(), "http://localhost:8080/api/v3/").unwrap();
        let url = gh.contents_url(&target(), "needs space.html");
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v3/repos/acme/code-in-the-dark/contents/needs%20space.html"
        );
    }

    #[test]
    fn rejects_non_base_api_url() {
        let err =
            GithubContents::with_client(Client::new(), "mailto:someone@example.com").unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidConfig {
                setting: API_URL_VAR,
                ..
            }
        ));
    }

    #[test]
    fn unparseable_api_url_is_invalid_not_missing() {
        let err = GithubContents::with_client(Client::new(), "not a url").unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration: GITHUB_API_URL"));
    }

    #[test]
    fn only_missing_sha_422_reads_as_existing_file() {
        assert!(is_missing_sha("Invalid request.\n\n\"sha\" wasn't supplied."));
        assert!(!is_missing_sha("path contains a malformed path component"));
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        let decoded = decode_content("PHA+PGEg\naHJlZj0i\nLyI+PC9h\nPjwvcD4=\n").unwrap();
        assert_eq!(decoded, b"<p><a href=\"/\"></a></p>");
    }

    #[test]
    fn put_body_omits_missing_sha() {
        let body = PutBody {
            message: "Add/Update a.html",
            content: STANDARD.encode("x"),
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Add/Update a.html", "content": "eA=="}));
    }
}
