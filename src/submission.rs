//! The [`SubmissionRequest`] payload and the naming and content rules that
//! map it onto a repository file.

use serde::{Deserialize, Deserializer};

use crate::error::{IngestError, Result};

/// Separator between a handle and its discriminator (`alice#1234`).
const DISCRIMINATOR_SEPARATOR: char = '#';

pub(crate) const MISSING_PARAMS_MESSAGE: &str =
    r#"Missing required params, make sure you specify "discord", "name" and "html""#;

/// A contest submission as posted by the participant.
///
/// Absent and `null` JSON fields deserialize as empty strings and are
/// rejected by [`validate`](Self::validate).
///
/// # Example
///
/// ```
/// use submission_ingestor::SubmissionRequest;
///
/// let req = SubmissionRequest::new("alice#1234", "Alice", "<b>hi</b>");
///
/// assert_eq!(req.file_name(), "alice1234.html");
/// assert_eq!(req.file_contents(), "<!--Name: Alice--><b>hi</b>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubmissionRequest {
    /// Contact handle, possibly carrying a `#1234` discriminator.
    #[serde(deserialize_with = "null_as_empty")]
    pub discord: String,
    /// Display name of the participant.
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    /// The submitted HTML snippet.
    #[serde(deserialize_with = "null_as_empty")]
    pub html: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SubmissionRequest {
    pub fn new(
        discord: impl Into<String>,
        name: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            discord: discord.into(),
            name: name.into(),
            html: html.into(),
        }
    }

    /// Parse a raw request body. An empty body is read as `{}`.
    pub fn from_body(body: impl AsRef<[u8]>) -> Result<Self> {
        let body = std::str::from_utf8(body.as_ref()).map_err(|e| {
            IngestError::InvalidRequest(format!("Request body is not valid UTF-8: {e}"))
        })?;
        let body = if body.trim().is_empty() { "{}" } else { body };
        serde_json::from_str(body).map_err(|e| {
            IngestError::InvalidRequest(format!("Request body is not valid JSON: {e}"))
        })
    }

    /// Reject requests where any of the three fields is empty.
    pub fn validate(&self) -> Result<()> {
        if self.discord.is_empty() || self.name.is_empty() || self.html.is_empty() {
            return Err(IngestError::InvalidRequest(MISSING_PARAMS_MESSAGE.into()));
        }
        Ok(())
    }

    /// Repository path for this submission: the handle without its
    /// discriminator separator, plus `.html`.
    ///
    /// Two submissions from the same handle map to the same file.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .discord
            .chars()
            .filter(|c| *c != DISCRIMINATOR_SEPARATOR)
            .collect();
        format!("{stem}.html")
    }

    /// Stored file body: the HTML prefixed with a comment holding the
    /// display name. Neither part is escaped.
    pub fn file_contents(&self) -> String {
        format!("<!--Name: {}-->{}", self.name, self.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_strips_discriminator_separator() {
        let req = SubmissionRequest::new("alice#1234", "Alice", "<b>hi</b>");
        assert_eq!(req.file_name(), "alice1234.html");
    }

    #[test]
    fn file_name_without_discriminator() {
        let req = SubmissionRequest::new("bob", "Bob", "<i>x</i>");
        assert_eq!(req.file_name(), "bob.html");
    }

    #[test]
    fn file_name_strips_every_separator() {
        let req = SubmissionRequest::new("a#b#c", "n", "h");
        assert_eq!(req.file_name(), "abc.html");
    }

    #[test]
    fn contents_embed_name_verbatim() {
        let req = SubmissionRequest::new("x", "<script>--> Eve", "<p>body</p>");
        assert_eq!(req.file_contents(), "<!--Name: <script>--> Eve--><p>body</p>");
    }

    #[test]
    fn parse_full_body() {
        let req =
            SubmissionRequest::from_body(r#"{"discord":"a#1","name":"A","html":"<p/>"}"#).unwrap();
        assert_eq!(req, SubmissionRequest::new("a#1", "A", "<p/>"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let req = SubmissionRequest::from_body("").unwrap();
        assert_eq!(req, SubmissionRequest::default());
        assert!(matches!(req.validate(), Err(IngestError::InvalidRequest(_))));
    }

    #[test]
    fn missing_field_fails_validation() {
        let req = SubmissionRequest::from_body(r#"{"name":"A","html":"<p/>"}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), MISSING_PARAMS_MESSAGE);
    }

    #[test]
    fn empty_handle_fails_validation() {
        let req = SubmissionRequest::new("", "A", "<p/>");
        assert!(req.validate().is_err());
    }

    #[test]
    fn null_field_counts_as_missing() {
        let req =
            SubmissionRequest::from_body(r#"{"discord":null,"name":"A","html":"<p/>"}"#).unwrap();
        assert_eq!(req.discord, "");
        assert_eq!(req.validate().unwrap_err().to_string(), MISSING_PARAMS_MESSAGE);
    }

    #[test]
    fn non_utf8_body_is_invalid_request() {
        let err = SubmissionRequest::from_body(b"\xff\xfe").unwrap_err();
        assert!(err.to_string().starts_with("Request body is not valid UTF-8"));
    }

    #[test]
    fn malformed_json_is_invalid_request() {
        let err = SubmissionRequest::from_body("{not json").unwrap_err();
        assert!(matches!(err, IngestError::InvalidRequest(_)));
    }
}
