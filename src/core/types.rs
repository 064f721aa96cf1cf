//! Domain types shared by the setup steps.

use std::fmt;

use zeroize::Zeroizing;

use crate::core::constants;

/// An `owner/name` repository coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    /// Web origin for links, e.g. `https://github.com`.
    pub web: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            web: constants::GITHUB_WEB.to_string(),
        }
    }

    /// Point links at another web origin, such as a GitHub Enterprise host.
    pub fn with_web(mut self, origin: impl Into<String>) -> Self {
        self.web = origin.into().trim_end_matches('/').to_string();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn html_url(&self) -> String {
        format!("{}/{}/{}", self.web, self.owner, self.name)
    }

    pub fn actions_url(&self) -> String {
        format!("{}/actions", self.html_url())
    }

    pub fn secrets_url(&self) -> String {
        format!("{}/settings/secrets/actions", self.html_url())
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Account resolved from a verified token. The token itself stays with the client.
#[derive(Debug)]
pub struct Session {
    pub username: String,
}

/// A file destined for the repository.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Path inside the repository.
    pub path: String,
    pub content: String,
    pub message: String,
}

impl UploadItem {
    pub fn new(path: impl Into<String>, content: impl Into<String>, message: &str) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            message: message.to_string(),
        }
    }
}

/// A repository secret and its plaintext value.
pub struct SecretItem {
    pub name: &'static str,
    pub value: Zeroizing<String>,
}

impl fmt::Debug for SecretItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretItem")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Outcome of one orchestration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub succeeded: bool,
    pub detail: String,
}

impl StepResult {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            detail: detail.into(),
        }
    }
}

/// Cut `text` to at most `max` characters, appending `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
