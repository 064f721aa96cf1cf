//! Tool settings stored in `.streamhost.toml`.
//!
//! The file is optional. Every field has a default, and command-line flags
//! override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::core::constants;
use crate::error::{Error, Result};

/// How repository secrets are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretMethod {
    /// Sealed box through the REST API, `gh` CLI when that fails.
    #[default]
    Auto,
    /// Sealed box through the REST API only.
    Api,
    /// `gh secret set` only.
    Cli,
}

impl SecretMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Api => "api",
            Self::Cli => "cli",
        }
    }
}

impl FromStr for SecretMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "api" => Ok(Self::Api),
            "cli" => Ok(Self::Cli),
            other => Err(Error::Settings(format!(
                "unknown secret method: {}. Supported: auto, api, cli",
                other
            ))),
        }
    }
}

/// Settings for one setup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// REST endpoint, e.g. a GitHub Enterprise `https://host/api/v3`.
    pub api_url: String,
    /// Web origin for links. Derived from `api_url` when unset.
    pub web_url: Option<String>,
    /// Branches tried in order for uploads and workflow dispatch.
    pub branches: Vec<String>,
    /// Workflow file name under `.github/workflows/`.
    pub workflow_file: String,
    pub secret_method: SecretMethod,
    /// Treat a missing `git` as fatal.
    pub require_git: bool,
    /// Seconds to wait after creating a repository.
    pub settle_secs: u64,
    pub files: FileNames,
}

/// Local input file names, relative to the base directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileNames {
    pub setup: String,
    pub streamer: String,
    pub manifest: String,
    pub workflow_template: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            setup: constants::SETUP_FILE.to_string(),
            streamer: constants::STREAMER_FILE.to_string(),
            manifest: constants::MANIFEST_FILE.to_string(),
            workflow_template: constants::WORKFLOW_TEMPLATE.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: constants::GITHUB_API.to_string(),
            web_url: None,
            branches: constants::DEFAULT_BRANCHES
                .iter()
                .map(|b| b.to_string())
                .collect(),
            workflow_file: constants::WORKFLOW_FILE.to_string(),
            secret_method: SecretMethod::Auto,
            require_git: true,
            settle_secs: constants::DEFAULT_SETTLE_SECS,
            files: FileNames::default(),
        }
    }
}

impl Settings {
    /// Load `.streamhost.toml` from `dir`, or defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the file is malformed or fails validation.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(constants::SETTINGS_FILE);
        if !path.exists() {
            debug!("no settings file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading settings");
        let contents = std::fs::read_to_string(&path)?;
        let settings: Self = toml::from_str(&contents)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<()> {
        if self.branches.is_empty() {
            return Err(Error::Settings("branches must not be empty".to_string()));
        }
        if self.workflow_file.trim().is_empty() || self.workflow_file.contains('/') {
            return Err(Error::Settings(format!(
                "invalid workflow file name: {:?}",
                self.workflow_file
            )));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Settings(format!(
                "api_url must be an http(s) URL: {}",
                self.api_url
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    /// Web origin matching the API endpoint.
    ///
    /// `https://host/api/v3` maps to `https://host` and `https://api.host`
    /// to `https://host`. Anything else links to github.com.
    pub fn web_origin(&self) -> String {
        if let Some(web) = &self.web_url {
            return web.trim_end_matches('/').to_string();
        }
        let api = self.api_url.trim_end_matches('/');
        if let Some(base) = api.strip_suffix("/api/v3") {
            return base.to_string();
        }
        for scheme in ["https://", "http://"] {
            if let Some(host) = api.strip_prefix(scheme).and_then(|r| r.strip_prefix("api.")) {
                return format!("{}{}", scheme, host);
            }
        }
        constants::GITHUB_WEB.to_string()
    }

    /// Repository path of the workflow definition.
    pub fn workflow_path(&self) -> String {
        format!(".github/workflows/{}", self.workflow_file)
    }
}
