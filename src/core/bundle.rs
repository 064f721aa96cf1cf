//! Local input files and the upload set built from them.

use std::path::PathBuf;
use tracing::debug;

use crate::core::settings::Settings;
use crate::core::types::{RepoRef, UploadItem};
use crate::error::ConfigError;

/// The files a setup run reads from its base directory.
#[derive(Debug, Clone)]
pub struct Bundle {
    dir: PathBuf,
    setup: String,
    streamer: String,
    manifest: String,
    workflow_template: String,
    workflow_path: String,
}

/// Contents of the payload files, read once the bundle is validated.
#[derive(Debug, Clone)]
pub struct Payloads {
    pub streamer: String,
    pub manifest: String,
    pub workflow: String,
}

impl Bundle {
    pub fn new(dir: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            dir: dir.into(),
            setup: settings.files.setup.clone(),
            streamer: settings.files.streamer.clone(),
            manifest: settings.files.manifest.clone(),
            workflow_template: settings.files.workflow_template.clone(),
            workflow_path: settings.workflow_path(),
        }
    }

    /// Required files with a short description of each.
    pub fn required(&self) -> [(&str, &'static str); 4] {
        [
            (self.setup.as_str(), "setup configuration"),
            (self.streamer.as_str(), "streamer script"),
            (self.manifest.as_str(), "python dependencies"),
            (self.workflow_template.as_str(), "workflow template"),
        ]
    }

    /// Names of required files that do not exist.
    pub fn missing(&self) -> Vec<String> {
        self.required()
            .iter()
            .filter(|(name, _)| !self.dir.join(name).is_file())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Fail unless every required file is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFiles` listing the absent files.
    pub fn check(&self) -> Result<(), ConfigError> {
        let missing = self.missing();
        debug!(dir = %self.dir.display(), missing = missing.len(), "checked bundle");
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFiles(missing))
        }
    }

    pub fn setup_text(&self) -> Result<String, ConfigError> {
        self.read(&self.setup)
    }

    pub fn payloads(&self) -> Result<Payloads, ConfigError> {
        Ok(Payloads {
            streamer: self.read(&self.streamer)?,
            manifest: self.read(&self.manifest)?,
            workflow: self.read(&self.workflow_template)?,
        })
    }

    /// Files to upload: streamer, manifest, workflow and a generated README.
    pub fn upload_items(
        &self,
        payloads: &Payloads,
        repo: &RepoRef,
        quality: &str,
        aspect_ratio: &str,
    ) -> Vec<UploadItem> {
        vec![
            UploadItem::new(
                self.streamer.as_str(),
                payloads.streamer.as_str(),
                &format!("Add {}", self.streamer),
            ),
            UploadItem::new(
                self.manifest.as_str(),
                payloads.manifest.as_str(),
                &format!("Add {}", self.manifest),
            ),
            UploadItem::new(
                self.workflow_path.as_str(),
                payloads.workflow.as_str(),
                "Add workflow",
            ),
            UploadItem::new("README.md", readme(repo, quality, aspect_ratio), "Add README"),
        ]
    }

    fn read(&self, name: &str) -> Result<String, ConfigError> {
        let path = self.dir.join(name);
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

/// README for the provisioned repository.
pub fn readme(repo: &RepoRef, quality: &str, aspect_ratio: &str) -> String {
    format!(
        r#"# 24/7 YouTube Live Stream

## Features
- 24/7 live streaming on YouTube
- Runs on GitHub Actions
- Your PC can be off
- Auto-reconnects on errors
- Quality: {quality}

## Status
Stream is running automatically via GitHub Actions.

## Settings
- Quality: {quality}
- Aspect Ratio: {aspect_ratio}
- Auto-restart: Every 5 hours

## Links
- [Actions]({actions})
- [Secrets]({secrets})

---
*Powered by GitHub Actions*
"#,
        quality = quality,
        aspect_ratio = aspect_ratio,
        actions = repo.actions_url(),
        secrets = repo.secrets_url(),
    )
}
