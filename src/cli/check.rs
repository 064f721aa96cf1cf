//! Check command.
//!
//! Validates the bundle directory offline: required files are present and
//! the setup file parses. Secrets are shown masked.

use std::path::Path;

use crate::cli::output;
use crate::core::bundle::Bundle;
use crate::core::config::{mask, Configuration};
use crate::core::seal;
use crate::core::settings::Settings;
use crate::core::types::truncate;
use crate::error::{ConfigError, Result};

const URL_PREVIEW: usize = 50;

/// Validate the bundle in `dir` without any network access.
pub fn execute(dir: &Path) -> Result<()> {
    let settings = Settings::load(dir)?;
    settings.validate()?;
    let bundle = Bundle::new(dir, &settings);

    output::section("Files");
    let missing = bundle.missing();
    for (name, _) in bundle.required() {
        output::item(name, !missing.iter().any(|m| m == name));
    }
    if !missing.is_empty() {
        return Err(ConfigError::MissingFiles(missing).into());
    }

    let config = Configuration::parse(&bundle.setup_text()?)?;

    output::section("Configuration");
    output::kv("stream key: ", mask(&config.stream_key));
    output::kv("video url:  ", truncate(&config.video_url, URL_PREVIEW));
    output::kv("quality:    ", &config.quality);
    output::kv("aspect:     ", &config.aspect_ratio);
    output::kv("token:      ", mask(&config.access_token));
    output::kv("repository: ", &config.repository_name);

    output::section("Settings");
    output::kv("api:        ", &settings.api_url);
    output::kv("branches:   ", settings.branches.join(", "));
    output::kv("workflow:   ", settings.workflow_path());
    output::kv("secrets via:", settings.secret_method.as_str());
    output::kv(
        "sealing:    ",
        if seal::AVAILABLE { "built in" } else { "gh CLI only" },
    );

    println!();
    output::success("ready for setup");
    Ok(())
}
