//! Setup file parsing.
//!
//! `setup_github.txt` holds six values, one per line, in a fixed order.
//! Blank lines are skipped and surrounding whitespace is trimmed; anything
//! past the sixth value is ignored.

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::types::SecretItem;
use crate::error::ConfigError;

/// Values read from the setup file.
pub struct Configuration {
    pub stream_key: Zeroizing<String>,
    pub video_url: String,
    pub quality: String,
    pub aspect_ratio: String,
    pub access_token: Zeroizing<String>,
    pub repository_name: String,
}

impl Configuration {
    /// Parse the setup file contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TooFewLines` when fewer than six non-blank lines are present.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        debug!(lines = lines.len(), "parsing setup file");

        if lines.len() < constants::SETUP_LINES {
            return Err(ConfigError::TooFewLines { found: lines.len() });
        }

        Ok(Self {
            stream_key: Zeroizing::new(lines[0].to_string()),
            video_url: lines[1].to_string(),
            quality: lines[2].to_string(),
            aspect_ratio: lines[3].to_string(),
            access_token: Zeroizing::new(lines[4].to_string()),
            repository_name: lines[5].to_string(),
        })
    }

    /// The four repository secrets, in `SECRET_NAMES` order.
    pub fn secrets(&self) -> Vec<SecretItem> {
        let [key, url, quality, aspect] = constants::SECRET_NAMES;
        vec![
            SecretItem {
                name: key,
                value: self.stream_key.clone(),
            },
            SecretItem {
                name: url,
                value: Zeroizing::new(self.video_url.clone()),
            },
            SecretItem {
                name: quality,
                value: Zeroizing::new(self.quality.clone()),
            },
            SecretItem {
                name: aspect,
                value: Zeroizing::new(self.aspect_ratio.clone()),
            },
        ]
    }
}

/// Mask a credential for display: first 8 and last 4 characters.
///
/// Values too short to keep anything hidden are fully masked.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 12 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
