//! Constants used throughout streamhost.
//!
//! Centralizes file names, secret names and API defaults.

use std::time::Duration;

/// Six-line setup file (stream key, video URL, quality, aspect ratio, token, repo).
pub const SETUP_FILE: &str = "setup_github.txt";

/// Streamer script uploaded to the repository root.
pub const STREAMER_FILE: &str = "streamer.py";

/// Dependency manifest uploaded next to the streamer script.
pub const MANIFEST_FILE: &str = "requirements.txt";

/// Local workflow template, copied verbatim into `.github/workflows/`.
pub const WORKFLOW_TEMPLATE: &str = ".githubworkflowsyoutube-live.yml.txt";

/// Workflow file name inside the repository.
pub const WORKFLOW_FILE: &str = "youtube-live.yml";

/// Optional settings file in the base directory.
pub const SETTINGS_FILE: &str = ".streamhost.toml";

/// Number of values the setup file must provide.
pub const SETUP_LINES: usize = 6;

/// Default GitHub REST endpoint.
pub const GITHUB_API: &str = "https://api.github.com";

/// Default GitHub web origin, used for links in output and the README.
pub const GITHUB_WEB: &str = "https://github.com";

/// Where personal access tokens are created.
pub const TOKEN_PAGE: &str = "https://github.com/settings/tokens";

/// Where git can be downloaded.
pub const GIT_DOWNLOAD: &str = "https://git-scm.com/downloads";

/// Branch names tried in order for uploads and dispatch.
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

/// Description given to newly created repositories.
pub const REPO_DESCRIPTION: &str = "24/7 YouTube Live Stream - Powered by GitHub Actions";

/// Repository secrets set by the setup, in order.
pub const SECRET_NAMES: [&str; 4] = [
    "YOUTUBE_STREAM_KEY",
    "VIDEO_URL",
    "VIDEO_QUALITY",
    "ASPECT_RATIO",
];

/// Timeout for lookups and small writes.
pub const LIGHT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for repository creation and file uploads.
pub const HEAVY_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for `git --version`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for each `gh secret set`.
pub const CLI_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait after creating a repository before writing to it.
pub const DEFAULT_SETTLE_SECS: u64 = 3;

/// Error bodies are cut to this many characters in messages.
pub const BODY_PREVIEW: usize = 200;

/// Secret values are cut to this many characters in manual instructions.
pub const MANUAL_PREVIEW: usize = 30;
