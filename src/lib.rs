//! streamhost - provision a GitHub repository that restreams a video to
//! YouTube Live from GitHub Actions.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── setup         # Full provisioning run with progress output
//! │   ├── check         # Offline validation of the setup folder
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # setup_github.txt parsing
//!     ├── settings      # .streamhost.toml overrides
//!     ├── bundle        # Local payload files and the README
//!     ├── github/       # GitHub REST client
//!     ├── seal          # Sealed-box encryption of secret values
//!     ├── secrets       # Secret channels (REST API and gh CLI)
//!     ├── tools         # External program runner
//!     ├── upload        # Single file upload with branch fallback
//!     └── orchestrator  # Ordered steps, fatal and non-fatal
//! ```
//!
//! # Features
//!
//! - `seal` (default): encrypt secrets locally and write them through the
//!   REST API. Without it secrets go through `gh secret set`.

pub mod cli;
pub mod core;
pub mod error;
