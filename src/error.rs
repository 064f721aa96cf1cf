//! Error types for streamhost.
//!
//! Fatal setup failures (`Config`, `Auth`, `ToolMissing`, `Repo`) halt the
//! run and surface through [`Error`]. Upload, secret and dispatch errors
//! never do: the step that raised them records them and the run continues.

use thiserror::Error;

/// Top-level error returned by setup operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    ToolMissing(#[from] ToolMissingError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("http client error: {0}")]
    Http(String),

    /// A repository or secret operation was attempted before the token was verified.
    #[error("not authenticated: token has not been verified")]
    NotAuthenticated,

    /// A step needed a value an earlier step should have produced.
    #[error("step ran before {0} was available")]
    OutOfOrder(&'static str),

    #[error("cancelled by user")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local configuration problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} required file(s) missing: {}", .0.len(), .0.join(", "))]
    MissingFiles(Vec<String>),

    #[error("setup file needs 6 non-blank lines, found {found}")]
    TooFewLines { found: usize },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Token verification failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid token (status {status})")]
    Rejected { status: u16 },

    #[error("token verification request failed: {0}")]
    Request(String),

    #[error("unexpected identity response: {0}")]
    Malformed(String),
}

/// A required local tool could not be run.
#[derive(Error, Debug)]
#[error("{tool} is not installed: {reason}")]
pub struct ToolMissingError {
    pub tool: String,
    pub reason: String,
}

/// Repository lookup or creation failures.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("failed to create repository (status {status}): {message}")]
    CreateFailed { status: u16, message: String },

    #[error("repository request failed: {0}")]
    Request(String),
}

/// Per-file upload failures.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("upload of {path} rejected (status {status}): {message}")]
    Rejected {
        path: String,
        status: u16,
        message: String,
    },

    #[error("upload request failed: {0}")]
    Request(String),
}

/// Per-secret failures.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("could not fetch repository public key: {0}")]
    PublicKey(String),

    #[error("invalid repository public key: {0}")]
    InvalidPublicKey(String),

    #[error("sealed-box encryption is not compiled in (rebuild with --features seal)")]
    EncryptionUnavailable,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("secret {name} rejected (status {status})")]
    Rejected { name: String, status: u16 },

    #[error("gh secret set {name} failed: {message}")]
    Cli { name: String, message: String },

    #[error("gh CLI unavailable: {0}")]
    CliUnavailable(String),

    #[error("secret request failed: {0}")]
    Request(String),
}

/// Workflow dispatch failures. Informational only.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("dispatch on {git_ref} rejected (status {status})")]
    Rejected { git_ref: String, status: u16 },

    #[error("dispatch request failed: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, Error>;

