//! GitHub REST operations used by the setup.
//!
//! [`HostingApi`] is the seam between the orchestrator and the network.
//! [`GitHubClient`] implements it over `reqwest::blocking`; tests provide
//! in-memory implementations.

mod client;

pub use client::{GitHubClient, GitHubConnector};

use crate::core::types::RepoRef;
use crate::error::{AuthError, DispatchError, Error, RepoError, SecretError, UploadError};

/// Parameters for `POST /user/repos`.
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    /// Create an initial commit so the default branch exists.
    pub auto_init: bool,
}

/// Result of a create call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The API reported a name clash; the repository is reused.
    AlreadyExists,
}

/// Body of a contents write.
#[derive(Debug, Clone)]
pub struct FileWrite {
    pub path: String,
    pub message: String,
    /// Base64 of the file contents.
    pub content: String,
    pub branch: String,
    /// Revision marker of the existing file, required to update in place.
    pub sha: Option<String>,
}

/// Repository public key for Actions secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPublicKey {
    pub key_id: String,
    /// Base64 X25519 public key.
    pub key: String,
}

/// A secret value sealed against a [`RepoPublicKey`].
#[derive(Debug, Clone)]
pub struct SealedSecret {
    pub encrypted_value: String,
    pub key_id: String,
}

/// Hosting provider operations. Each method is a single HTTP call.
pub trait HostingApi {
    /// Login of the account that owns the token (`GET /user`).
    fn identity(&self) -> Result<String, AuthError>;

    fn repository_exists(&self, repo: &RepoRef) -> Result<bool, RepoError>;

    fn create_repository(&self, new: &NewRepository) -> Result<CreateOutcome, RepoError>;

    /// Current revision marker of `path`, or `None` if the file does not exist.
    fn file_revision(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, UploadError>;

    fn put_file(&self, repo: &RepoRef, write: &FileWrite) -> Result<(), UploadError>;

    fn secrets_public_key(&self, repo: &RepoRef) -> Result<RepoPublicKey, SecretError>;

    fn put_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        sealed: &SealedSecret,
    ) -> Result<(), SecretError>;

    fn dispatch_workflow(
        &self,
        repo: &RepoRef,
        workflow_file: &str,
        git_ref: &str,
    ) -> Result<(), DispatchError>;
}

/// Builds an authenticated [`HostingApi`] once the token is known.
pub trait Connector {
    /// # Errors
    ///
    /// Returns `Error::Http` if the client cannot be constructed.
    fn connect(&self, token: &str) -> Result<Box<dyn HostingApi + '_>, Error>;
}

impl<T: HostingApi + ?Sized> HostingApi for &T {
    fn identity(&self) -> Result<String, AuthError> {
        (**self).identity()
    }

    fn repository_exists(&self, repo: &RepoRef) -> Result<bool, RepoError> {
        (**self).repository_exists(repo)
    }

    fn create_repository(&self, new: &NewRepository) -> Result<CreateOutcome, RepoError> {
        (**self).create_repository(new)
    }

    fn file_revision(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, UploadError> {
        (**self).file_revision(repo, path)
    }

    fn put_file(&self, repo: &RepoRef, write: &FileWrite) -> Result<(), UploadError> {
        (**self).put_file(repo, write)
    }

    fn secrets_public_key(&self, repo: &RepoRef) -> Result<RepoPublicKey, SecretError> {
        (**self).secrets_public_key(repo)
    }

    fn put_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        sealed: &SealedSecret,
    ) -> Result<(), SecretError> {
        (**self).put_secret(repo, name, sealed)
    }

    fn dispatch_workflow(
        &self,
        repo: &RepoRef,
        workflow_file: &str,
        git_ref: &str,
    ) -> Result<(), DispatchError> {
        (**self).dispatch_workflow(repo, workflow_file, git_ref)
    }
}
