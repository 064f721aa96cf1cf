//! Blocking GitHub REST client.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{
    Connector, CreateOutcome, FileWrite, HostingApi, NewRepository, RepoPublicKey, SealedSecret,
};
use crate::core::constants::{self, HEAVY_TIMEOUT, LIGHT_TIMEOUT};
use crate::core::types::{truncate, RepoRef};
use crate::error::{AuthError, DispatchError, Error, RepoError, SecretError, UploadError};

const API_VERSION: &str = "2022-11-28";

/// GitHub REST client authenticated with a personal access token.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Zeroizing<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: Option<String>,
}

#[derive(Deserialize)]
struct PublicKeyResponse {
    key_id: String,
    key: String,
}

impl GitHubClient {
    /// Build a client for `api_url` (no trailing slash needed).
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the underlying HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!("streamhost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token.to_string()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn repo_endpoint(&self, repo: &RepoRef, rest: &str) -> String {
        if rest.is_empty() {
            self.endpoint(&format!("repos/{}/{}", repo.owner, repo.name))
        } else {
            self.endpoint(&format!("repos/{}/{}/{}", repo.owner, repo.name, rest))
        }
    }

    fn request(&self, method: Method, url: String, timeout: Duration) -> RequestBuilder {
        trace!(method = method.as_str(), url = url.as_str(), "github request");
        self.client
            .request(method, url)
            .timeout(timeout)
            .bearer_auth(self.token.as_str())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

/// Connects [`GitHubClient`]s to a fixed API endpoint.
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    api_url: String,
}

impl GitHubConnector {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }
}

impl Connector for GitHubConnector {
    fn connect(&self, token: &str) -> Result<Box<dyn HostingApi + '_>, Error> {
        Ok(Box::new(GitHubClient::new(&self.api_url, token)?))
    }
}

/// Response body cut down for error messages.
fn body_preview(response: Response) -> String {
    let text = response.text().unwrap_or_default();
    truncate(text.trim(), constants::BODY_PREVIEW)
}

impl HostingApi for GitHubClient {
    fn identity(&self) -> Result<String, AuthError> {
        let response = self
            .request(Method::GET, self.endpoint("user"), LIGHT_TIMEOUT)
            .send()
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "identity lookup");
        if status != StatusCode::OK {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let user: UserResponse = response
            .json()
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(user.login)
    }

    fn repository_exists(&self, repo: &RepoRef) -> Result<bool, RepoError> {
        let response = self
            .request(Method::GET, self.repo_endpoint(repo, ""), LIGHT_TIMEOUT)
            .send()
            .map_err(|e| RepoError::Request(e.to_string()))?;

        debug!(repo = %repo, status = response.status().as_u16(), "repository lookup");
        Ok(response.status() == StatusCode::OK)
    }

    fn create_repository(&self, new: &NewRepository) -> Result<CreateOutcome, RepoError> {
        let body = json!({
            "name": new.name,
            "description": new.description,
            "private": new.private,
            "auto_init": new.auto_init,
        });

        let response = self
            .request(Method::POST, self.endpoint("user/repos"), HEAVY_TIMEOUT)
            .json(&body)
            .send()
            .map_err(|e| RepoError::Request(e.to_string()))?;

        let status = response.status();
        debug!(name = %new.name, status = status.as_u16(), "create repository");
        match status {
            StatusCode::CREATED => Ok(CreateOutcome::Created),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let message = body_preview(response);
                if message.contains("already exists") {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(RepoError::CreateFailed {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
            _ => Err(RepoError::CreateFailed {
                status: status.as_u16(),
                message: body_preview(response),
            }),
        }
    }

    fn file_revision(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, UploadError> {
        let url = self.repo_endpoint(repo, &format!("contents/{}", path));
        let response = self
            .request(Method::GET, url, LIGHT_TIMEOUT)
            .send()
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = response.status();
        trace!(path, status = status.as_u16(), "revision lookup");
        match status {
            StatusCode::OK => {
                let content: ContentResponse = response
                    .json()
                    .map_err(|e| UploadError::Request(format!("bad contents response: {}", e)))?;
                Ok(content.sha)
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(UploadError::Rejected {
                path: path.to_string(),
                status: status.as_u16(),
                message: body_preview(response),
            }),
        }
    }

    fn put_file(&self, repo: &RepoRef, write: &FileWrite) -> Result<(), UploadError> {
        let mut body = json!({
            "message": write.message,
            "content": write.content,
            "branch": write.branch,
        });
        if let Some(sha) = &write.sha {
            body["sha"] = json!(sha);
        }

        let url = self.repo_endpoint(repo, &format!("contents/{}", write.path));
        let response = self
            .request(Method::PUT, url, HEAVY_TIMEOUT)
            .json(&body)
            .send()
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = response.status();
        debug!(
            path = %write.path,
            branch = %write.branch,
            update = write.sha.is_some(),
            status = status.as_u16(),
            "put file"
        );
        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(UploadError::Rejected {
                path: write.path.clone(),
                status: status.as_u16(),
                message: body_preview(response),
            })
        }
    }

    fn secrets_public_key(&self, repo: &RepoRef) -> Result<RepoPublicKey, SecretError> {
        let url = self.repo_endpoint(repo, "actions/secrets/public-key");
        let response = self
            .request(Method::GET, url, LIGHT_TIMEOUT)
            .send()
            .map_err(|e| SecretError::PublicKey(e.to_string()))?;

        let status = response.status();
        debug!(repo = %repo, status = status.as_u16(), "secrets public key");
        if status != StatusCode::OK {
            return Err(SecretError::PublicKey(format!("status {}", status.as_u16())));
        }

        let key: PublicKeyResponse = response
            .json()
            .map_err(|e| SecretError::PublicKey(format!("bad public key response: {}", e)))?;
        Ok(RepoPublicKey {
            key_id: key.key_id,
            key: key.key,
        })
    }

    fn put_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        sealed: &SealedSecret,
    ) -> Result<(), SecretError> {
        let body = json!({
            "encrypted_value": sealed.encrypted_value,
            "key_id": sealed.key_id,
        });

        let url = self.repo_endpoint(repo, &format!("actions/secrets/{}", name));
        let response = self
            .request(Method::PUT, url, LIGHT_TIMEOUT)
            .json(&body)
            .send()
            .map_err(|e| SecretError::Request(e.to_string()))?;

        let status = response.status();
        debug!(name, status = status.as_u16(), "put secret");
        match status {
            StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(SecretError::Rejected {
                name: name.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    fn dispatch_workflow(
        &self,
        repo: &RepoRef,
        workflow_file: &str,
        git_ref: &str,
    ) -> Result<(), DispatchError> {
        let url = self.repo_endpoint(
            repo,
            &format!("actions/workflows/{}/dispatches", workflow_file),
        );
        let response = self
            .request(Method::POST, url, LIGHT_TIMEOUT)
            .json(&json!({ "ref": git_ref }))
            .send()
            .map_err(|e| DispatchError::Request(e.to_string()))?;

        let status = response.status();
        debug!(workflow_file, git_ref, status = status.as_u16(), "dispatch workflow");
        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(DispatchError::Rejected {
                git_ref: git_ref.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
