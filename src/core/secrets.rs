//! Ways of writing repository secrets.
//!
//! A [`SecretChannel`] is prepared once per run and then asked to store
//! each secret. The orchestrator tries channels in the order
//! [`channel_order`] gives; a channel that fails to prepare is skipped,
//! and any secret a channel could not store is offered to the next one.

use tracing::debug;

use crate::core::constants::CLI_TIMEOUT;
use crate::core::github::{HostingApi, RepoPublicKey, SealedSecret};
use crate::core::seal;
use crate::core::settings::SecretMethod;
use crate::core::tools::{Invocation, ToolRunner};
use crate::core::types::{truncate, RepoRef, SecretItem};
use crate::error::SecretError;

/// A way of storing Actions secrets for one repository.
pub trait SecretChannel {
    /// Short name for output, e.g. `api` or `gh`.
    fn label(&self) -> &'static str;

    /// Per-run setup. Failure hands every secret to the next channel.
    fn prepare(&mut self, repo: &RepoRef) -> Result<(), SecretError>;

    fn put(&self, repo: &RepoRef, item: &SecretItem) -> Result<(), SecretError>;
}

/// Channel kinds, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    SealedApi,
    GhCli,
}

/// Channel order for a secret method.
pub fn channel_order(method: SecretMethod) -> &'static [ChannelKind] {
    match method {
        SecretMethod::Auto => &[ChannelKind::SealedApi, ChannelKind::GhCli],
        SecretMethod::Api => &[ChannelKind::SealedApi],
        SecretMethod::Cli => &[ChannelKind::GhCli],
    }
}

/// Seals each value against the repository public key and PUTs it.
pub struct SealedApiChannel<'a> {
    api: &'a dyn HostingApi,
    encryption_available: bool,
    key: Option<RepoPublicKey>,
}

impl<'a> SealedApiChannel<'a> {
    pub fn new(api: &'a dyn HostingApi, encryption_available: bool) -> Self {
        Self {
            api,
            encryption_available,
            key: None,
        }
    }
}

impl SecretChannel for SealedApiChannel<'_> {
    fn label(&self) -> &'static str {
        "api"
    }

    fn prepare(&mut self, repo: &RepoRef) -> Result<(), SecretError> {
        if !self.encryption_available {
            return Err(SecretError::EncryptionUnavailable);
        }
        let key = self.api.secrets_public_key(repo)?;
        seal::decode_public_key(&key.key)?;
        debug!(key_id = %key.key_id, "fetched secrets public key");
        self.key = Some(key);
        Ok(())
    }

    fn put(&self, repo: &RepoRef, item: &SecretItem) -> Result<(), SecretError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| SecretError::PublicKey("channel not prepared".to_string()))?;
        let sealed = SealedSecret {
            encrypted_value: seal::seal_secret(&key.key, &item.value)?,
            key_id: key.key_id.clone(),
        };
        self.api.put_secret(repo, item.name, &sealed)
    }
}

/// Delegates to `gh secret set`, authenticated through `GH_TOKEN`.
pub struct GhCliChannel<'a> {
    runner: &'a dyn ToolRunner,
    token: &'a str,
}

impl<'a> GhCliChannel<'a> {
    pub fn new(runner: &'a dyn ToolRunner, token: &'a str) -> Self {
        Self { runner, token }
    }
}

impl SecretChannel for GhCliChannel<'_> {
    fn label(&self) -> &'static str {
        "gh"
    }

    fn prepare(&mut self, _repo: &RepoRef) -> Result<(), SecretError> {
        let output = self
            .runner
            .run(&Invocation::new("gh", &["--version"], CLI_TIMEOUT))
            .map_err(|e| SecretError::CliUnavailable(e.to_string()))?;
        if output.success {
            Ok(())
        } else {
            Err(SecretError::CliUnavailable(truncate(
                output.stderr.trim(),
                80,
            )))
        }
    }

    fn put(&self, repo: &RepoRef, item: &SecretItem) -> Result<(), SecretError> {
        let full_name = repo.full_name();
        // Value goes through stdin so it never shows up in the process list.
        let invocation = Invocation::new(
            "gh",
            &["secret", "set", item.name, "--repo", &full_name],
            CLI_TIMEOUT,
        )
        .env("GH_TOKEN", self.token)
        .stdin(&item.value);

        let output = self.runner.run(&invocation).map_err(|e| SecretError::Cli {
            name: item.name.to_string(),
            message: e.to_string(),
        })?;

        if output.success {
            Ok(())
        } else {
            Err(SecretError::Cli {
                name: item.name.to_string(),
                message: truncate(output.stderr.trim(), 80),
            })
        }
    }
}
