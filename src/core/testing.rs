//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::core::github::{
    Connector, CreateOutcome, FileWrite, HostingApi, NewRepository, RepoPublicKey, SealedSecret,
};
use crate::core::tools::{Invocation, ToolOutput, ToolRunner};
use crate::core::types::RepoRef;
use crate::error::{AuthError, DispatchError, Error, RepoError, SecretError, UploadError};

/// Scriptable [`HostingApi`] that records every call.
pub struct MockApi {
    identity_status: u16,
    exists: bool,
    lookup_fails: bool,
    create_status: u16,
    existing_files: HashMap<String, String>,
    failing_paths: HashSet<String>,
    rejected_branches: HashSet<String>,
    public_key: Option<String>,
    secret_status: u16,
    dispatch_branch: Option<String>,
    #[cfg(feature = "seal")]
    secret_key: crypto_box::SecretKey,
    calls: RefCell<Vec<&'static str>>,
    tokens: RefCell<Vec<String>>,
    files: RefCell<Vec<FileWrite>>,
    secrets: RefCell<Vec<(String, SealedSecret)>>,
    dispatches: RefCell<Vec<String>>,
}

impl MockApi {
    /// Valid token for `alice`, no repository yet, every write accepted.
    pub fn new() -> Self {
        #[cfg(feature = "seal")]
        let secret_key = crypto_box::SecretKey::generate(&mut crypto_box::aead::OsRng);
        #[cfg(feature = "seal")]
        let public_key = {
            use base64::{engine::general_purpose::STANDARD, Engine};
            STANDARD.encode(secret_key.public_key().as_bytes())
        };
        #[cfg(not(feature = "seal"))]
        let public_key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".to_string();

        Self {
            identity_status: 200,
            exists: false,
            lookup_fails: false,
            create_status: 201,
            existing_files: HashMap::new(),
            failing_paths: HashSet::new(),
            rejected_branches: HashSet::new(),
            public_key: Some(public_key),
            secret_status: 201,
            dispatch_branch: Some("main".to_string()),
            #[cfg(feature = "seal")]
            secret_key,
            calls: RefCell::new(Vec::new()),
            tokens: RefCell::new(Vec::new()),
            files: RefCell::new(Vec::new()),
            secrets: RefCell::new(Vec::new()),
            dispatches: RefCell::new(Vec::new()),
        }
    }

    pub fn with_identity_status(mut self, status: u16) -> Self {
        self.identity_status = status;
        self
    }

    pub fn existing_repo(mut self) -> Self {
        self.exists = true;
        self
    }

    /// Repository lookup fails at the transport level.
    pub fn failing_repo_lookup(mut self) -> Self {
        self.lookup_fails = true;
        self
    }

    pub fn with_create_status(mut self, status: u16) -> Self {
        self.create_status = status;
        self
    }

    pub fn with_file(mut self, path: &str, sha: &str) -> Self {
        self.existing_files.insert(path.to_string(), sha.to_string());
        self
    }

    pub fn failing_path(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn rejecting_branch(mut self, branch: &str) -> Self {
        self.rejected_branches.insert(branch.to_string());
        self
    }

    pub fn with_public_key(mut self, key: &str) -> Self {
        self.public_key = Some(key.to_string());
        self
    }

    pub fn without_public_key(mut self) -> Self {
        self.public_key = None;
        self
    }

    pub fn with_secret_status(mut self, status: u16) -> Self {
        self.secret_status = status;
        self
    }

    pub fn dispatch_on(mut self, branch: Option<&str>) -> Self {
        self.dispatch_branch = branch.map(str::to_string);
        self
    }

    #[cfg(feature = "seal")]
    pub fn secret_key(&self) -> &crypto_box::SecretKey {
        &self.secret_key
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.borrow().clone()
    }

    pub fn files(&self) -> Vec<FileWrite> {
        self.files.borrow().clone()
    }

    pub fn secrets(&self) -> Vec<(String, SealedSecret)> {
        self.secrets.borrow().clone()
    }

    pub fn dispatches(&self) -> Vec<String> {
        self.dispatches.borrow().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl HostingApi for MockApi {
    fn identity(&self) -> Result<String, AuthError> {
        self.record("identity");
        match self.identity_status {
            200 => Ok("alice".to_string()),
            status => Err(AuthError::Rejected { status }),
        }
    }

    fn repository_exists(&self, _repo: &RepoRef) -> Result<bool, RepoError> {
        self.record("repository_exists");
        if self.lookup_fails {
            return Err(RepoError::Request("connection reset".to_string()));
        }
        Ok(self.exists)
    }

    fn create_repository(&self, _new: &NewRepository) -> Result<CreateOutcome, RepoError> {
        self.record("create_repository");
        match self.create_status {
            201 => Ok(CreateOutcome::Created),
            422 => Ok(CreateOutcome::AlreadyExists),
            status => Err(RepoError::CreateFailed {
                status,
                message: "Resource not accessible by personal access token".to_string(),
            }),
        }
    }

    fn file_revision(&self, _repo: &RepoRef, path: &str) -> Result<Option<String>, UploadError> {
        self.record("file_revision");
        Ok(self.existing_files.get(path).cloned())
    }

    fn put_file(&self, _repo: &RepoRef, write: &FileWrite) -> Result<(), UploadError> {
        self.record("put_file");
        if self.failing_paths.contains(&write.path) || self.rejected_branches.contains(&write.branch)
        {
            return Err(UploadError::Rejected {
                path: write.path.clone(),
                status: 422,
                message: "rejected".to_string(),
            });
        }
        self.files.borrow_mut().push(write.clone());
        Ok(())
    }

    fn secrets_public_key(&self, _repo: &RepoRef) -> Result<RepoPublicKey, SecretError> {
        self.record("secrets_public_key");
        self.public_key
            .as_ref()
            .map(|key| RepoPublicKey {
                key_id: "kid-1".to_string(),
                key: key.clone(),
            })
            .ok_or_else(|| SecretError::PublicKey("status 403".to_string()))
    }

    fn put_secret(
        &self,
        _repo: &RepoRef,
        name: &str,
        sealed: &SealedSecret,
    ) -> Result<(), SecretError> {
        self.record("put_secret");
        match self.secret_status {
            201 | 204 => {
                self.secrets
                    .borrow_mut()
                    .push((name.to_string(), sealed.clone()));
                Ok(())
            }
            status => Err(SecretError::Rejected {
                name: name.to_string(),
                status,
            }),
        }
    }

    fn dispatch_workflow(
        &self,
        _repo: &RepoRef,
        _workflow_file: &str,
        git_ref: &str,
    ) -> Result<(), DispatchError> {
        self.record("dispatch_workflow");
        self.dispatches.borrow_mut().push(git_ref.to_string());
        if self.dispatch_branch.as_deref() == Some(git_ref) {
            Ok(())
        } else {
            Err(DispatchError::Rejected {
                git_ref: git_ref.to_string(),
                status: 422,
            })
        }
    }
}

impl Connector for MockApi {
    fn connect(&self, token: &str) -> Result<Box<dyn HostingApi + '_>, Error> {
        self.tokens.borrow_mut().push(token.to_string());
        Ok(Box::new(self))
    }
}

/// An invocation as seen by [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub stdin: Option<String>,
}

/// [`ToolRunner`] that answers from a script instead of spawning processes.
#[derive(Default)]
pub struct ScriptedRunner {
    missing: HashSet<String>,
    failing_secret_set: bool,
    runs: RefCell<Vec<RecordedRun>>,
}

impl ScriptedRunner {
    /// Every program present, every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `program` as not installed.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// `gh secret set` exits non-zero.
    pub fn failing_secret_set(mut self) -> Self {
        self.failing_secret_set = true;
        self
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.borrow().clone()
    }

    pub fn ran(&self, program: &str, first_arg: &str) -> usize {
        self.runs
            .borrow()
            .iter()
            .filter(|r| r.program == program && r.args.first().map(String::as_str) == Some(first_arg))
            .count()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation<'_>) -> std::io::Result<ToolOutput> {
        self.runs.borrow_mut().push(RecordedRun {
            program: invocation.program.to_string(),
            args: invocation.args.iter().map(|a| a.to_string()).collect(),
            envs: invocation
                .envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            stdin: invocation.stdin.map(str::to_string),
        });

        if self.missing.contains(invocation.program) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found on PATH", invocation.program),
            ));
        }

        if self.failing_secret_set && invocation.args.first() == Some(&"secret") {
            return Ok(ToolOutput {
                success: false,
                stdout: String::new(),
                stderr: "HTTP 403: Resource not accessible".to_string(),
            });
        }

        Ok(ToolOutput {
            success: true,
            stdout: format!("{} version 2.43.0\n", invocation.program),
            stderr: String::new(),
        })
    }
}
