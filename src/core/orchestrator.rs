//! The setup sequence.
//!
//! Steps are an ordered table of `(name, fatal, action)` executed by one
//! loop. A fatal step that fails ends the run with its error; a non-fatal
//! step that fails is recorded and the next step runs.
//!
//! | step            | fatal |
//! |-----------------|-------|
//! | check files     | yes   |
//! | read config     | yes   |
//! | verify token    | yes   |
//! | check git       | yes   |
//! | ensure repo     | yes   |
//! | upload files    | no    |
//! | set secrets     | no    |
//! | dispatch        | no    |

use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::bundle::{Bundle, Payloads};
use crate::core::config::Configuration;
use crate::core::constants::{self, PROBE_TIMEOUT};
use crate::core::github::{Connector, CreateOutcome, HostingApi, NewRepository};
use crate::core::secrets::{channel_order, ChannelKind, GhCliChannel, SealedApiChannel, SecretChannel};
use crate::core::settings::{SecretMethod, Settings};
use crate::core::tools::{Invocation, ToolRunner};
use crate::core::types::{truncate, RepoRef, SecretItem, Session, StepResult};
use crate::core::upload::upload_file;
use crate::error::{Error, Result, ToolMissingError};

/// Knobs that shape a run, fixed at construction.
#[derive(Debug, Clone)]
pub struct Options {
    pub branches: Vec<String>,
    pub workflow_file: String,
    pub secret_method: SecretMethod,
    pub require_git: bool,
    pub settle_delay: Duration,
    /// Web origin used for repository links.
    pub web_origin: String,
    /// Whether sealed-box encryption may be used for secrets.
    pub encryption_available: bool,
}

impl Options {
    pub fn from_settings(settings: &Settings, encryption_available: bool) -> Self {
        Self {
            branches: settings.branches.clone(),
            workflow_file: settings.workflow_file.clone(),
            secret_method: settings.secret_method,
            require_git: settings.require_git,
            settle_delay: settings.settle_delay(),
            web_origin: settings.web_origin(),
            encryption_available,
        }
    }
}

/// Done/total counter for per-item steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub done: usize,
    pub total: usize,
}

/// A secret that has to be added by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSecret {
    pub name: &'static str,
    /// Value cut to a short preview.
    pub preview: String,
}

/// One executed step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: &'static str,
    pub fatal: bool,
    pub result: StepResult,
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub steps: Vec<StepRecord>,
    pub repo: Option<RepoRef>,
    pub repo_created: bool,
    pub uploads: Tally,
    pub secrets: Tally,
    /// Label of the last channel that stored a secret.
    pub secret_channel: Option<&'static str>,
    pub manual_secrets: Vec<ManualSecret>,
    pub dispatched_on: Option<String>,
}

impl Report {
    /// True when every step, fatal or not, succeeded.
    pub fn fully_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.result.succeeded)
    }
}

/// Receives progress while a run executes.
pub trait Observer {
    fn step_started(&mut self, _name: &'static str) {}

    /// A single file or secret finished.
    fn item_finished(&mut self, _label: &str, _ok: bool) {}

    /// Informational message within a step.
    fn note(&mut self, _message: &str) {}

    fn step_finished(&mut self, _record: &StepRecord) {}
}

/// Observer that discards everything.
pub struct Silent;

impl Observer for Silent {}

/// Values threaded from step to step.
#[derive(Default)]
struct Run<'a> {
    payloads: Option<Payloads>,
    config: Option<Configuration>,
    api: Option<Box<dyn HostingApi + 'a>>,
    session: Option<Session>,
    repo: Option<RepoRef>,
    report: Report,
}

type Action<'a> = fn(&Orchestrator<'a>, &mut Run<'a>, &mut dyn Observer) -> Result<StepResult>;

struct Step<'a> {
    name: &'static str,
    fatal: bool,
    action: Action<'a>,
}

fn need<'r, T>(slot: &'r Option<T>, what: &'static str) -> Result<&'r T> {
    slot.as_ref().ok_or(Error::OutOfOrder(what))
}

/// Repository and secret operations require a verified session.
fn authenticated<'r, 'a>(
    api: &'r Option<Box<dyn HostingApi + 'a>>,
    session: &'r Option<Session>,
) -> Result<(&'r (dyn HostingApi + 'a), &'r Session)> {
    match (api.as_deref(), session.as_ref()) {
        (Some(api), Some(session)) => Ok((api, session)),
        _ => Err(Error::NotAuthenticated),
    }
}

/// Number of steps in a full run.
pub const STEP_COUNT: usize = 8;

/// Runs the setup sequence against a bundle directory.
pub struct Orchestrator<'a> {
    bundle: Bundle,
    connector: &'a dyn Connector,
    runner: &'a dyn ToolRunner,
    options: Options,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        bundle: Bundle,
        connector: &'a dyn Connector,
        runner: &'a dyn ToolRunner,
        options: Options,
    ) -> Self {
        Self {
            bundle,
            connector,
            runner,
            options,
        }
    }

    fn steps() -> [Step<'a>; STEP_COUNT] {
        [
            Step {
                name: "check files",
                fatal: true,
                action: Self::check_files,
            },
            Step {
                name: "read config",
                fatal: true,
                action: Self::read_config,
            },
            Step {
                name: "verify token",
                fatal: true,
                action: Self::verify_token,
            },
            Step {
                name: "check git",
                fatal: true,
                action: Self::check_git,
            },
            Step {
                name: "ensure repository",
                fatal: true,
                action: Self::ensure_repository,
            },
            Step {
                name: "upload files",
                fatal: false,
                action: Self::upload_files,
            },
            Step {
                name: "set secrets",
                fatal: false,
                action: Self::set_secrets,
            },
            Step {
                name: "dispatch workflow",
                fatal: false,
                action: Self::dispatch_workflow,
            },
        ]
    }

    /// Execute every step in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first fatal step that fails. Non-fatal
    /// failures are recorded in the report instead.
    pub fn run(&self, observer: &mut dyn Observer) -> Result<Report> {
        let mut run = Run::default();

        for step in Self::steps() {
            debug!(step = step.name, fatal = step.fatal, "starting step");
            observer.step_started(step.name);

            let result = match (step.action)(self, &mut run, observer) {
                Ok(result) => result,
                Err(e) if step.fatal => {
                    debug!(step = step.name, error = %e, "fatal step failed");
                    observer.step_finished(&StepRecord {
                        name: step.name,
                        fatal: true,
                        result: StepResult::failed(e.to_string()),
                    });
                    return Err(e);
                }
                Err(e) => {
                    warn!(step = step.name, error = %e, "step failed, continuing");
                    StepResult::failed(e.to_string())
                }
            };

            let record = StepRecord {
                name: step.name,
                fatal: step.fatal,
                result,
            };
            observer.step_finished(&record);
            run.report.steps.push(record);
        }

        Ok(run.report)
    }

    fn check_files(&self, run: &mut Run<'a>, _: &mut dyn Observer) -> Result<StepResult> {
        self.bundle.check()?;
        run.payloads = Some(self.bundle.payloads()?);
        Ok(StepResult::ok(format!(
            "all {} required files found",
            self.bundle.required().len()
        )))
    }

    fn read_config(&self, run: &mut Run<'a>, _: &mut dyn Observer) -> Result<StepResult> {
        let config = Configuration::parse(&self.bundle.setup_text()?)?;
        let detail = format!(
            "repository {}, {} at {}",
            config.repository_name, config.quality, config.aspect_ratio
        );
        run.config = Some(config);
        Ok(StepResult::ok(detail))
    }

    fn verify_token(&self, run: &mut Run<'a>, _: &mut dyn Observer) -> Result<StepResult> {
        let config = need(&run.config, "configuration")?;
        let connector: &'a dyn Connector = self.connector;
        let api = connector.connect(&config.access_token)?;

        let username = api.identity()?;
        debug!(username = %username, "token verified");

        let detail = format!("token valid for {}", username);
        run.api = Some(api);
        run.session = Some(Session { username });
        Ok(StepResult::ok(detail))
    }

    fn check_git(&self, _: &mut Run<'a>, _: &mut dyn Observer) -> Result<StepResult> {
        if !self.options.require_git {
            return Ok(StepResult::ok("skipped"));
        }

        let missing = |reason: String| ToolMissingError {
            tool: "git".to_string(),
            reason,
        };
        let output = self
            .runner
            .run(&Invocation::new("git", &["--version"], PROBE_TIMEOUT))
            .map_err(|e| missing(e.to_string()))?;
        if !output.success {
            return Err(missing(truncate(output.stderr.trim(), 80)).into());
        }
        Ok(StepResult::ok(output.stdout.trim().to_string()))
    }

    fn ensure_repository(&self, run: &mut Run<'a>, _: &mut dyn Observer) -> Result<StepResult> {
        let (api, session) = authenticated(&run.api, &run.session)?;
        let config = need(&run.config, "configuration")?;
        let repo = RepoRef::new(session.username.as_str(), config.repository_name.as_str())
            .with_web(self.options.web_origin.as_str());

        // Any non-200 status means "absent"; only a transport failure errors.
        let exists = api.repository_exists(&repo)?;

        let detail = if exists {
            "already exists, reusing".to_string()
        } else {
            let new = NewRepository {
                name: repo.name.clone(),
                description: constants::REPO_DESCRIPTION.to_string(),
                private: false,
                auto_init: true,
            };
            match api.create_repository(&new)? {
                CreateOutcome::Created => {
                    run.report.repo_created = true;
                    if !self.options.settle_delay.is_zero() {
                        debug!(delay = ?self.options.settle_delay, "waiting for new repository");
                        thread::sleep(self.options.settle_delay);
                    }
                    "created".to_string()
                }
                CreateOutcome::AlreadyExists => "already exists, reusing".to_string(),
            }
        };

        let detail = format!("{}: {}", repo, detail);
        run.report.repo = Some(repo.clone());
        run.repo = Some(repo);
        Ok(StepResult::ok(detail))
    }

    fn upload_files(&self, run: &mut Run<'a>, observer: &mut dyn Observer) -> Result<StepResult> {
        let (api, _) = authenticated(&run.api, &run.session)?;
        let repo = need(&run.repo, "repository")?;
        let config = need(&run.config, "configuration")?;
        let payloads = need(&run.payloads, "payloads")?;

        let items = self
            .bundle
            .upload_items(payloads, repo, &config.quality, &config.aspect_ratio);
        let mut tally = Tally {
            done: 0,
            total: items.len(),
        };

        for item in &items {
            match upload_file(api, repo, item, &self.options.branches) {
                Ok(branch) => {
                    debug!(path = %item.path, branch = %branch, "uploaded");
                    tally.done += 1;
                    observer.item_finished(&item.path, true);
                }
                Err(e) => {
                    warn!(path = %item.path, error = %e, "upload failed");
                    observer.item_finished(&item.path, false);
                }
            }
        }

        run.report.uploads = tally;
        let detail = format!("uploaded {}/{} files", tally.done, tally.total);
        Ok(if tally.done == tally.total {
            StepResult::ok(detail)
        } else {
            StepResult::failed(detail)
        })
    }

    fn channels<'c>(
        &self,
        api: &'c dyn HostingApi,
        token: &'c str,
    ) -> Vec<Box<dyn SecretChannel + 'c>>
    where
        'a: 'c,
    {
        channel_order(self.options.secret_method)
            .iter()
            .map(|kind| -> Box<dyn SecretChannel + 'c> {
                match kind {
                    ChannelKind::SealedApi => {
                        Box::new(SealedApiChannel::new(api, self.options.encryption_available))
                    }
                    ChannelKind::GhCli => Box::new(GhCliChannel::new(self.runner, token)),
                }
            })
            .collect()
    }

    fn set_secrets(&self, run: &mut Run<'a>, observer: &mut dyn Observer) -> Result<StepResult> {
        let (api, _) = authenticated(&run.api, &run.session)?;
        let repo = need(&run.repo, "repository")?;
        let config = need(&run.config, "configuration")?;

        let items = config.secrets();
        let total = items.len();
        let mut pending: Vec<&SecretItem> = items.iter().collect();
        let mut used = None;

        for mut channel in self.channels(api, &config.access_token) {
            if pending.is_empty() {
                break;
            }
            if let Err(e) = channel.prepare(repo) {
                debug!(channel = channel.label(), error = %e, "secret channel unavailable");
                observer.note(&format!("{} method unavailable: {}", channel.label(), e));
                continue;
            }

            let mut failed = Vec::new();
            for item in pending {
                match channel.put(repo, item) {
                    Ok(()) => {
                        used = Some(channel.label());
                        observer.item_finished(item.name, true);
                    }
                    Err(e) => {
                        warn!(secret = item.name, channel = channel.label(), error = %e, "secret not set");
                        observer.item_finished(item.name, false);
                        failed.push(item);
                    }
                }
            }
            pending = failed;
        }

        let done = total - pending.len();
        run.report.secrets = Tally { done, total };
        run.report.secret_channel = used;
        run.report.manual_secrets = pending
            .iter()
            .map(|item| ManualSecret {
                name: item.name,
                preview: truncate(&item.value, constants::MANUAL_PREVIEW),
            })
            .collect();

        let detail = match used {
            Some(label) => format!("set {}/{} secrets via {}", done, total, label),
            None => format!("set 0/{} secrets", total),
        };
        Ok(if pending.is_empty() {
            StepResult::ok(detail)
        } else {
            StepResult::failed(detail)
        })
    }

    fn dispatch_workflow(&self, run: &mut Run<'a>, observer: &mut dyn Observer) -> Result<StepResult> {
        let (api, _) = authenticated(&run.api, &run.session)?;
        let repo = need(&run.repo, "repository")?;

        for branch in &self.options.branches {
            match api.dispatch_workflow(repo, &self.options.workflow_file, branch) {
                Ok(()) => {
                    run.report.dispatched_on = Some(branch.clone());
                    return Ok(StepResult::ok(format!("triggered on {}", branch)));
                }
                Err(e) => {
                    debug!(branch = %branch, error = %e, "dispatch attempt failed");
                    observer.note(&e.to_string());
                }
            }
        }

        Ok(StepResult::failed(format!(
            "could not trigger automatically; trigger it from {}",
            repo.actions_url()
        )))
    }
}
