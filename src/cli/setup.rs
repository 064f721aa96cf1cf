//! Setup command.
//!
//! Runs the full provisioning sequence and prints progress as it goes.

use tracing::debug;

use crate::cli::banner;
use crate::cli::output;
use crate::cli::SetupArgs;
use crate::core::bundle::Bundle;
use crate::core::github::GitHubConnector;
use crate::core::orchestrator::{Observer, Options, Orchestrator, Report, StepRecord, STEP_COUNT};
use crate::core::seal;
use crate::core::settings::Settings;
use crate::core::tools::SystemRunner;
use crate::error::Result;

/// Prints step progress to the terminal.
struct Terminal {
    total: usize,
    index: usize,
}

impl Terminal {
    fn new(total: usize) -> Self {
        Self { total, index: 0 }
    }
}

impl Observer for Terminal {
    fn step_started(&mut self, name: &'static str) {
        self.index += 1;
        output::dimmed(&format!("[{}/{}] {}", self.index, self.total, name));
    }

    fn item_finished(&mut self, label: &str, ok: bool) {
        output::item(label, ok);
    }

    fn note(&mut self, message: &str) {
        output::dimmed(&format!("    {}", message));
    }

    fn step_finished(&mut self, record: &StepRecord) {
        if record.result.succeeded {
            output::success(&record.result.detail);
        } else if record.fatal {
            // The error itself is reported once the run returns.
            output::dimmed(&format!("    {} failed", record.name));
        } else {
            output::warn(&record.result.detail);
        }
    }
}

/// Resolve settings from the bundle directory plus command-line overrides.
fn resolve_settings(args: &SetupArgs) -> Result<Settings> {
    let mut settings = Settings::load(&args.dir)?;
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }
    if let Some(method) = args.secret_method {
        settings.secret_method = method;
    }
    if args.skip_git_check {
        settings.require_git = false;
    }
    settings.validate()?;
    Ok(settings)
}

/// Provision the repository described by the bundle in `args.dir`.
pub fn execute(args: SetupArgs) -> Result<()> {
    if !args.no_banner {
        banner::print_banner();
    }

    let settings = resolve_settings(&args)?;
    debug!(dir = %args.dir.display(), api = %settings.api_url, "starting setup");

    let bundle = Bundle::new(&args.dir, &settings);
    let connector = GitHubConnector::new(settings.api_url.clone());
    let runner = SystemRunner;
    let options = Options::from_settings(&settings, seal::AVAILABLE);

    let orchestrator = Orchestrator::new(bundle, &connector, &runner, options);
    let mut terminal = Terminal::new(STEP_COUNT);
    let report = orchestrator.run(&mut terminal)?;

    print_manual_secrets(&report);
    print_summary(&report);
    Ok(())
}

fn print_manual_secrets(report: &Report) {
    if report.manual_secrets.is_empty() {
        return;
    }

    output::section("Add these secrets by hand");
    if let Some(repo) = &report.repo {
        output::hint(&format!("open {}", repo.secrets_url()));
    }
    for secret in &report.manual_secrets {
        output::kv(secret.name, &secret.preview);
    }
}

fn print_summary(report: &Report) {
    if report.fully_succeeded() {
        output::section("Stream is live");
    } else {
        output::section("Setup finished with warnings");
    }

    if let Some(repo) = &report.repo {
        let state = if report.repo_created { "created" } else { "existing" };
        output::kv("repository:", format!("{} ({})", output::url(&repo.html_url()), state));
        output::kv("actions:   ", output::url(&repo.actions_url()));
        output::kv("settings:  ", output::url(&repo.secrets_url()));
    }
    output::kv(
        "uploaded:  ",
        format!("{}/{}", report.uploads.done, report.uploads.total),
    );
    output::kv(
        "secrets:   ",
        format!("{}/{}", report.secrets.done, report.secrets.total),
    );
    match &report.dispatched_on {
        Some(branch) => output::kv("workflow:  ", format!("running on {}", branch)),
        None => output::kv("workflow:  ", "not started"),
    }

    println!();
    output::dimmed("Your PC can be off. The workflow restarts the stream on its schedule.");
}
