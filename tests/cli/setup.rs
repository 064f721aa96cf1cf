//! Tests for `streamhost setup` against a fake GitHub API.

use crate::support::*;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_setup_existing_repo_manual_secrets() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(server::existing_repo_without_key);

    let output = t.setup(&server.url, &[]);
    assert_success(&output);

    // Four files land in the existing repository.
    let puts = server.matching("PUT", "/repos/alice/mystream/contents/");
    let paths: Vec<&str> = puts.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(puts.len(), 4, "paths: {:?}", paths);
    assert!(paths.contains(&"/repos/alice/mystream/contents/streamer.py"));
    assert!(paths.contains(&"/repos/alice/mystream/contents/requirements.txt"));
    assert!(paths.contains(&"/repos/alice/mystream/contents/README.md"));
    assert!(paths.contains(&"/repos/alice/mystream/contents/.github/workflows/youtube-live.yml"));
    assert!(server.matching("POST", "/user/repos").is_empty());

    // No key and no gh: all four secrets are listed for manual entry.
    assert_stdout_contains(&output, "Add these secrets by hand");
    for name in ["YOUTUBE_STREAM_KEY", "VIDEO_URL", "VIDEO_QUALITY", "ASPECT_RATIO"] {
        assert_stdout_contains(&output, name);
    }
    assert_stdout_contains(&output, "https://github.com/alice/mystream/settings/secrets/actions");
    assert_stdout_contains(&output, "0/4");

    // The workflow is still triggered.
    let dispatches = server.matching("POST", "/repos/alice/mystream/actions/workflows/");
    assert_eq!(dispatches.len(), 1);
    assert!(dispatches[0].body.contains("\"ref\":\"main\""));
    assert_stdout_contains(&output, "running on main");
}

#[test]
fn test_setup_sends_token_as_bearer() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(server::existing_repo_without_key);

    let output = t.setup(&server.url, &[]);
    assert_success(&output);

    let user = server.matching("GET", "/user");
    assert_eq!(
        user[0].authorization.as_deref(),
        Some("Bearer ghp_testtoken1234567890")
    );
}

#[test]
fn test_setup_creates_missing_repository() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    t.write(".streamhost.toml", "settle_secs = 0\n");
    let server = FakeGitHub::start(|method, path| match (method, path) {
        ("GET", "/repos/alice/mystream") => (404, r#"{"message":"Not Found"}"#.to_string()),
        ("POST", "/user/repos") => (201, r#"{"full_name":"alice/mystream"}"#.to_string()),
        _ => server::existing_repo_without_key(method, path),
    });

    let output = t.setup(&server.url, &[]);
    assert_success(&output);

    let creates = server.matching("POST", "/user/repos");
    assert_eq!(creates.len(), 1);
    assert!(creates[0].body.contains("\"name\":\"mystream\""));
    assert!(creates[0].body.contains("\"private\":false"));
    assert_stdout_contains(&output, "(created)");
}

#[test]
fn test_setup_rejected_token_stops_early() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(|_, _| (401, r#"{"message":"Bad credentials"}"#.to_string()));

    let output = t.setup(&server.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid token (status 401)");
    assert_stdout_contains(&output, "https://github.com/settings/tokens");

    let seen = server.seen();
    assert_eq!(seen.len(), 1, "requests: {:?}", seen);
    assert_eq!(seen[0].path, "/user");
}

#[test]
fn test_setup_short_config_makes_no_requests() {
    let t = Test::with_bundle(SHORT_SETUP);
    let server = FakeGitHub::start(server::existing_repo_without_key);

    let output = t.setup(&server.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "found 3");
    assert!(server.seen().is_empty());
}

#[test]
fn test_setup_missing_files_makes_no_requests() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    t.remove(MANIFEST_FILE);
    let server = FakeGitHub::start(server::existing_repo_without_key);

    let output = t.setup(&server.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "requirements.txt");
    assert!(server.seen().is_empty());
}

#[test]
fn test_setup_failed_uploads_do_not_stop_run() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(|method, path| {
        if method == "PUT" && path.ends_with("/README.md") {
            (422, r#"{"message":"Invalid request"}"#.to_string())
        } else {
            server::existing_repo_without_key(method, path)
        }
    });

    let output = t.setup(&server.url, &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "3/4");
    assert_eq!(
        server
            .matching("POST", "/repos/alice/mystream/actions/workflows/")
            .len(),
        1
    );
}

#[test]
fn test_setup_dispatch_failure_is_not_fatal() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(|method, path| {
        if method == "POST" && path.contains("/dispatches") {
            (422, r#"{"message":"No ref found"}"#.to_string())
        } else {
            server::existing_repo_without_key(method, path)
        }
    });

    let output = t.setup(&server.url, &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "https://github.com/alice/mystream/actions");
    assert_stdout_contains(&output, "not started");
    // Both default branches are tried.
    assert_eq!(
        server
            .matching("POST", "/repos/alice/mystream/actions/workflows/")
            .len(),
        2
    );
}

#[test]
fn test_setup_unreachable_api_fails_fast() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    // Reserve a port, then close it so connections are refused.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let started = Instant::now();
    let output = t.setup(&format!("http://127.0.0.1:{}", port), &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "token verification request failed");
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn test_setup_verbose_logs_to_stderr() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let server = FakeGitHub::start(server::existing_repo_without_key);

    let output = t.setup(&server.url, &["--verbose"]);
    assert_success(&output);
    assert_stderr_contains(&output, "DEBUG");
    // Secret values never reach the log.
    assert!(!stderr(&output).contains("abcd-efgh-ijkl-mnop"));
    assert!(!stderr(&output).contains("ghp_testtoken1234567890"));
}

#[cfg(unix)]
#[test]
fn test_setup_interrupt_exits_cancelled() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let reached = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reached);
    // Hold the token check open so the run is mid-request when interrupted.
    let server = FakeGitHub::start(move |method, path| {
        if path == "/user" {
            flag.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_secs(30));
        }
        server::existing_repo_without_key(method, path)
    });

    let mut child = t.spawn_setup(&server.url);

    let deadline = Instant::now() + Duration::from_secs(10);
    while !reached.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "setup never reached the token check");
        thread::sleep(Duration::from_millis(20));
    }
    thread::sleep(Duration::from_millis(300));

    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    while child.try_wait().unwrap().is_none() {
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("setup did not exit after SIGINT");
        }
        thread::sleep(Duration::from_millis(20));
    }

    let output = child.wait_with_output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "cancelled by user");
}
