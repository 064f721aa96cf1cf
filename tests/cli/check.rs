//! Tests for `streamhost check`.

use crate::support::*;

#[test]
fn test_check_complete_bundle() {
    let t = Test::with_bundle(SAMPLE_SETUP);

    let output = t.check();
    assert_success(&output);
    assert_stdout_contains(&output, "ready for setup");
    assert_stdout_contains(&output, "mystream");
    assert_stdout_contains(&output, "1080p");
}

#[test]
fn test_check_masks_secrets() {
    let t = Test::with_bundle(SAMPLE_SETUP);

    let output = t.check();
    assert_success(&output);
    assert_stdout_contains(&output, "abcd-efg...mnop");
    assert_stdout_contains(&output, "ghp_test...7890");
    assert_stdout_excludes(&output, "abcd-efgh-ijkl-mnop");
    assert_stdout_excludes(&output, "ghp_testtoken1234567890");
}

#[test]
fn test_check_tolerates_blank_lines() {
    let t = Test::with_bundle(SPACED_SETUP);

    let output = t.check();
    assert_success(&output);
    assert_stdout_contains(&output, "720p");
    assert_stdout_contains(&output, "9:16");
}

#[test]
fn test_check_lists_missing_files() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    t.remove(STREAMER_FILE);
    t.remove(WORKFLOW_TEMPLATE);

    let output = t.check();
    assert_failure(&output);
    assert_stderr_contains(&output, "2 required file(s) missing");
    assert_stderr_contains(&output, "streamer.py");
    assert_stderr_contains(&output, WORKFLOW_TEMPLATE);
}

#[test]
fn test_check_short_setup_file() {
    let t = Test::with_bundle(SHORT_SETUP);

    let output = t.check();
    assert_failure(&output);
    assert_stderr_contains(&output, "needs 6 non-blank lines, found 3");
}

#[test]
fn test_check_with_dir_flag() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    let elsewhere = Test::new();

    let output = elsewhere
        .cmd()
        .args(["check", "--dir"])
        .arg(t.dir.path())
        .output()
        .unwrap();
    assert_success(&output);
}

#[test]
fn test_check_reads_settings_file() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    t.write(
        ".streamhost.toml",
        "branches = [\"live\"]\nsecret_method = \"cli\"\n",
    );

    let output = t.check();
    assert_success(&output);
    assert_stdout_contains(&output, "branches:     live");
    assert_stdout_contains(&output, "secrets via:  cli");
}

#[test]
fn test_check_rejects_unknown_settings() {
    let t = Test::with_bundle(SAMPLE_SETUP);
    t.write(".streamhost.toml", "colour = \"red\"\n");

    let output = t.check();
    assert_failure(&output);
}
