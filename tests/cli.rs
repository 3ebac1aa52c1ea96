use assert_cmd::Command;
use tempfile::TempDir;

// Point the config store at an empty home so a developer's own config never leaks in.
fn pagetype(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pagetype").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"));
    cmd
}

#[test]
fn help_lists_options() {
    let home = TempDir::new().unwrap();
    let output = pagetype(&home).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--url"));
    assert!(stdout.contains("--chars-per-page"));
    assert!(stdout.contains("--rate-unit"));
}

#[test]
fn refuses_to_run_without_a_tty() {
    let home = TempDir::new().unwrap();
    let output = pagetype(&home).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin must be a tty"), "stderr: {stderr}");
}

#[test]
fn zero_page_size_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = pagetype(&home)
        .args(["--chars-per-page", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("chars_per_page must be at least 1"),
        "stderr: {stderr}"
    );
}

#[test]
fn unknown_rate_unit_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = pagetype(&home)
        .args(["--rate-unit", "kph"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kph"), "stderr: {stderr}");
}
