use std::process::{Command, Output};

use tempfile::TempDir;

fn split_relay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_split-relay"))
        .args(args)
        .output()
        .expect("run split-relay")
}

#[test]
fn missing_route_is_a_usage_error() {
    let output = split_relay(&[]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("specify your route file"),
        "stderr: {}",
        stderr
    );
    // The listen banner goes to stdout, so empty stdout means no socket was opened
    assert!(output.stdout.is_empty(), "server banner printed: {:?}", output.stdout);
}

#[test]
fn unreadable_route_exits_with_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let route = temp_dir.path().join("missing.toml");

    let output = split_relay(&[route.to_str().unwrap(), "--port", "0"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.toml"), "stderr: {}", stderr);
    assert!(output.stdout.is_empty(), "server banner printed: {:?}", output.stdout);
}
