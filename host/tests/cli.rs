use assert_cmd::Command;

#[test]
fn unknown_domain_exits_with_code_two() {
    Command::cargo_bin("stagehand-host")
        .unwrap()
        .args(["--scheduler", "not-a-real-domain"])
        .env_remove("TASK_DB_HOST")
        .timeout(std::time::Duration::from_secs(5))
        .assert()
        .code(2);
}

#[test]
fn unrecognized_mode_exits_with_code_two() {
    Command::cargo_bin("stagehand-host")
        .unwrap()
        .args(["--mode", "not-a-real-mode"])
        .env_remove("TASK_DB_HOST")
        .timeout(std::time::Duration::from_secs(5))
        .assert()
        .code(2);
}

#[test]
fn web_mode_exits_cleanly() {
    Command::cargo_bin("stagehand-host")
        .unwrap()
        .args(["--mode", "web"])
        .env_remove("TASK_DB_HOST")
        .timeout(std::time::Duration::from_secs(5))
        .assert()
        .success();
}
