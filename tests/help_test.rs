mod common;

#[test]
fn help_lists_run_flags_and_config_command() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = common::schemasync(dir.path())
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);

    for flag in [
        "--conf",
        "--source",
        "--dest",
        "--schemas",
        "--tables",
        "--tables-ignore",
        "--tables-compare-data",
        "--single-schema-change",
        "--sync",
        "--drop",
        "--report",
        "config",
    ] {
        assert!(stdout.contains(flag), "missing from help: {}", flag);
    }
}

#[test]
fn version_flag_prints_package_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    common::schemasync(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}
