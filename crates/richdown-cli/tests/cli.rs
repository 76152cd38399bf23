use assert_cmd::Command;
use predicates::prelude::*;

fn richdown() -> Command {
    let mut cmd = Command::cargo_bin("richdown").unwrap();
    // Point config at a path that never exists so user machines don't
    // leak their settings into test runs.
    cmd.env("RICHDOWN_CONFIG", "/nonexistent/richdown.toml");
    cmd
}

#[test]
fn normalize_canonicalizes_emphasis() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    std::fs::write(&file, "__bold__ and _italic_\n").unwrap();

    richdown()
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout("**bold** and *italic*\n");
}

#[test]
fn normalize_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    let out = dir.path().join("out.md");
    std::fs::write(&file, "# title\n").unwrap();

    richdown()
        .arg("normalize")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "# title\n");
}

#[test]
fn inspect_emits_json_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    std::fs::write(&file, "- a\n- b\n").unwrap();

    richdown()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("bulleted_list"))
        .stdout(predicate::str::contains("list_item"));
}

#[test]
fn check_reports_stability() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    std::fs::write(&file, "# h\n\n**b** and [l](https://x.test)\n").unwrap();

    richdown()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("round-trip stable"));
}

#[test]
fn missing_file_is_an_error() {
    richdown()
        .arg("normalize")
        .arg("/definitely/not/here.md")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading"));
}

#[test]
fn config_can_disable_typographics() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("post.md");
    std::fs::write(&file, "wait...\n").unwrap();
    let config = dir.path().join("richdown.toml");
    std::fs::write(&config, "[parsing]\ntypographics = false\n").unwrap();

    // Default options replace the ellipsis.
    richdown()
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout("wait\u{2026}\n");

    // Config turns it off.
    richdown()
        .arg("--config")
        .arg(&config)
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout("wait...\n");
}
