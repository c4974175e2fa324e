use std::fs;

use predicates::prelude::*;

mod cms_stub;

use cms_stub::CmsStub;

#[test]
fn probe_rejects_non_http_url_without_network() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["probe", "ftp://example.com/video.mp4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""isReachable": false"#))
        .stdout(predicate::str::contains(r#""attempts": 0"#))
        .stdout(predicate::str::contains("invalid_format"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.env("RUST_LOG", "debug")
        .args(["probe", "not a url"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}

#[test]
fn sources_lists_the_registry_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sources.yaml");
    fs::write(
        &path,
        r#"sources:
  - id: alpha
    name: Alpha
    apiUrl: "https://alpha.example.com/api.php/provide/vod"
  - id: beta
    name: Beta
    apiUrl: "https://beta.example.com/api.php/provide/vod"
    detailUrl: "https://beta.example.com/detail"
    enabled: false
"#,
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["sources", "--sources"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "alpha""#))
        .stdout(predicate::str::contains(r#""detailUrl": "https://beta.example.com/detail""#))
        .stdout(predicate::str::contains(r#""enabled": false"#));
    Ok(())
}

#[test]
fn duplicate_source_ids_fail_to_load() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sources.yaml");
    fs::write(
        &path,
        r#"sources:
  - { id: alpha, name: A, apiUrl: "https://a.example.com/api" }
  - { id: alpha, name: B, apiUrl: "https://b.example.com/api" }
"#,
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["sources", "--sources"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate source id: alpha"));
    Ok(())
}

#[test]
fn search_prints_the_aggregated_response() -> anyhow::Result<()> {
    let stub = CmsStub::spawn();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sources.yaml");
    fs::write(&path, stub.sources_yaml())?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["search", "--query", "Inception", "--source", "live", "--source", "empty"])
        .arg("--sources")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""availableSources": 1"#))
        .stdout(predicate::str::contains(r#""totalSources": 2"#))
        .stdout(predicate::str::contains(r#""totalResults": 5"#));
    Ok(())
}

#[test]
fn detail_without_playable_episodes_fails() -> anyhow::Result<()> {
    let stub = CmsStub::spawn();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sources.yaml");
    fs::write(&path, stub.sources_yaml())?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["detail", "--id", "10", "--source", "live", "--sources"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No playable episodes found"));
    Ok(())
}

#[test]
fn detail_requires_a_source_or_custom_api() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vodprobe");
    cmd.args(["detail", "--id", "1"]).assert().failure();
}
