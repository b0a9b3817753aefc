use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_then_build_writes_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("riscdocs initialized"));

    #[allow(deprecated)]
    Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 6 pages"));

    let dist = dir.path().join("dist");
    for rel in [
        "index.html",
        "user-guide/root/index.html",
        "user-guide/getting-started/index.html",
        "dev-guide/root/index.html",
        "dev-guide/how-to-draw-waveforms/index.html",
        "dev-guide/todo-list/index.html",
        "404.html",
        "routes.json",
        "css/site.css",
        "js/app.js",
    ] {
        assert!(dist.join(rel).exists(), "missing {rel}");
    }

    let waves = fs::read_to_string(dist.join("dev-guide/how-to-draw-waveforms/index.html"))?;
    assert!(waves.contains("<svg"));
    assert!(waves.contains("widget-wavedrom"));
    Ok(())
}

#[test]
fn build_reports_failing_widgets() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("riscdocs.yml"), "site:\n  title: Test\n")?;
    fs::create_dir_all(dir.path().join("content"))?;
    fs::write(
        dir.path().join("content/home.md"),
        "# Home\n\n```wavedrom\n{ \"signal\": 3 }\n```\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 widget(s) failed to render"))
        .stdout(predicate::str::contains("wavedrom widget #0"));

    let home = fs::read_to_string(dir.path().join("dist/index.html"))?;
    assert!(home.contains("WaveDrom Rendering Error"));
    Ok(())
}

#[test]
fn routes_json_lists_pages() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    #[allow(deprecated)]
    let assert = Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .args(["routes", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    let rows = value.as_array().expect("json array");
    assert_eq!(rows.len(), 6);
    let todo = rows
        .iter()
        .find(|r| r["path"] == "/dev-guide/todo-list")
        .expect("todo route");
    assert_eq!(todo["title"], "Todo List");
    assert_eq!(todo["nav"], "Todo List");
    Ok(())
}

#[test]
fn missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("riscdocs")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
    Ok(())
}
