//! Command-line behavior against a temporary data directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DESTINATIONS: &str = r#"[
    {"id": 7, "name": "Rheinfall", "lat": "47.0135", "lng": "8.0"},
    {"id": 8, "name": "Pilatus", "lat": "46.9790", "lng": "8.2550"},
    {"id": 9, "name": "Ohne Ort", "lat": null, "lng": null}
]"#;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("destinations.json"), DESTINATIONS).unwrap();
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ausflug-proximity").unwrap();
        cmd.current_dir(self.dir.path())
            .env("RUST_LOG", "error")
            .env_remove("AUSFLUG_CONFIG")
            .arg("--data-dir")
            .arg(self.dir.path().join("data"))
            .arg("--destinations-file")
            .arg(self.dir.path().join("destinations.json"));
        cmd
    }

    fn enable(&self) {
        self.cmd().args(["settings", "location", "on"]).assert().success();
        self.cmd().args(["settings", "proximity", "on"]).assert().success();
    }
}

#[test]
fn test_settings_default_json() {
    let env = Env::new();
    env.cmd()
        .args(["--format", "json", "settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""locationEnabled": false"#))
        .stdout(predicate::str::contains(r#""proximityDistance": 2000"#));
}

#[test]
fn test_proximity_requires_location() {
    let env = Env::new();
    env.cmd()
        .args(["settings", "proximity", "on"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Enable location first"));
}

#[test]
fn test_check_refused_when_disabled() {
    let env = Env::new();
    env.cmd()
        .args(["check", "--lat", "47.0", "--lon", "8.0"])
        .assert()
        .code(4);
}

#[test]
fn test_check_notifies_once() {
    let env = Env::new();
    env.enable();

    env.cmd()
        .args(["check", "--lat", "47.0", "--lon", "8.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rheinfall ist nur 1.5km entfernt."))
        .stdout(predicate::str::contains("/trip/7"))
        .stdout(predicate::str::contains("Pilatus").not());

    env.cmd()
        .args(["check", "--lat", "47.0", "--lon", "8.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No new destinations nearby"));

    env.cmd()
        .args(["--format", "json", "notified", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": 7"#))
        .stdout(predicate::str::contains(r#""expired": false"#));

    env.cmd().args(["notified", "clear"]).assert().success();
    env.cmd()
        .args(["--format", "json", "notified", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_larger_radius_reaches_further() {
    let env = Env::new();
    env.enable();
    env.cmd().args(["settings", "distance", "25000"]).assert().success();

    env.cmd()
        .args(["--format", "json", "check", "--lat", "47.0", "--lon", "8.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""sent": 2"#));
}

#[test]
fn test_watch_reads_positions_from_stdin() {
    let env = Env::new();
    env.enable();

    env.cmd()
        .args(["--format", "json", "watch"])
        .write_stdin("# start\n46.5,7.5,0\nnot a position\n47.0,8.0,120000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""fixes": 2"#))
        .stdout(predicate::str::contains(r#""skipped_lines": 1"#))
        .stdout(predicate::str::contains("Rheinfall ist nur 1.5km entfernt."))
        .stdout(predicate::str::contains("proximity.pass_duration_ms"));
}

#[test]
fn test_destinations_with_coordinates() {
    let env = Env::new();
    env.cmd()
        .args(["destinations", "--with-coordinates"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rheinfall"))
        .stdout(predicate::str::contains("Ohne Ort").not());
}

#[test]
fn test_missing_config_file() {
    let env = Env::new();
    env.cmd()
        .args(["--config", "missing.toml", "settings", "show"])
        .assert()
        .code(3);
}

#[test]
fn test_missing_config_file_json_report() {
    let env = Env::new();
    env.cmd()
        .args(["--format", "json", "--config", "missing.toml", "settings", "show"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains(r#""code": "CONFIG_NOT_FOUND""#))
        .stderr(predicate::str::contains("Create an ausflug.toml file"));
}
