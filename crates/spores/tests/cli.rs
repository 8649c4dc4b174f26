use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn spores(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spores"))
        .env("SPORES_CONFIG_DIR", root.join("config"))
        .env("SPORES_CACHE_DIR", root.join("cache"))
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run spores")
}

#[test]
fn where_prints_overridden_directories() {
    let root = TempDir::new().unwrap();
    let output = spores(root.path(), &["where"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let config_dir = root.path().join("config");
    let cache_dir = root.path().join("cache");
    assert!(stdout.contains(&config_dir.display().to_string()));
    assert!(stdout.contains(&config_dir.join("spores.toml").display().to_string()));
    assert!(stdout.contains(&cache_dir.join("textures").display().to_string()));
}

#[test]
fn config_without_file_prints_defaults() {
    let root = TempDir::new().unwrap();
    let output = spores(root.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("time_step = 0.005"));
    assert!(stdout.contains("entry_duration_ms = 1256"));
    assert!(stdout.contains("us-sat-texture.jpg"));
    assert!(stdout.contains("[anchor]"));
}

#[test]
fn config_merges_file_and_flags() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("spores.toml"),
        "ease_power = 3\npower = \"high\"\n\n[anchor]\nx = 10.0\ny = 20.0\nwidth = 300.0\nheight = 150.0\n",
    )
    .unwrap();

    let output = spores(
        root.path(),
        &["--texture", "/tmp/sat.png", "--windowed", "config"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ease_power = 3"));
    assert!(stdout.contains("power = \"high\""));
    assert!(stdout.contains("texture = \"/tmp/sat.png\""));
    assert!(stdout.contains("fullscreen = false"));
    assert!(stdout.contains("width = 300.0"));
}

#[test]
fn explicit_config_path_wins() {
    let root = TempDir::new().unwrap();
    let custom = root.path().join("custom.toml");
    fs::write(&custom, "randomize_start_time = false\n").unwrap();

    let output = spores(
        root.path(),
        &["config", "--config", custom.to_str().unwrap()],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("randomize_start_time = false"));
    assert!(stdout.contains(&custom.display().to_string()));
}

#[test]
fn broken_config_fails_with_context() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("spores.toml"), "[anchor]\n").unwrap();

    let output = spores(root.path(), &["config"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid spores configuration"));
    assert!(stderr.contains("no anchor region configured"));
}
