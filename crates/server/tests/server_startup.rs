use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Minimal config keeping every file inside `dir`
fn minimal_config(port: u16, dir: &Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[storage]
db_path = "{dir}/tracks.db"
downloads_dir = "{dir}/downloads"

[download]
log_file = "{dir}/jobs.log"
"#,
        port = port,
        dir = dir.display()
    )
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_trackfetch"))
        .env("TRACKFETCH_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_server_starts_and_serves_health() {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, minimal_config(port, dir.path())).unwrap();

    let mut server = spawn_server(&config_path);
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let jobs: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/downloads/jobs", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["queueLength"], 0);
    assert_eq!(jobs["jobs"].as_array().unwrap().len(), 0);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_server_exits_on_missing_config() {
    let dir = TempDir::new().unwrap();
    let mut server = spawn_server(&dir.path().join("does-not-exist.toml"));

    let status = tokio::time::timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server did not exit")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_server_exits_on_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "{}\n[media]\naudio_format = \"../evil\"\n",
            minimal_config(get_available_port(), dir.path())
        ),
    )
    .unwrap();

    let mut server = spawn_server(&config_path);
    let status = tokio::time::timeout(Duration::from_secs(10), server.wait())
        .await
        .expect("Server did not exit")
        .unwrap();
    assert!(!status.success());
}
