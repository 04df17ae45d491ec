//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use chcount_server::config::{LoadedConfig, ResolvedPaths, ServerConfig};
use chcount_server::lifecycle::{start, RunningServer};
use chcount_server::Shutdown;
use futures_util::StreamExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

pub type Channel = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a push message before failing.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// A server on an ephemeral port with its own document root and temp storage.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub docs: TempDir,
    pub tmp: TempDir,
    pub running: Option<RunningServer>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Number of files currently in temp storage.
    pub fn tmp_file_count(&self) -> usize {
        std::fs::read_dir(self.tmp.path()).unwrap().count()
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(mut self) {
        self.shutdown.trigger();
        if let Some(running) = self.running.take() {
            tokio::time::timeout(Duration::from_secs(10), running.wait())
                .await
                .expect("server did not stop")
                .unwrap();
        }
    }
}

/// Start a server that uses the built `chcount` binary as its worker.
pub async fn start_server() -> TestServer {
    start_server_with(Path::new(env!("CARGO_BIN_EXE_chcount")), |_| {}).await
}

/// Start a server with a custom worker and config overrides.
pub async fn start_server_with<F>(worker: &Path, configure: F) -> TestServer
where
    F: FnOnce(&mut ServerConfig),
{
    let docs = tempfile::tempdir().unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let mut config = ServerConfig::default();
    config.listener.port = 0;
    config.lifecycle.shutdown_grace_secs = 5;
    configure(&mut config);

    let loaded = LoadedConfig {
        config,
        paths: ResolvedPaths {
            docs: docs.path().to_path_buf(),
            tmp_storage: tmp.path().to_path_buf(),
            worker_executable: worker.to_path_buf(),
        },
    };

    let shutdown = Shutdown::new();
    let running = start(loaded, shutdown.clone()).unwrap();

    TestServer {
        addr: running.local_addr(),
        shutdown,
        docs,
        tmp,
        running: Some(running),
    }
}

/// Open a push channel and read its identity message.
pub async fn open_channel(server: &TestServer) -> (Channel, Uuid) {
    let (mut channel, _) = tokio_tungstenite::connect_async(server.ws_url())
        .await
        .unwrap();

    let first = next_json(&mut channel).await;
    assert_eq!(first["type"], "id", "first message: {first}");
    let id = Uuid::parse_str(first["data"].as_str().unwrap()).unwrap();
    (channel, id)
}

/// Wait for the next text message and parse it as JSON.
pub async fn next_json(channel: &mut Channel) -> Value {
    loop {
        let frame = tokio::time::timeout(PUSH_TIMEOUT, channel.next())
            .await
            .expect("timed out waiting for push message")
            .expect("channel closed")
            .unwrap();
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Submit a job for `id` and return the response.
pub async fn submit(server: &TestServer, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/api/count"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

/// Write a raw request and read the whole response (the request must ask to close).
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("timed out reading response")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Write an executable shell script to `dir` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
