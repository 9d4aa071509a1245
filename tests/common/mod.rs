//! Shared helpers for integration tests

#![allow(dead_code)]

use hostsuite::capabilities::filesystem::LocalFileSystem;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TEXT_CONTENTS: &str = "hello, world\nthis is a test file\n";
pub const TEXT_MD5: &str = "86d73d2f11e507365f7ea8e7ec3cc4cb";

/// Sandboxed filesystem rooted in a temporary directory
pub struct TestEnvironment {
    temp_dir: TempDir,
    pub fs: LocalFileSystem,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        let fs = LocalFileSystem::open(temp_dir.path()).expect("Failed to open sandbox");
        Self { temp_dir, fs }
    }

    pub fn root(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

/// Minimal HTTP/1.1 server answering GETs from a fixed set of bodies
pub struct FixtureServer {
    addr: SocketAddr,
}

impl FixtureServer {
    pub async fn start(files: Vec<(&str, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fixture server");
        let addr = listener.local_addr().expect("Fixture server has no address");
        let files: Arc<HashMap<String, Vec<u8>>> = Arc::new(
            files
                .into_iter()
                .map(|(path, body)| (path.to_string(), body))
                .collect(),
        );

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let files = files.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &files).await;
                });
            }
        });

        Self { addr }
    }

    /// Server with the text fixture at `/text-file.txt`
    pub async fn with_text_file() -> Self {
        Self::start(vec![("/text-file.txt", TEXT_CONTENTS.as_bytes().to_vec())]).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn serve(mut stream: TcpStream, files: &HashMap<String, Vec<u8>>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..read]);
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, body) = match files.get(path) {
        Some(body) => ("200 OK", body.as_slice()),
        None => ("404 Not Found", &b"not found"[..]),
    };
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.shutdown().await
}
