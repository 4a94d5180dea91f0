//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] over a
//! temporary download directory. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.
//! [`stub_tool`] writes a small shell script and returns its path, so
//! pipeline tests can stand in for yt-dlp/ffmpeg without touching the
//! network.

use std::net::SocketAddr;
#[cfg(unix)]
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;

use tempfile::TempDir;

use vg_core::config::Config;
use vg_server::context::AppContext;
use vg_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary download directory.
pub struct TestHarness {
    pub ctx: AppContext,
    _data_dir: TempDir,
}

#[allow(dead_code)]
impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The download
    /// directory is always redirected into a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let data_dir = TempDir::new().expect("failed to create temp dir");
        config.server.download_dir = data_dir.path().join("downloads");

        let ctx = AppContext::new(config).expect("failed to build AppContext");

        Self {
            ctx,
            _data_dir: data_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Write an executable shell script named `name` into `dir` and return its
/// path. Unix only; callers gate on `cfg(unix)`.
#[cfg(unix)]
#[allow(dead_code)]
pub fn stub_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod stub");
    path
}
