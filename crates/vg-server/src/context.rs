//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers
//! via Axum state. It is cheaply cloneable because it only holds `Arc`s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use vg_av::ToolRegistry;
use vg_core::config::Config;
use vg_core::Result;
use vg_fetch::FetchClient;

/// A completed artifact eligible for serving.
#[derive(Debug, Clone)]
pub struct ServedFile {
    /// Absolute path of the artifact on disk.
    pub path: PathBuf,
}

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// External tool registry.
    pub tools: Arc<ToolRegistry>,
    /// Extraction client (yt-dlp wrapper with retry).
    pub fetch: Arc<FetchClient>,
    /// Registry of artifacts the file route may serve. Only names present
    /// here resolve, which is also what keeps traversal requests out.
    pub files: Arc<DashMap<String, ServedFile>>,
}

impl AppContext {
    /// Build a context: discover tools, create the download directory, and
    /// seed the served-file registry with artifacts from earlier runs.
    pub fn new(config: Config) -> Result<Self> {
        let tools = Arc::new(ToolRegistry::discover(&config.tools));
        let fetch = Arc::new(FetchClient::new(tools.clone(), &config.fetch));
        let files = Arc::new(DashMap::new());

        std::fs::create_dir_all(&config.server.download_dir)?;

        let ctx = Self {
            config: Arc::new(config),
            tools,
            fetch,
            files,
        };
        ctx.seed_registry();

        Ok(ctx)
    }

    /// Directory completed artifacts live in.
    pub fn download_dir(&self) -> &Path {
        &self.config.server.download_dir
    }

    /// Register an artifact under its public file name.
    pub fn register_file(&self, file_name: &str, path: PathBuf) {
        self.files.insert(file_name.to_string(), ServedFile { path });
    }

    /// Resolve a public file name to its artifact, if registered and still
    /// present on disk.
    pub fn resolve_file(&self, file_name: &str) -> Option<ServedFile> {
        let served = self.files.get(file_name).map(|entry| entry.value().clone())?;
        if !served.path.exists() {
            self.files.remove(file_name);
            return None;
        }
        Some(served)
    }

    /// Re-register `.mp4` artifacts already sitting in the download
    /// directory, so restarts keep earlier download URLs working.
    fn seed_registry(&self) {
        let entries = match std::fs::read_dir(self.download_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to scan download directory: {e}");
                return;
            }
        };

        let mut seeded = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                self.register_file(name, path.clone());
                seeded += 1;
            }
        }

        if seeded > 0 {
            tracing::info!("Seeded {seeded} existing artifacts from the download directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_in(dir: &Path) -> AppContext {
        let mut config = Config::default();
        config.server.download_dir = dir.to_path_buf();
        AppContext::new(config).unwrap()
    }

    #[test]
    fn new_creates_download_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("artifacts");
        let ctx = context_in(&dir);
        assert!(dir.is_dir());
        assert_eq!(ctx.download_dir(), dir);
    }

    #[test]
    fn register_and_resolve() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context_in(tmp.path());

        let artifact = tmp.path().join("abc_1080p.mp4");
        std::fs::write(&artifact, b"x").unwrap();

        ctx.register_file("abc_1080p.mp4", artifact.clone());
        assert!(ctx.resolve_file("abc_1080p.mp4").is_some());
        assert!(ctx.resolve_file("other.mp4").is_none());

        // A deleted artifact stops resolving.
        std::fs::remove_file(&artifact).unwrap();
        assert!(ctx.resolve_file("abc_1080p.mp4").is_none());
    }

    #[test]
    fn seeds_existing_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("old_720p.mp4"), b"x").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        let ctx = context_in(tmp.path());
        assert!(ctx.resolve_file("old_720p.mp4").is_some());
        assert!(ctx.resolve_file("notes.txt").is_none());
    }
}
