//! Static files served from the application root.

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::http::header;
use tracing::debug;

use super::path::is_reserved;
use crate::result::ActionResult;
use crate::Result;

/// Directory containing the running executable, or `.` if unknown.
pub fn application_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Files served from the application root when no controller applies.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path onto the filesystem.
    ///
    /// `None` for the root, for anything but plain components (`..`,
    /// absolute prefixes), and for paths under a reserved folder.
    pub fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let url_path = url_path.split(['?', '#']).next().unwrap_or_default();
        let mut pb = self.base_dir.clone();
        let mut depth = 0;

        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => {
                    if depth == 0 && s.to_str().map_or(true, is_reserved) {
                        return None;
                    }
                    pb.push(s);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }

        (depth > 0).then_some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "xml" => "application/xml",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "pdf" => "application/pdf",
            "wasm" => "application/wasm",
            _ => "application/octet-stream",
        }
    }

    /// Load the file behind `url_path` as a 200 result.
    ///
    /// `Ok(None)` when the path is not servable or names no regular file.
    pub async fn load(&self, url_path: &str) -> Result<Option<ActionResult>> {
        let Some(path) = self.map_path(url_path) else {
            return Ok(None);
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await?;
        debug!(path = %path.display(), size = bytes.len(), "Serving static file");

        Ok(Some(
            ActionResult::new(bytes)
                .with_header(header::CONTENT_TYPE.as_str(), Self::content_type(&path)),
        ))
    }
}
