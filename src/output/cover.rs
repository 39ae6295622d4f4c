//! Cover-art materialization.
//!
//! The handler keeps a single image file up to date with the cover of the
//! current snapshot, so overlays can point at a stable path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::error::OutputError;
use crate::song::Song;

pub trait CoverHandler: Send {
    /// Materialize the cover referenced by the snapshot.
    fn fetch(&mut self, song: &Song);

    /// Write raw image bytes identified by `key` (e.g. an embedded picture).
    fn store(&mut self, key: &str, bytes: &[u8]);

    /// Forget the current cover and fall back to the placeholder.
    fn reset(&mut self);
}

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CoverArt {
    path: PathBuf,
    placeholder: Option<PathBuf>,
    last: Option<String>,
    client: Option<Client>,
}

impl CoverArt {
    pub fn new(path: PathBuf, placeholder: Option<PathBuf>) -> Self {
        Self {
            path,
            placeholder,
            last: None,
            client: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn client(&mut self) -> Result<Client, OutputError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .connect_timeout(DOWNLOAD_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn write(&self, bytes: &[u8]) -> Result<(), OutputError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn copy_from(&self, source: &Path) -> Result<(), OutputError> {
        let bytes = fs::read(source)?;
        self.write(&bytes)
    }

    fn download(&mut self, link: &str) -> Result<(), OutputError> {
        let response = self.client()?.get(link).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutputError::Status(status.as_u16()));
        }
        let bytes = response.bytes()?;
        self.write(&bytes)
    }

    fn materialize(&mut self, link: &str) -> Result<(), OutputError> {
        if link.starts_with("http://") || link.starts_with("https://") {
            return self.download(link);
        }
        if link.starts_with("file://") {
            let path = Url::parse(link)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| OutputError::InvalidLink(link.to_string()))?;
            return self.copy_from(&path);
        }
        self.copy_from(Path::new(link))
    }

    fn clear_file(&self) -> Result<(), OutputError> {
        if let Some(placeholder) = &self.placeholder {
            return self.copy_from(placeholder);
        }
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl CoverHandler for CoverArt {
    fn fetch(&mut self, song: &Song) {
        let link = song.cover_link();
        if self.last.as_deref() == Some(link) {
            return;
        }
        // A failed link is not retried until it changes.
        self.last = Some(link.to_string());

        if link.is_empty() {
            if let Err(e) = self.clear_file() {
                warn!(path = %self.path.display(), "failed to clear cover: {e}");
            }
            return;
        }

        match self.materialize(link) {
            Ok(()) => debug!(link, "cover updated"),
            Err(e) => warn!(link, "failed to fetch cover: {e}"),
        }
    }

    fn store(&mut self, key: &str, bytes: &[u8]) {
        if self.last.as_deref() == Some(key) {
            return;
        }
        self.last = Some(key.to_string());
        match self.write(bytes) {
            Ok(()) => debug!(key, "cover stored"),
            Err(e) => warn!(path = %self.path.display(), "failed to store cover: {e}"),
        }
    }

    fn reset(&mut self) {
        self.last = None;
        if let Err(e) = self.clear_file() {
            warn!(path = %self.path.display(), "failed to reset cover: {e}");
        }
    }
}

/// Cover handler used when no cover path is configured.
pub struct NoCover;

impl CoverHandler for NoCover {
    fn fetch(&mut self, _song: &Song) {}

    fn store(&mut self, _key: &str, _bytes: &[u8]) {}

    fn reset(&mut self) {}
}
