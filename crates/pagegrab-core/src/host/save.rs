//! File save capability.
//!
//! The filesystem host writes each file to `<name>.part` first and renames it
//! into place once complete, so a partial file never carries the final name.
//! Under [`ConflictAction::Uniquify`] the final name is claimed with an empty
//! placeholder before any bytes are written, so concurrent saves of the same
//! name never share a target or a temp file.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::fetch::easy_for;
use super::handles::{ContentHandle, HandleStore};

/// What happens when the destination name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Pick a fresh name next to the existing file.
    Uniquify,
    Overwrite,
}

/// Where the bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveSource {
    Handle(ContentHandle),
    Reference(String),
}

/// One save call.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub source: SaveSource,
    /// Destination relative to the host's download location.
    pub destination: PathBuf,
    pub conflict: ConflictAction,
    /// Ask the user where to save. Unattended batches always send false.
    pub prompt: bool,
}

impl SaveRequest {
    /// A request that never prompts and never overwrites.
    pub fn unattended(source: SaveSource, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            conflict: ConflictAction::Uniquify,
            prompt: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("interactive save prompts are not supported")]
    PromptNotSupported,
    #[error("destination must be a relative path without '..': {0}")]
    UnsafeDestination(PathBuf),
    #[error("content handle {0} is not live")]
    UnknownHandle(ContentHandle),
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("save task failed: {0}")]
    Task(String),
}

/// Host file-save facility.
#[async_trait]
pub trait SaveHost: Send + Sync {
    /// Saves and returns the final path.
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, SaveError>;
}

/// [`SaveHost`] writing under a local download directory.
#[derive(Clone)]
pub struct FsSaveHost {
    download_dir: PathBuf,
    handles: HandleStore,
    timeout: Duration,
}

impl FsSaveHost {
    pub fn new(download_dir: impl Into<PathBuf>, handles: HandleStore, timeout: Duration) -> Self {
        Self {
            download_dir: download_dir.into(),
            handles,
            timeout,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

#[async_trait]
impl SaveHost for FsSaveHost {
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, SaveError> {
        if request.prompt {
            return Err(SaveError::PromptNotSupported);
        }
        if !is_plain_relative(&request.destination) {
            return Err(SaveError::UnsafeDestination(request.destination));
        }

        let wanted = self.download_dir.join(&request.destination);
        if let Some(parent) = wanted.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let (final_path, reserved) = match request.conflict {
            ConflictAction::Uniquify => (reserve_unique_path(&wanted).await?, true),
            ConflictAction::Overwrite => (wanted, false),
        };
        let temp = temp_path(&final_path);

        let written = match &request.source {
            SaveSource::Handle(handle) => match self.handles.read(handle) {
                Some(text) => tokio::fs::write(&temp, text.as_bytes())
                    .await
                    .map_err(SaveError::from),
                None => Err(SaveError::UnknownHandle(handle.clone())),
            },
            SaveSource::Reference(url) => {
                let url = url.clone();
                let temp = temp.clone();
                let timeout = self.timeout;
                tokio::task::spawn_blocking(move || download_to(&url, &temp, timeout))
                    .await
                    .map_err(|e| SaveError::Task(e.to_string()))
                    .and_then(|r| r.map(|_| ()))
            }
        };
        let finished = match written {
            Ok(()) => tokio::fs::rename(&temp, &final_path).await.map_err(SaveError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = finished {
            let _ = tokio::fs::remove_file(&temp).await;
            if reserved {
                let _ = tokio::fs::remove_file(&final_path).await;
            }
            return Err(e);
        }
        tracing::debug!(path = %final_path.display(), "saved");
        Ok(final_path)
    }
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

/// `n`-th alternative for `wanted`: `<stem>-<n><ext>`, or `wanted` itself for 0.
pub fn numbered_path(wanted: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return wanted.to_path_buf();
    }
    let stem = wanted
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = wanted
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = wanted.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}-{}{}", stem, n, ext))
}

/// Claims the first free name among `wanted`, `<stem>-1<ext>`, ... by
/// creating it empty with `create_new`. The caller owns the returned path.
pub async fn reserve_unique_path(wanted: &Path) -> std::io::Result<PathBuf> {
    for n in 0u32.. {
        let candidate = numbered_path(wanted, n);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free name for {}", wanted.display()),
    ))
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Streams `url` into `dest` (blocking). Returns bytes written.
///
/// Fails only when the transfer itself fails (connection, timeout, local I/O).
pub fn download_to(url: &str, dest: &Path, timeout: Duration) -> Result<u64, SaveError> {
    let mut file = std::fs::File::create(dest)?;
    let mut easy = easy_for(url, timeout)?;
    let mut written = 0u64;
    let mut write_err: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_err {
        return Err(SaveError::Io(e));
    }
    performed?;

    // The host's download facility keeps whatever the server sent; a non-2xx
    // body is still a completed download.
    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        tracing::warn!(url, status, "reference download finished with non-success status");
    }
    file.flush()?;
    Ok(written)
}
