//! Upload and download plumbing
//!
//! Uploads are checked against the page's accepted kind by file name
//! before a single byte is read. Downloads go through a transient
//! [`BlobUrl`] that is revoked as soon as the sink has saved it.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::artifact::{ArtifactBuffer, MimeKind};
use crate::error::{Error, Result};

/// A file picked by the user
pub trait FileSource {
    /// Name as shown to the user, including the extension
    fn name(&self) -> &str;

    /// Read the whole file
    fn read_all(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// A file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        tokio::fs::read(self.path.clone())
    }
}

/// Bytes already held by the host, e.g. handed over by a browser
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let bytes = self.bytes.clone();
        async move { Ok(bytes) }
    }
}

/// Check the extension of `source` against `accept`, then read it
pub async fn read_upload<F: FileSource>(source: &F, accept: MimeKind) -> Result<ArtifactBuffer> {
    let name = source.name().to_string();
    if MimeKind::from_file_name(&name) != Some(accept) {
        return Err(Error::InvalidFileType {
            name,
            expected: accept.extension().to_string(),
        });
    }
    let bytes = source
        .read_all()
        .await
        .map_err(|e| Error::ReadError {
            name: name.clone(),
            source: e,
        })?;
    debug!(file = %name, bytes = bytes.len(), "upload read");
    Ok(ArtifactBuffer::new(bytes, accept, name))
}

/// Live transient references to artifacts being downloaded
#[derive(Debug, Default)]
pub struct BlobRegistry {
    inner: Mutex<Blobs>,
}

#[derive(Debug, Default)]
struct Blobs {
    next_id: u64,
    live: HashMap<u64, ArtifactBuffer>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transient reference; it is revoked when dropped
    pub fn register(&self, artifact: ArtifactBuffer) -> BlobUrl<'_> {
        let mut blobs = self.inner.lock();
        blobs.next_id += 1;
        let id = blobs.next_id;
        blobs.live.insert(id, artifact.clone());
        BlobUrl {
            registry: self,
            id,
            url: format!("blob:docflow/{}", id),
            artifact,
        }
    }

    /// Number of references not yet revoked
    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    fn revoke(&self, id: u64) {
        self.inner.lock().live.remove(&id);
    }
}

/// A registered artifact, revoked on drop
#[derive(Debug)]
pub struct BlobUrl<'a> {
    registry: &'a BlobRegistry,
    id: u64,
    url: String,
    artifact: ArtifactBuffer,
}

impl BlobUrl<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn artifact(&self) -> &ArtifactBuffer {
        &self.artifact
    }
}

impl Drop for BlobUrl<'_> {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
        debug!(url = %self.url, "blob revoked");
    }
}

/// Where downloads end up
pub trait DownloadSink {
    /// Save the referenced artifact under its suggested filename
    fn save(&mut self, blob: &BlobUrl<'_>) -> Result<PathBuf>;
}

/// Saves downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, blob: &BlobUrl<'_>) -> Result<PathBuf> {
        let artifact = blob.artifact();
        let path = self.dir.join(artifact.filename());
        let write_error = |e: io::Error| Error::WriteError {
            name: path.display().to_string(),
            source: e,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_error)?;
        std::fs::write(&path, artifact.bytes()).map_err(write_error)?;
        Ok(path)
    }
}

/// Hand `artifact` to `sink` through a transient reference
///
/// The reference is revoked right after the save, whether it succeeded
/// or not.
pub fn download(
    registry: &BlobRegistry,
    sink: &mut dyn DownloadSink,
    artifact: &ArtifactBuffer,
) -> Result<PathBuf> {
    let blob = registry.register(artifact.clone());
    let saved = sink.save(&blob);
    drop(blob);
    let path = saved?;
    debug!(path = %path.display(), mime = %artifact.kind(), "download saved");
    Ok(path)
}
