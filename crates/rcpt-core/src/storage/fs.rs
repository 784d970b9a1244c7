//! Filesystem-backed document storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{BlobStorage, Result};

/// Stores each document as a file in a single upload directory.
///
/// Location references are the file paths themselves.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Use `root` as the upload directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a collision-free file name from the client-supplied name.
    fn unique_file_name(name: &str) -> String {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let tag = Uuid::new_v4().simple().to_string();
        format!("{}_{}_{}", timestamp, &tag[..8], base)
    }
}

impl BlobStorage for FsStorage {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.root.join(Self::unique_file_name(name));
        fs::write(&path, bytes)?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    fn exists(&self, location_ref: &str) -> bool {
        Path::new(location_ref).is_file()
    }

    fn get(&self, location_ref: &str) -> Result<Vec<u8>> {
        Ok(fs::read(location_ref)?)
    }

    fn remove(&self, location_ref: &str) -> Result<()> {
        match fs::remove_file(location_ref) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
