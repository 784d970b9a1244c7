//! Configuration structures for the receipt service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the rcpt service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Where documents and records are kept.
    pub storage: StorageConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Document validation configuration.
    pub validation: ValidationConfig,

    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory receiving uploaded document bytes.
    pub upload_dir: PathBuf,

    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            database_path: PathBuf::from("receipts.db"),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Document validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Also check size, PDF magic bytes and structure, not only existence.
    pub strict: bool,

    /// Largest document accepted by strict validation.
    pub max_document_bytes: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_document_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Upper bound on a single extractor call.
    pub timeout_secs: u64,

    /// Minimum text length to consider a PDF as carrying text.
    pub min_text_length: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            min_text_length: 10,
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Socket address string for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
