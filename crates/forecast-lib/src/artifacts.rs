//! Artifact loading with size and checksum validation
//!
//! Pretrained artifacts are opaque blobs read once at startup. Any failure
//! here is fatal for the predictor.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metadata about a loaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub checksum: String,
    pub loaded_at: i64,
}

/// Raw artifact contents plus metadata
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub bytes: Vec<u8>,
    pub info: ArtifactInfo,
}

/// Read an artifact from disk, enforcing `max_bytes` and an optional
/// expected SHA-256 checksum.
pub fn load_artifact(
    path: &Path,
    max_bytes: u64,
    expected_sha256: Option<&str>,
) -> Result<LoadedArtifact> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Artifact not found at {}", path.display()))?;

    if !metadata.is_file() {
        anyhow::bail!("Artifact path {} is not a file", path.display());
    }

    if metadata.len() > max_bytes {
        anyhow::bail!(
            "Artifact {} is {} bytes, exceeding maximum {}",
            path.display(),
            metadata.len(),
            max_bytes
        );
    }

    let bytes =
        fs::read(path).with_context(|| format!("Failed to read artifact {}", path.display()))?;

    if bytes.is_empty() {
        anyhow::bail!("Artifact {} is empty", path.display());
    }

    let checksum = compute_checksum(&bytes);
    if let Some(expected) = expected_sha256 {
        if !checksum.eq_ignore_ascii_case(expected.trim()) {
            anyhow::bail!(
                "Checksum mismatch for {}: expected {}, got {}",
                path.display(),
                expected,
                checksum
            );
        }
        info!(path = %path.display(), checksum = %checksum, "Artifact checksum validated");
    }

    debug!(path = %path.display(), size = bytes.len(), "Artifact loaded");

    Ok(LoadedArtifact {
        info: ArtifactInfo {
            path: path.to_path_buf(),
            size_bytes: bytes.len() as u64,
            checksum,
            loaded_at: chrono::Utc::now().timestamp(),
        },
        bytes,
    })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
