//! Artifact validation against pinned content fingerprints.
//!
//! A user-selected file (model weights, trace data) is only trusted when its
//! content hash matches the fingerprint recorded for it. The state is derived
//! on every call; nothing is cached between checks.

use std::{
    fs::{self, File},
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Outcome of classifying a candidate file against an expected fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactState {
    /// The file exists and its fingerprint matches.
    Valid,
    /// No regular file exists at the path.
    Missing,
    /// The file exists but its contents differ from the recorded fingerprint.
    Changed,
}

/// Hash function used to fingerprint artifacts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

/// Errors raised while fingerprinting an existing file.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Classify `path` against `expected` using the given hash function.
pub fn classify(
    path: &Path,
    expected: &str,
    algorithm: FingerprintAlgorithm,
) -> Result<ArtifactState, ArtifactError> {
    classify_with(path, expected, |path| fingerprint_file(path, algorithm))
}

/// Classify `path` against `expected` with a caller-supplied fingerprint function.
///
/// Only an absent path is [`ArtifactState::Missing`]. Other stat failures and
/// I/O failures from `fingerprint` are returned as errors.
pub fn classify_with<F>(
    path: &Path,
    expected: &str,
    fingerprint: F,
) -> Result<ArtifactState, ArtifactError>
where
    F: FnOnce(&Path) -> Result<String, ArtifactError>,
{
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(ArtifactState::Missing);
        }
        Err(source) => return Err(read_error(path, source)),
    };
    if !metadata.is_file() {
        return Ok(ArtifactState::Missing);
    }
    let actual = fingerprint(path)?;
    if normalize_fingerprint(&actual) == normalize_fingerprint(expected) {
        Ok(ArtifactState::Valid)
    } else {
        Ok(ArtifactState::Changed)
    }
}

/// Compute the lowercase hex fingerprint of a file's contents.
pub fn fingerprint_file(path: &Path, algorithm: FingerprintAlgorithm) -> Result<String, ArtifactError> {
    let mut file = File::open(path).map_err(|source| read_error(path, source))?;
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    match algorithm {
        FingerprintAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let read = file.read(&mut buf).map_err(|source| read_error(path, source))?;
                if read == 0 {
                    break;
                }
                hasher.update(&buf[..read]);
            }
            Ok(format!("{:x}", hasher.finalize()))
        }
        FingerprintAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let read = file.read(&mut buf).map_err(|source| read_error(path, source))?;
                if read == 0 {
                    break;
                }
                hasher.update(&buf[..read]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
    }
}

/// Trim and lowercase a hex fingerprint so user-entered values compare cleanly.
pub fn normalize_fingerprint(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn read_error(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    }
}
