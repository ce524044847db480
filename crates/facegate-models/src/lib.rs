//! facegate-models — where the liveness model lives and whether it is intact.
//!
//! The model itself is an opaque ONNX artifact supplied by the deployment.
//! This crate only resolves its default location and checks its SHA-256
//! digest when the deployment pins one.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the liveness model inside the model directory.
pub const DEFAULT_MODEL_FILE: &str = "liveness-model.onnx";

#[derive(Error, Debug)]
pub enum ModelIntegrityError {
    #[error("model file not found: {path}")]
    MissingModel { path: PathBuf },

    #[error("failed to open model file: {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read model file: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model checksum mismatch ({path})\n  expected: {expected}\n  got:      {got}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        got: String,
    },
}

/// Default model directory: `$XDG_DATA_HOME/facegate/models`, falling back
/// to `$HOME/.local/share/facegate/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facegate")
        .join("models")
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file_hex(path: &Path) -> Result<String, ModelIntegrityError> {
    let mut file = fs::File::open(path).map_err(|source| ModelIntegrityError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| ModelIntegrityError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check that `path` exists and hashes to `expected_sha256` (hex, case-insensitive).
pub fn verify_file_sha256(path: &Path, expected_sha256: &str) -> Result<(), ModelIntegrityError> {
    if !path.exists() {
        return Err(ModelIntegrityError::MissingModel {
            path: path.to_path_buf(),
        });
    }

    let digest = sha256_file_hex(path)?;
    if !digest.eq_ignore_ascii_case(expected_sha256.trim()) {
        return Err(ModelIntegrityError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected_sha256.trim().to_string(),
            got: digest,
        });
    }

    tracing::debug!(path = %path.display(), "model checksum verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "facegate-models-test-{tag}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn verify_file_sha256_rejects_missing() {
        let path = scratch_dir("missing").join("nope.onnx");
        let err = verify_file_sha256(&path, "00").unwrap_err();
        assert!(matches!(err, ModelIntegrityError::MissingModel { .. }));
    }

    #[test]
    fn verify_file_sha256_rejects_mismatch() {
        let dir = scratch_dir("mismatch");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, b"hello").unwrap();

        let err = verify_file_sha256(&path, "00").unwrap_err();
        assert!(matches!(err, ModelIntegrityError::ChecksumMismatch { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn verify_file_sha256_accepts_match_any_case() {
        let dir = scratch_dir("match");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, b"hello").unwrap();

        let digest = sha256_file_hex(&path).unwrap();
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        verify_file_sha256(&path, &digest).unwrap();
        verify_file_sha256(&path, &digest.to_uppercase()).unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sha256_file_hex_streams_large_files() {
        let dir = scratch_dir("large");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let expected = format!("{:x}", Sha256::digest(&data));
        assert_eq!(sha256_file_hex(&path).unwrap(), expected);

        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn sha256_file_hex_reports_read_failure() {
        let dir = scratch_dir("dir");
        fs::create_dir_all(&dir).unwrap();

        let err = sha256_file_hex(&dir).unwrap_err();
        assert!(matches!(err, ModelIntegrityError::Read { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn default_model_dir_ends_in_facegate_models() {
        let dir = default_model_dir();
        assert!(dir.ends_with("facegate/models"));
    }
}
