//! Reading and writing the profile document.

use std::path::Path;

use readmepulse_shared::{ReadmeError, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ReadmeError::io(path, e))
}

/// Write via a temporary sibling file and rename, so readers never see a
/// half-written document.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReadmeError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| ReadmeError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ReadmeError::io(path, e))?;

    debug!(path = %path.display(), size = content.len(), "document written");
    Ok(())
}

/// Hex SHA-256 of `content`.
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "readmepulse-document-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_replaces_and_leaves_no_temp() {
        let dir = temp_dir();
        let path = dir.join("README.md");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(read_document(&path).unwrap(), "new");
        assert!(!dir.join(".README.md.tmp").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_document(Path::new("/nonexistent/readmepulse/README.md")).unwrap_err();
        assert!(matches!(err, ReadmeError::Io { .. }));
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
