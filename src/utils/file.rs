use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Reads a whole file as UTF-8 text
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Writes `content` to `path`, replacing any existing file
pub fn write_file(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.txt");
        write_file(&path, "ss://abc\n").unwrap();
        assert_eq!(read_file(&path).unwrap(), "ss://abc\n");
    }

    #[test]
    fn test_read_missing_file_keeps_path() {
        let err = read_file("/nonexistent/nodes.txt").unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, Path::new("/nonexistent/nodes.txt")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
