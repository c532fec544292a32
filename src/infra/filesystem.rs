//! Filesystem operations
//!
//! Handles report file creation.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// Upper bound on `-N` suffixes tried for one base name
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(path).map_err(|e| ReportError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write `content` to a new file `<dir>/<stem>.<ext>`, never replacing an
/// existing file.
///
/// When the name is taken, `<stem>-1.<ext>`, `<stem>-2.<ext>`, ... are
/// tried. Returns the path written.
pub fn write_new_file(
    dir: &Path,
    stem: &str,
    ext: &str,
    content: &str,
) -> Result<PathBuf, ReportError> {
    create_dir_all(dir)?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}-{attempt}.{ext}")
        };
        let path = dir.join(name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ReportError::WriteFile {
                    path,
                    error: e.to_string(),
                })
            }
        };

        file.write_all(content.as_bytes())
            .map_err(|e| ReportError::WriteFile {
                path: path.clone(),
                error: e.to_string(),
            })?;
        return Ok(path);
    }

    Err(ReportError::NoFreeName {
        dir: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs").join("nested");
        let path = write_new_file(&dir, "build-x", "md", "# hi\n").unwrap();
        assert_eq!(path, dir.join("build-x.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# hi\n");
    }

    #[test]
    fn test_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let first = write_new_file(temp.path(), "build-x", "md", "first").unwrap();
        let second = write_new_file(temp.path(), "build-x", "md", "second").unwrap();
        let third = write_new_file(temp.path(), "build-x", "md", "third").unwrap();

        assert_eq!(second, temp.path().join("build-x-1.md"));
        assert_eq!(third, temp.path().join("build-x-2.md"));
        assert_eq!(std::fs::read_to_string(first).unwrap(), "first");
        assert_eq!(std::fs::read_to_string(second).unwrap(), "second");
    }
}
