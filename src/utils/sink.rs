//! Persistence of the files reconstructed by the receiver.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::dump_protocol::FileArtifact;
use crate::errors::Result;

/// Destination of completed files.
pub trait FileSink {
    /// Store `artifact` and return where it went.
    fn write(&mut self, artifact: &FileArtifact) -> Result<PathBuf>;
}

/// Writes every file flat into one directory, created on first use.
///
/// Only [`FileArtifact::name`] is used to build the destination path, so a
/// sender cannot place files outside of the directory. A file with the same
/// name is overwritten.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}
impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }
}
impl FileSink for DirectorySink {
    fn write(&mut self, artifact: &FileArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.name);
        fs::write(&path, &artifact.bytes)?;
        debug!("wrote {} byte(s) to {}", artifact.bytes.len(), path.display());
        Ok(path)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn artifact(name: &str, bytes: &[u8]) -> FileArtifact {
        FileArtifact {
            name: name.into(),
            relative_path: format!("/spiffs/{}", name),
            declared_size: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn creates_missing_directory() {
        let root = TempDir::new("sink").unwrap();
        let dir = root.path().join("dump").join("today");
        let mut sink = DirectorySink::new(&dir);

        let path = sink.write(&artifact("macs.bin", &[1, 2, 3])).unwrap();

        assert_eq!(path, dir.join("macs.bin"));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn overwrites_existing_file() {
        let root = TempDir::new("sink").unwrap();
        let mut sink = DirectorySink::new(root.path());

        sink.write(&artifact("macs.bin", &[1, 2, 3])).unwrap();
        let path = sink.write(&artifact("macs.bin", &[9])).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![9]);
    }
}
