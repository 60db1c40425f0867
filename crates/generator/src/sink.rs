//! Output sinks for rendered IDL text
//!
//! A sink is only acquired once the whole file has rendered, so a failed
//! conversion never leaves a partial file behind.

use openapi2idl_common::{ConvertError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for a rendered IDL file
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink {
    fn write_all(&mut self, content: &str) -> Result<()>;
}

/// Writes to a file, creating parent directories as needed
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn write_all(&mut self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ConvertError::Serialization(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(&self.path, content).map_err(|e| {
            ConvertError::Serialization(format!(
                "Failed to write {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %self.path.display(), bytes = content.len(), "wrote IDL file");
        Ok(())
    }
}

/// Writes to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_all(&mut self, content: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("pets.proto");

        let mut sink = FileSink::new(&path);
        sink.write_all("syntax = \"proto3\";\n").unwrap();

        assert_eq!(sink.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "syntax = \"proto3\";\n");
    }
}
