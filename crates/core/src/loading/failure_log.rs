use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Side channel that collects paths which could not be loaded.
pub trait FailureLog: Send {
    fn record(&self, path: &Path) -> io::Result<()>;
}

/// Appends one failing path per line to a text file.
pub struct FileFailureLog {
    target: PathBuf,
}

impl FileFailureLog {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl FailureLog for FileFailureLog {
    fn record(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.target)?;
        writeln!(file, "{}", path.display())
    }
}

/// Discards every record.
pub struct NullFailureLog;

impl FailureLog for NullFailureLog {
    fn record(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
