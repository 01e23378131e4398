use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{
    app::ports::ConfigSourcePort,
    domain::errors::{DomainError, Result},
};

pub const MAX_CONFIG_BYTES: u64 = 4 * 1024 * 1024;

/// `.vscode/mcp.json` under the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".vscode").join("mcp.json")
}

#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_error(&self, what: impl std::fmt::Display) -> DomainError {
        DomainError::ConfigLoad(format!("{}: {}", self.path.display(), what))
    }
}

impl ConfigSourcePort for FileConfigSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Vec<u8>> {
        let meta = std::fs::metadata(&self.path).map_err(|e| self.load_error(e))?;
        if !meta.is_file() {
            return Err(self.load_error("config must be a regular file"));
        }
        if meta.len() > MAX_CONFIG_BYTES {
            return Err(self.load_error(format!(
                "config too large: {} bytes (max {})",
                meta.len(),
                MAX_CONFIG_BYTES
            )));
        }

        let file = std::fs::File::open(&self.path).map_err(|e| self.load_error(e))?;
        let mut buf = Vec::with_capacity(meta.len() as usize);
        file.take(MAX_CONFIG_BYTES + 1)
            .read_to_end(&mut buf)
            .map_err(|e| self.load_error(e))?;
        if buf.len() as u64 > MAX_CONFIG_BYTES {
            return Err(self.load_error(format!(
                "config too large: {} bytes (max {})",
                buf.len(),
                MAX_CONFIG_BYTES
            )));
        }
        Ok(buf)
    }
}

/// Config bytes held in memory; used for embedded defaults and tests.
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    label: String,
    bytes: Vec<u8>,
}

impl StaticConfigSource {
    pub fn new(label: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.to_string(),
            bytes: bytes.into(),
        }
    }
}

impl ConfigSourcePort for StaticConfigSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
