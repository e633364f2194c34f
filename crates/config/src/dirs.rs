use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::OptionExt;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";

/// Per-user directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    config: PathBuf,
    data: PathBuf,
    home: PathBuf,
}

impl Dirs {
    pub fn new(config: impl Into<PathBuf>, data: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            data: data.into(),
            home: home.into(),
        }
    }

    /// Platform directories of the current user (`~/.config/mailport`,
    /// `~/.local/share/mailport` on Linux).
    pub fn discover() -> Result<Self> {
        let project = ProjectDirs::from("", "", "mailport").ok_or_raise(|| ErrorKind::NoHomeDirectory)?;
        let base = BaseDirs::new().ok_or_raise(|| ErrorKind::NoHomeDirectory)?;
        Ok(Self::new(project.config_dir(), project.data_dir(), base.home_dir()))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILENAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    pub fn home_dir(&self) -> &Path {
        &self.home
    }
}
