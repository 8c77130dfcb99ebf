//! JSON profile files in a single directory.
//!
//! Each profile is one pretty-printed JSON file named `<brand>_<model>.json`.
//! The store only deals with files; parsing and validation live in
//! `irkey_core::profile`, so a file that loads here is guaranteed to contain
//! only known keys and special commands.

use std::path::{Path, PathBuf};

use irkey_core::Profile;
use thiserror::Error;
use tracing::{info, warn};

const EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("profile {0:?} not found")]
    NotFound(String),

    #[error("invalid profile name {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names of all `*.json` profiles, sorted.  A missing directory
    /// lists as empty.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads a profile by file name; the `.json` suffix is optional.
    pub fn load(&self, name: &str) -> Result<Profile, StoreError> {
        let path = self.path_for(name)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Profile::from_json(&text).map_err(|source| StoreError::Parse { path, source })
    }

    /// Writes `profile` as `<brand>_<model>.json` and returns that file name.
    pub fn save(&self, profile: &Profile) -> Result<String, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let name = profile.file_name();
        let path = self.path_for(&name)?;
        let text = profile.to_json_pretty()?;
        std::fs::write(&path, text).map_err(|source| StoreError::Io { path, source })?;
        info!(profile = %name, "profile saved");
        Ok(name)
    }

    /// Saves the built-in default profile if no profile exists yet.
    ///
    /// Returns the file name of the created profile, or `None` if the
    /// directory already had profiles.
    pub fn ensure_default(&self) -> Result<Option<String>, StoreError> {
        if !self.list()?.is_empty() {
            return Ok(None);
        }
        self.save(&Profile::default_vizio()).map(Some)
    }

    /// Picks the profile to start with.
    ///
    /// Order: `requested` (failure is an error), then `last_used` (failure is
    /// logged), then the first profile that loads, then a freshly created
    /// default profile.
    pub fn resolve_startup_profile(
        &self,
        requested: Option<&str>,
        last_used: Option<&str>,
    ) -> Result<(String, Profile), StoreError> {
        if let Some(name) = requested {
            let profile = self.load(name)?;
            return Ok((with_extension(name), profile));
        }

        if let Some(name) = last_used {
            match self.load(name) {
                Ok(profile) => return Ok((with_extension(name), profile)),
                Err(err) => warn!("last used profile unavailable: {err}"),
            }
        }

        for name in self.list()? {
            match self.load(&name) {
                Ok(profile) => return Ok((name, profile)),
                Err(err) => warn!("skipping profile: {err}"),
            }
        }

        info!("no usable profile found, creating the default profile");
        let profile = Profile::default_vizio();
        let name = self.save(&profile)?;
        Ok((name, profile))
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let file = with_extension(name);
        let is_plain = Path::new(&file)
            .file_name()
            .is_some_and(|f| f == file.as_str());
        if name.trim().is_empty() || name.starts_with('.') || !is_plain || file.contains(['/', '\\']) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(file))
    }
}

fn with_extension(name: &str) -> String {
    if Path::new(name).extension().is_some_and(|ext| ext == EXTENSION) {
        name.to_string()
    } else {
        format!("{name}.{EXTENSION}")
    }
}
