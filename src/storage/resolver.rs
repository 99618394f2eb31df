use crate::base::neterror::NetError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use url::Url;

pub const DOCUMENTS: &str = "DOCUMENTS";
pub const DATA: &str = "DATA";
pub const CACHE: &str = "CACHE";
pub const EXTERNAL: &str = "EXTERNAL";
pub const EXTERNAL_STORAGE: &str = "EXTERNAL_STORAGE";

/// Maps a `(file_path, file_directory)` pair to a concrete file.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, file_path: &str, directory: Option<&str>) -> Result<PathBuf, NetError>;

    /// Shared directories need a storage permission before use.
    fn is_public_directory(&self, directory: Option<&str>) -> bool {
        matches!(directory, Some(DOCUMENTS) | Some(EXTERNAL_STORAGE))
    }
}

/// Resolver backed by a table of symbolic directory names.
///
/// Without a directory, the path must be absolute or a `file://` URL.
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    directories: HashMap<String, PathBuf>,
}

impl DirectoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Desktop defaults derived from `HOME` and the XDG variables.
    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let xdg = |var: &str, fallback: &str| {
            std::env::var_os(var)
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(fallback))
        };

        Self::new()
            .with_directory(DOCUMENTS, home.join("Documents"))
            .with_directory(DATA, xdg("XDG_DATA_HOME", ".local/share"))
            .with_directory(CACHE, xdg("XDG_CACHE_HOME", ".cache"))
            .with_directory(EXTERNAL, home.clone())
            .with_directory(EXTERNAL_STORAGE, home.clone())
    }

    pub fn with_directory(mut self, name: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        self.directories.insert(name.into(), base.into());
        self
    }

    pub fn directory(&self, name: &str) -> Option<&Path> {
        self.directories.get(name).map(PathBuf::as_path)
    }
}

impl PathResolver for DirectoryResolver {
    fn resolve(&self, file_path: &str, directory: Option<&str>) -> Result<PathBuf, NetError> {
        let invalid = || NetError::InvalidPath {
            path: file_path.to_string(),
        };

        let Some(directory) = directory else {
            if file_path.starts_with("file:") {
                return Url::parse(file_path)
                    .ok()
                    .and_then(|u| u.to_file_path().ok())
                    .ok_or_else(invalid);
            }
            let path = PathBuf::from(file_path);
            return if path.is_absolute() {
                Ok(path)
            } else {
                Err(invalid())
            };
        };

        let base = self.directory(directory).ok_or_else(|| NetError::InvalidPath {
            path: format!("{}:{}", directory, file_path),
        })?;

        let relative = Path::new(file_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(invalid());
        }
        Ok(base.join(relative))
    }
}
