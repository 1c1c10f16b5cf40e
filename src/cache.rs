//! Offline copy of the static UI shell. Mirrors the lifecycle of an
//! installable worker: `install` populates one named cache generation,
//! `fetch` serves cache-first with an origin fallback (and the app shell as
//! a last resort for navigations), `activate` evicts every other generation
//! so exactly one is live at a time. Independent of the task store and the
//! scheduler; the only thing they share is the app data directory.

use std::fs;
use std::path::{Path, PathBuf};

/// Current cache generation. Bump the version suffix to invalidate old
/// installs on the next activation.
pub const CACHE_NAME: &str = "remindly-cache-v1";

/// Shell assets copied verbatim on install.
pub const SHELL_ASSETS: &[&str] = &["index.html", "static/js/bundle.js"];

/// The page served when a navigation cannot be satisfied any other way.
pub const APP_SHELL: &str = "index.html";

#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    MissingAsset(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io(err) => write!(f, "io error: {err}"),
            CacheError::MissingAsset(path) => write!(f, "asset not available: {path}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        CacheError::Io(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// A page load; falls back to the cached app shell when all else fails.
    Navigate,
    /// A subresource; a miss is a miss.
    Resource,
}

pub struct ShellCache {
    root: PathBuf,
    generation: String,
}

impl ShellCache {
    pub fn new(root: PathBuf) -> Self {
        Self::with_generation(root, CACHE_NAME)
    }

    pub fn with_generation(root: PathBuf, generation: &str) -> Self {
        Self {
            root,
            generation: generation.to_string(),
        }
    }

    fn generation_dir(&self) -> PathBuf {
        self.root.join(&self.generation)
    }

    /// Copies the shell-asset manifest from `origin` into the current
    /// generation. A missing manifest entry fails the whole install.
    pub fn install(&self, origin: &Path) -> Result<(), CacheError> {
        self.install_manifest(origin, SHELL_ASSETS)
    }

    pub fn install_manifest(&self, origin: &Path, assets: &[&str]) -> Result<(), CacheError> {
        for asset in assets {
            let source = origin.join(asset);
            if !source.is_file() {
                return Err(CacheError::MissingAsset((*asset).to_string()));
            }
            let target = self.generation_dir().join(asset);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target)?;
        }
        log::info!(
            "shell cache {} installed ({} assets)",
            self.generation,
            assets.len()
        );
        Ok(())
    }

    /// Cache first, then the origin, then (for navigations) the cached app
    /// shell.
    pub fn fetch(&self, origin: &Path, path: &str, mode: FetchMode) -> Result<Vec<u8>, CacheError> {
        let rel = normalize(path)?;
        if let Ok(bytes) = fs::read(self.generation_dir().join(rel)) {
            return Ok(bytes);
        }
        match fs::read(origin.join(rel)) {
            Ok(bytes) => Ok(bytes),
            Err(_) if mode == FetchMode::Navigate => {
                fs::read(self.generation_dir().join(APP_SHELL))
                    .map_err(|_| CacheError::MissingAsset(rel.to_string()))
            }
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Err(CacheError::MissingAsset(rel.to_string()))
                } else {
                    Err(CacheError::Io(err))
                }
            }
        }
    }

    /// Deletes every cache generation other than the current one. After this
    /// returns, exactly one generation is live.
    pub fn activate(&self) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(CacheError::Io(err)),
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if entry.file_name().to_str() == Some(self.generation.as_str()) {
                continue;
            }
            log::info!("evicting stale shell cache {:?}", entry.file_name());
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }
}

fn normalize(path: &str) -> Result<&str, CacheError> {
    let rel = path.trim_start_matches('/');
    if rel.split('/').any(|part| part == "..") {
        return Err(CacheError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path escapes cache root",
        )));
    }
    Ok(if rel.is_empty() { APP_SHELL } else { rel })
}
