//! Config discovery and loading

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ConfigStore, APP_NAME};
use crate::application::errors::{BotError, ConfigError};
use crate::infrastructure::logging::LogRouter;

/// Conventional config locations, in precedence order
pub fn default_search_paths() -> Vec<PathBuf> {
    let file_name = format!("{}.ini", APP_NAME);
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("conf").join(&file_name));
    }
    paths.push(Path::new("/etc").join(APP_NAME).join(&file_name));
    paths
}

/// Locates a config file, merges it into the store and reconfigures logging
pub struct ConfigLoader {
    store: Arc<ConfigStore>,
    router: LogRouter,
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new(store: Arc<ConfigStore>, router: LogRouter) -> Self {
        Self {
            store,
            router,
            search_paths: default_search_paths(),
        }
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load the explicit path if given, otherwise the first search path that
    /// exists. Returns the file that was applied, `None` when running on
    /// defaults. Logging is reconfigured before returning either way.
    pub fn load(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>, BotError> {
        let loaded = match explicit {
            Some(path) => {
                let contents = read_config(path)?;
                self.store.merge(&contents)?;
                Some(path.to_path_buf())
            }
            None => self.discover()?,
        };

        self.router.reconfigure(&self.store.snapshot())?;

        match &loaded {
            Some(path) => tracing::info!("Successfully loaded the configuration from {}", path.display()),
            None => tracing::debug!("No configuration file found, using defaults"),
        }
        Ok(loaded)
    }

    fn discover(&self) -> Result<Option<PathBuf>, ConfigError> {
        for path in &self.search_paths {
            if !path.is_file() {
                continue;
            }
            tracing::debug!("Trying to open config path: {}", path.display());
            match read_config(path) {
                Ok(contents) => {
                    self.store.merge(&contents)?;
                    return Ok(Some(path.clone()));
                }
                Err(ConfigError::FileUnreadable { source, .. })
                    if matches!(source.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) =>
                {
                    tracing::debug!("Unable to open config: {}: {}", path.display(), source);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::InvalidData => ConfigError::parse(0, format!("{} is not valid UTF-8", path.display())),
        _ => ConfigError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_search_paths() {
        let paths = default_search_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("conf/mcvouchy.ini"));
        assert_eq!(paths[1], PathBuf::from("/etc/mcvouchy/mcvouchy.ini"));
    }

    #[test]
    fn test_non_utf8_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("mcvouchy-loader-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("binary.ini");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let path = PathBuf::from("/nonexistent/mcvouchy.ini");
        assert!(matches!(read_config(&path), Err(ConfigError::FileUnreadable { .. })));
    }
}
