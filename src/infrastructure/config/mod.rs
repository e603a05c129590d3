//! Configuration management
//!
//! Settings are `(section, key) -> string` pairs. Defaults are seeded once and
//! INI files are merged on top; every reader works against an immutable
//! [`ConfigSnapshot`] that is swapped atomically on reload.

pub mod loader;
pub mod parser;
pub mod settings;

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::application::errors::ConfigError;

pub use loader::ConfigLoader;
pub use settings::{McVouchySettings, SecretToken};

/// Application name, used for the config section and search paths
pub const APP_NAME: &str = "mcvouchy";

/// Section whose keys every other section inherits
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Raw `section -> key -> value` table
pub type ConfigTable = BTreeMap<String, BTreeMap<String, String>>;

const DEFAULT_SETTINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "logging",
        &[
            ("date_format", "%Y-%m-%d %H:%M:%S %z"),
            ("cli_target", "stderr"),
            ("cli_level", "warning"),
            ("cli_format", "[%(asctime)s] [%(levelname) 7s] [%(name)  21s] %(message)s"),
            ("file_level", "info"),
            ("syslog_level", "warn"),
        ],
    ),
    (
        APP_NAME,
        &[
            ("airlock_channel", "#welcome"),
            ("limits_window", "1d"),
            ("limits_exempt_roles", "Moderator"),
            ("verified_role", "Verified"),
            ("invitations_limit", "3"),
            ("vouch_limit", "3"),
            ("vouch_threshold", "3"),
            ("auto_vouch_by_inviter", "true"),
            ("invitation_lifetime", "1d"),
        ],
    ),
];

/// Built-in defaults every snapshot starts from
pub fn default_settings() -> ConfigTable {
    DEFAULT_SETTINGS
        .iter()
        .map(|(section, entries)| {
            let entries = entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (section.to_string(), entries)
        })
        .collect()
}

/// Immutable, fully merged view of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    sections: ConfigTable,
}

impl ConfigSnapshot {
    pub fn from_table(table: ConfigTable) -> Self {
        let mut snapshot = Self::default();
        snapshot.apply(table);
        snapshot
    }

    /// Overwrite matching entries pointwise; everything else is kept
    fn apply(&mut self, table: ConfigTable) {
        for (section, entries) in table {
            let target = self.sections.entry(section).or_default();
            for (key, value) in entries {
                target.insert(key.to_lowercase(), value);
            }
        }
    }

    fn merged(&self, table: ConfigTable) -> Self {
        let mut next = self.clone();
        next.apply(table);
        next
    }

    pub fn get(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.get_opt(section, key)
            .ok_or_else(|| ConfigError::key_not_found(section, key))
    }

    /// Lookup for settings that are allowed to be absent. Keys missing from
    /// a section fall back to the `[DEFAULT]` section.
    pub fn get_opt(&self, section: &str, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        [section, DEFAULT_SECTION]
            .iter()
            .find_map(|name| self.sections.get(*name)?.get(&key))
            .map(String::as_str)
    }

    pub fn get_int<T: std::str::FromStr>(&self, section: &str, key: &str) -> Result<T, ConfigError> {
        let raw = self.get(section, key)?;
        raw.trim()
            .parse()
            .map_err(|_| ConfigError::invalid_value(section, key, format!("not an integer: {}", raw)))
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        let raw = self.get(section, key)?;
        match raw.trim().to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(ConfigError::invalid_value(section, key, format!("not a boolean: {}", raw))),
        }
    }

    /// Durations are written as `<n><unit>` with unit one of `s m h d w`;
    /// a bare number is seconds.
    pub fn get_duration(&self, section: &str, key: &str) -> Result<Duration, ConfigError> {
        let raw = self.get(section, key)?;
        parse_duration(raw)
            .ok_or_else(|| ConfigError::invalid_value(section, key, format!("not a duration: {}", raw)))
    }

    /// Comma separated list, blank items dropped
    pub fn get_list(&self, section: &str, key: &str) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .get(section, key)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

}

fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let scale = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };
    Some(Duration::from_secs(amount.checked_mul(scale)?))
}

/// Holder of the current configuration snapshot
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigStore {
    /// Seed the store with its defaults
    pub fn load(defaults: ConfigTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(ConfigSnapshot::from_table(defaults))),
        }
    }

    /// Parse INI text and merge it over the current snapshot.
    ///
    /// Nothing is applied when parsing fails.
    pub fn merge(&self, contents: &str) -> Result<(), ConfigError> {
        let table = parser::parse(contents)?;
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let next = current.merged(table);
        *current = Arc::new(next);
        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        self.snapshot().get(section, key).map(str::to_string)
    }

    /// The snapshot current at the time of the call
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::load(default_settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_present() {
        let store = ConfigStore::default();
        assert_eq!(store.get("logging", "cli_level").unwrap(), "warning");
        assert_eq!(store.get("logging", "cli_target").unwrap(), "stderr");
        assert_eq!(store.get("mcvouchy", "vouch_threshold").unwrap(), "3");
    }

    #[test]
    fn test_missing_key() {
        let store = ConfigStore::default();
        let err = store.get("mcvouchy", "secret_token").unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound { .. }));
    }

    #[test]
    fn test_default_section_fills_gaps() {
        let store = ConfigStore::default();
        store
            .merge("[DEFAULT]\nsecret_token = shared\ncli_level = debug\n")
            .unwrap();

        assert_eq!(store.get("mcvouchy", "secret_token").unwrap(), "shared");
        assert_eq!(store.get("anything", "secret_token").unwrap(), "shared");
        assert_eq!(store.get("logging", "cli_level").unwrap(), "warning");
    }

    #[test]
    fn test_merge_is_pointwise() {
        let store = ConfigStore::default();
        store
            .merge("[logging]\ncli_level = debug\n\n[mcvouchy]\nsecret_token = abc\n")
            .unwrap();

        assert_eq!(store.get("logging", "cli_level").unwrap(), "debug");
        assert_eq!(store.get("logging", "syslog_level").unwrap(), "warn");
        assert_eq!(store.get("mcvouchy", "secret_token").unwrap(), "abc");
        assert_eq!(store.get("mcvouchy", "verified_role").unwrap(), "Verified");
    }

    #[test]
    fn test_unknown_sections_are_kept() {
        let store = ConfigStore::default();
        store.merge("[extras]\nflavour = vanilla\n").unwrap();
        assert_eq!(store.get("extras", "flavour").unwrap(), "vanilla");
    }

    #[test]
    fn test_failed_merge_leaves_snapshot() {
        let store = ConfigStore::default();
        let before = store.snapshot();
        assert!(store.merge("[logging]\ncli_level = debug\nnot a setting\n").is_err());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_old_snapshot_unaffected_by_merge() {
        let store = ConfigStore::default();
        let before = store.snapshot();
        store.merge("[logging]\ncli_level = error\n").unwrap();

        assert_eq!(before.get("logging", "cli_level").unwrap(), "warning");
        assert_eq!(store.snapshot().get("logging", "cli_level").unwrap(), "error");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let store = ConfigStore::default();
        store.merge("[logging]\nCLI_Level = info\n").unwrap();
        assert_eq!(store.get("logging", "cli_level").unwrap(), "info");
        assert_eq!(store.get("logging", "CLI_LEVEL").unwrap(), "info");
    }

    #[test]
    fn test_typed_getters() {
        let store = ConfigStore::default();
        store
            .merge("[t]\nflag = Off\nwindow = 2h\nroles = Mod, Admin,,\nbad = soon\n")
            .unwrap();
        let snap = store.snapshot();

        assert!(!snap.get_bool("t", "flag").unwrap());
        assert_eq!(snap.get_duration("t", "window").unwrap(), Duration::from_secs(7200));
        assert_eq!(snap.get_list("t", "roles").unwrap(), vec!["Mod", "Admin"]);
        assert!(matches!(
            snap.get_duration("t", "bad"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(snap.get_int::<u32>("mcvouchy", "vouch_limit").unwrap(), 3);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("1w"), Some(Duration::from_secs(604_800)));
        assert_eq!(parse_duration("d"), None);
        assert_eq!(parse_duration("3y"), None);
    }
}
