use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "zoomsdk.json";

/// Persistent SDK initialization settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SdkConfig {
    #[serde(default = "default_true")]
    pub enable_log: bool,
    #[serde(default = "default_log_size")]
    pub log_size: u32,
    #[serde(default = "default_domain")]
    pub default_domain: String,
}

fn default_true() -> bool {
    true
}

fn default_log_size() -> u32 {
    500
}

fn default_domain() -> String {
    "zoom.us".to_string()
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            enable_log: true,
            log_size: default_log_size(),
            default_domain: default_domain(),
        }
    }
}

impl SdkConfig {
    /// Domain to hand to the SDK; blank input falls back to `default_domain`.
    pub fn resolve_domain(&self, domain: &str) -> String {
        if domain.trim().is_empty() {
            self.default_domain.clone()
        } else {
            domain.to_string()
        }
    }
}

pub struct ConfigStore {
    config: Mutex<SdkConfig>,
    file_path: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join(CONFIG_FILE);
        let config = Self::load(&file_path);
        Self {
            config: Mutex::new(config),
            file_path,
        }
    }

    pub fn get(&self) -> SdkConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn set_enable_log(&self, enabled: bool) {
        self.config.lock().unwrap().enable_log = enabled;
        self.save();
    }

    pub fn set_log_size(&self, size: u32) {
        self.config.lock().unwrap().log_size = size;
        self.save();
    }

    pub fn set_default_domain(&self, domain: String) {
        self.config.lock().unwrap().default_domain = domain;
        self.save();
    }

    fn save(&self) {
        let config = self.config.lock().unwrap().clone();
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.file_path, json) {
                    tracing::warn!("failed to persist sdk config: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to serialize sdk config: {e}"),
        }
    }

    fn load(path: &Path) -> SdkConfig {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable sdk config: {e}");
                SdkConfig::default()
            }),
            Err(_) => SdkConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_default_config() {
        let c = SdkConfig::default();
        assert!(c.enable_log);
        assert_eq!(c.log_size, 500);
        assert_eq!(c.default_domain, "zoom.us");
    }

    #[test]
    fn test_new_creates_defaults_when_no_file() {
        let dir = temp_dir();
        let store = ConfigStore::new(dir.path().to_str().unwrap());
        assert_eq!(store.get(), SdkConfig::default());
    }

    #[test]
    fn test_setters_persist() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        {
            let store = ConfigStore::new(path);
            store.set_enable_log(false);
            store.set_log_size(1024);
            store.set_default_domain("zoomgov.com".to_string());
        }
        let store = ConfigStore::new(path);
        let c = store.get();
        assert!(!c.enable_log);
        assert_eq!(c.log_size, 1024);
        assert_eq!(c.default_domain, "zoomgov.com");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = temp_dir();
        fs::write(dir.path().join(CONFIG_FILE), "{{ nope").unwrap();
        let store = ConfigStore::new(dir.path().to_str().unwrap());
        assert_eq!(store.get(), SdkConfig::default());
    }

    #[test]
    fn test_partial_json_uses_serde_defaults() {
        let dir = temp_dir();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"log_size":64}"#).unwrap();
        let store = ConfigStore::new(dir.path().to_str().unwrap());
        let c = store.get();
        assert_eq!(c.log_size, 64);
        assert!(c.enable_log);
        assert_eq!(c.default_domain, "zoom.us");
    }

    #[test]
    fn test_resolve_domain() {
        let c = SdkConfig::default();
        assert_eq!(c.resolve_domain(""), "zoom.us");
        assert_eq!(c.resolve_domain("  "), "zoom.us");
        assert_eq!(c.resolve_domain("example.zoom.us"), "example.zoom.us");
        // A non-blank domain reaches the SDK exactly as given.
        assert_eq!(c.resolve_domain(" example.zoom.us "), " example.zoom.us ");
    }
}
