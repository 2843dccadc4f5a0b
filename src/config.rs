use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{CameraOverride, CameraOverrides};
use crate::data::{DEFAULT_BOUNDARIES_URL, DEFAULT_NEWS_ENDPOINT, DEFAULT_NEWS_LIMIT};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideEntry {
    pub id: u16,
    #[serde(flatten)]
    pub camera: CameraOverride,
}

/// User settings read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub news_endpoint: String,
    /// Articles requested per country.
    pub news_limit: u32,
    pub boundaries_url: String,
    pub hover_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub auto_rotate: bool,
    pub theme: ThemePreference,
    /// When false, only `camera_overrides` from the file apply.
    pub builtin_camera_overrides: bool,
    pub camera_overrides: Vec<OverrideEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_endpoint: DEFAULT_NEWS_ENDPOINT.to_string(),
            news_limit: DEFAULT_NEWS_LIMIT,
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_string(),
            hover_debounce_ms: 50,
            request_timeout_secs: 10,
            auto_rotate: true,
            theme: ThemePreference::default(),
            builtin_camera_overrides: true,
            camera_overrides: Vec::new(),
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("newsglobe").join("config.toml"))
    }

    /// Loads the user's settings, falling back to defaults on any problem.
    pub fn load() -> Settings {
        let Some(path) = Self::path() else {
            log::warn!("No config directory found, using default settings");
            return Settings::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            log::debug!("{} not found, using defaults", path.display());
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn hover_window(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Built-in overrides with the user's entries layered on top.
    pub fn camera_overrides(&self) -> CameraOverrides {
        let mut overrides = if self.builtin_camera_overrides {
            CameraOverrides::default()
        } else {
            CameraOverrides::empty()
        };
        for entry in &self.camera_overrides {
            overrides.insert(entry.id, entry.camera);
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.hover_window(), Duration::from_millis(50));
        assert_eq!(settings.news_endpoint, "http://localhost:8000/api/news/country/");
        assert_eq!(settings.news_limit, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "news_endpoint = \"http://news.local/api/\"\nnews_limit = 25\ntheme = \"light\"\nauto_rotate = false\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.news_endpoint, "http://news.local/api/");
        assert_eq!(settings.news_limit, 25);
        assert_eq!(settings.theme, ThemePreference::Light);
        assert!(!settings.auto_rotate);
        assert_eq!(settings.boundaries_url, DEFAULT_BOUNDARIES_URL);
    }

    #[test]
    fn camera_overrides_merge_over_builtins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[camera_overrides]]
id = 840
altitude = 2.2

[[camera_overrides]]
id = 250
lat = 46.5
lng = 2.5
"#,
        )
        .unwrap();

        let overrides = Settings::load_from(&path).unwrap().camera_overrides();
        let usa = overrides.get(840).unwrap();
        assert_eq!(usa.altitude, Some(2.2));
        assert_eq!(usa.lat, None);
        assert_eq!(overrides.get(250).unwrap().lat, Some(46.5));
        assert!(overrides.get(643).is_some());
    }

    #[test]
    fn builtin_overrides_can_be_switched_off() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "builtin_camera_overrides = false\n\n[[camera_overrides]]\nid = 36\naltitude = 1.0\n",
        )
        .unwrap();

        let overrides = Settings::load_from(&path).unwrap().camera_overrides();
        assert!(overrides.get(643).is_none());
        assert_eq!(overrides.get(36).unwrap().altitude, Some(1.0));
        assert_eq!(overrides.get(36).unwrap().lat, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hover_debounce_ms = \"soon\"").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
