//! Shield configuration.
//!
//! A flat, typed settings record with validation, JSON persistence, and
//! change listeners. The interception pipeline re-reads the two toggles it
//! cares about on every request, so updates take effect immediately.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Valid range for the UI auto-refresh interval.
const REFRESH_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 1_000..=60_000;

/// Valid range for log retention.
const MAX_LOG_ENTRIES_RANGE: std::ops::RangeInclusive<usize> = 50..=1_000;

/// Errors from validating or persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("refresh interval out of range: {0} ms")]
    RefreshIntervalOutOfRange(u64),

    #[error("max log entries out of range: {0}")]
    MaxLogEntriesOutOfRange(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Verbosity the UI log view filters at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// The flat settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Master switch for the interception pipeline.
    pub interception_enabled: bool,
    /// Whether verdicts escalate to block rules.
    pub block_malicious_urls: bool,
    pub auto_refresh: bool,
    pub refresh_interval_ms: u64,
    pub notifications_enabled: bool,
    pub log_level: LogLevel,
    pub max_log_entries: usize,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interception_enabled: true,
            block_malicious_urls: true,
            auto_refresh: true,
            refresh_interval_ms: 5_000,
            notifications_enabled: true,
            log_level: LogLevel::Info,
            max_log_entries: 200,
            theme: Theme::Light,
        }
    }
}

impl Settings {
    /// Reject values outside their permitted ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !REFRESH_INTERVAL_RANGE_MS.contains(&self.refresh_interval_ms) {
            return Err(SettingsError::RefreshIntervalOutOfRange(
                self.refresh_interval_ms,
            ));
        }
        if !MAX_LOG_ENTRIES_RANGE.contains(&self.max_log_entries) {
            return Err(SettingsError::MaxLogEntriesOutOfRange(
                self.max_log_entries,
            ));
        }
        Ok(())
    }
}

type Listener = Box<dyn Fn(&Settings) + Send + Sync>;

/// Live settings store shared across components.
///
/// Reads are cheap; the pipeline calls [`interception_enabled`] and
/// [`block_malicious_urls`] on every observed request.
///
/// [`interception_enabled`]: SettingsManager::interception_enabled
/// [`block_malicious_urls`]: SettingsManager::block_malicious_urls
pub struct SettingsManager {
    inner: RwLock<Settings>,
    path: Option<PathBuf>,
    listeners: Mutex<Vec<Listener>>,
}

impl SettingsManager {
    /// In-memory store with default settings; nothing is persisted.
    pub fn with_defaults() -> Self {
        Self {
            inner: RwLock::new(Settings::default()),
            path: None,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or unreadable. Updates are persisted back to the same path.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match Self::read_file(&path) {
            Ok(settings) => {
                info!("settings loaded from {}", path.display());
                settings
            }
            Err(e) => {
                warn!(
                    "failed to load settings from {}, using defaults: {}",
                    path.display(),
                    e
                );
                Settings::default()
            }
        };

        Self {
            inner: RwLock::new(settings),
            path: Some(path),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Conventional settings location under the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("sentinel-shield").join("settings.json"))
    }

    pub fn snapshot(&self) -> Settings {
        self.inner.read().unwrap().clone()
    }

    pub fn interception_enabled(&self) -> bool {
        self.inner.read().unwrap().interception_enabled
    }

    pub fn block_malicious_urls(&self) -> bool {
        self.inner.read().unwrap().block_malicious_urls
    }

    pub fn max_log_entries(&self) -> usize {
        self.inner.read().unwrap().max_log_entries
    }

    /// Validate, apply, persist, then notify listeners.
    pub fn update(&self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        {
            let mut inner = self.inner.write().unwrap();
            *inner = settings.clone();
        }
        self.persist(&settings)?;
        self.notify_listeners(&settings);
        Ok(())
    }

    /// Flip the interception master switch. Returns the new state.
    pub fn toggle_interception(&self) -> Result<bool, SettingsError> {
        let mut settings = self.snapshot();
        settings.interception_enabled = !settings.interception_enabled;
        let enabled = settings.interception_enabled;
        self.update(settings)?;
        Ok(enabled)
    }

    /// Register a callback invoked after every successful update.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&Settings) + Send + Sync + 'static,
    {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    fn notify_listeners(&self, settings: &Settings) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(settings);
        }
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Settings, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.interception_enabled);
        assert!(settings.block_malicious_urls);
        assert_eq!(settings.refresh_interval_ms, 5_000);
        assert_eq!(settings.max_log_entries, 200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_bounds() {
        let mut settings = Settings::default();
        settings.refresh_interval_ms = 500;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::RefreshIntervalOutOfRange(500))
        ));

        let mut settings = Settings::default();
        settings.max_log_entries = 10;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MaxLogEntriesOutOfRange(10))
        ));
    }

    #[test]
    fn test_update_rejects_invalid() {
        let manager = SettingsManager::with_defaults();
        let mut settings = manager.snapshot();
        settings.refresh_interval_ms = 0;

        assert!(manager.update(settings).is_err());
        // Store unchanged after the rejected update.
        assert_eq!(manager.snapshot().refresh_interval_ms, 5_000);
    }

    #[test]
    fn test_toggle_interception() {
        let manager = SettingsManager::with_defaults();
        assert!(manager.interception_enabled());

        let enabled = manager.toggle_interception().unwrap();
        assert!(!enabled);
        assert!(!manager.interception_enabled());

        let enabled = manager.toggle_interception().unwrap();
        assert!(enabled);
    }

    #[test]
    fn test_listener_sees_update() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let manager = SettingsManager::with_defaults();
        let seen = Arc::new(AtomicBool::new(false));
        let seen_clone = Arc::clone(&seen);
        manager.add_listener(move |settings| {
            assert!(!settings.block_malicious_urls);
            seen_clone.store(true, Ordering::SeqCst);
        });

        let mut settings = manager.snapshot();
        settings.block_malicious_urls = false;
        manager.update(settings).unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let manager = SettingsManager::load("/nonexistent/sentinel/settings.json");
        assert_eq!(manager.snapshot(), Settings::default());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"interceptionEnabled\":true"));
        assert!(json.contains("\"blockMaliciousUrls\":true"));

        // Partial documents merge over defaults.
        let parsed: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(parsed.theme, Theme::Dark);
        assert!(parsed.interception_enabled);
    }
}
