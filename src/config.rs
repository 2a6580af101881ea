//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the upload backend lives.
    pub server: ServerCfg,
    /// Multipart upload settings.
    pub upload: UploadCfg,
    /// Uploads table polling.
    pub refresh: RefreshCfg,
    /// Log file location.
    pub logging: LoggingCfg,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCfg {
    /// Base URL without a trailing path, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

/// Upload form settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadCfg {
    /// Multipart field carrying the file.
    pub field_name: String,
    /// Accepted file extension, compared case-insensitively.
    pub extension: String,
}

/// Periodic refresh of the uploads table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshCfg {
    /// Seconds between two `GET /api/uploads` calls.
    pub interval_secs: u64,
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingCfg {
    /// File written next to the working directory.
    pub file: String,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Polling period, never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs.max(1))
    }

    /// Timeout applied to every backend request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for Config {
    /// Defaults match the backend's stock deployment.
    fn default() -> Self {
        Self {
            server: ServerCfg {
                base_url: "http://localhost:8080".into(),
                request_timeout_secs: 30,
            },
            upload: UploadCfg {
                field_name: "file".into(),
                extension: ".csv".into(),
            },
            refresh: RefreshCfg { interval_secs: 3 },
            logging: LoggingCfg {
                file: "csv_uploader_tui.log".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_default_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_reads_existing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.server.base_url = "http://uploads.internal:9000".into();
        cfg.refresh.interval_secs = 10;
        cfg.save(&path).unwrap();

        let loaded = Config::load_or_default(&path).unwrap();
        assert_eq!(loaded.server.base_url, "http://uploads.internal:9000");
        assert_eq!(loaded.refresh_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut cfg = Config::default();
        cfg.refresh.interval_secs = 0;
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
    }
}
