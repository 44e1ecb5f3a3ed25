//! Expansion options and the config file they can be loaded from.

use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOOKBEHIND_HOURS, DEFAULT_MAX_INSTANCES};
use crate::error::{ExpandError, ExpandResult};
use crate::time::parse_tzid;

/// Knobs for a single expansion run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandOptions {
    /// Zone for floating and date-only values
    pub local_tz: Tz,
    /// Recurrence candidates examined per event before giving up
    pub max_instances: u16,
    /// How far before the window the primary recurrence iterator starts
    pub lookbehind: Duration,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            local_tz: system_timezone(),
            max_instances: DEFAULT_MAX_INSTANCES,
            lookbehind: Duration::hours(DEFAULT_LOOKBEHIND_HOURS),
        }
    }
}

impl ExpandOptions {
    pub fn with_timezone(local_tz: Tz) -> Self {
        ExpandOptions {
            local_tz,
            ..Self::default()
        }
    }
}

/// The zone the host is configured for, UTC if it can't be determined.
pub fn system_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC)
}

/// Configuration at ~/.config/icsview/config.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IcsviewConfig {
    /// IANA zone name used for floating times; system zone when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u16>,

    /// humantime duration, e.g. "1day" or "36h"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookbehind: Option<String>,
}

impl IcsviewConfig {
    pub fn config_path() -> ExpandResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ExpandError::Config("Could not determine config directory".into()))?
            .join("icsview");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file at the default location, or defaults if it
    /// doesn't exist.
    pub fn load() -> ExpandResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> ExpandResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ExpandError::Config(e.to_string()))
    }

    /// Turn the file's settings into options, filling gaps with defaults.
    pub fn options(&self) -> ExpandResult<ExpandOptions> {
        let defaults = ExpandOptions::default();

        let local_tz = match &self.timezone {
            Some(name) => parse_tzid(name)
                .map_err(|_| ExpandError::Config(format!("Unknown timezone '{}'", name)))?,
            None => defaults.local_tz,
        };

        let lookbehind = match &self.lookbehind {
            Some(s) => {
                let std_dur = humantime::parse_duration(s)
                    .map_err(|e| ExpandError::Config(format!("Invalid lookbehind '{}': {}", s, e)))?;
                Duration::from_std(std_dur)
                    .map_err(|e| ExpandError::Config(format!("Invalid lookbehind '{}': {}", s, e)))?
            }
            None => defaults.lookbehind,
        };

        Ok(ExpandOptions {
            local_tz,
            max_instances: self.max_instances.unwrap_or(defaults.max_instances),
            lookbehind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_file_contents() {
        let config: IcsviewConfig = toml::from_str(
            r#"
timezone = "Europe/Berlin"
max_instances = 500
lookbehind = "36h"
"#,
        )
        .unwrap();

        let options = config.options().unwrap();
        assert_eq!(options.local_tz, chrono_tz::Europe::Berlin);
        assert_eq!(options.max_instances, 500);
        assert_eq!(options.lookbehind, Duration::hours(36));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: IcsviewConfig = toml::from_str("").unwrap();
        let options = config.options().unwrap();
        assert_eq!(options.max_instances, DEFAULT_MAX_INSTANCES);
        assert_eq!(options.lookbehind, Duration::hours(DEFAULT_LOOKBEHIND_HOURS));
    }

    #[test]
    fn test_bad_timezone_is_a_config_error() {
        let config = IcsviewConfig {
            timezone: Some("Nowhere/Special".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.options(), Err(ExpandError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config =
            IcsviewConfig::load_from(Path::new("/nonexistent/icsview/config.toml")).unwrap();
        assert!(config.timezone.is_none());
    }
}
