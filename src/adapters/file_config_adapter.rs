//! INI file configuration adapter.

use crate::domain::error::ConfigError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ConfigError::Parse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ConfigError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ConfigError::Parse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }

    fn invalid(section: &str, key: &str, reason: String) -> ConfigError {
        ConfigError::Invalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, ConfigError> {
        self.get_string(section, key)
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| {
                    Self::invalid(section, key, format!("expected a whole number, got '{raw}'"))
                })
            })
            .transpose()
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
        self.get_string(section, key)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| Self::invalid(section, key, format!("expected a number, got '{raw}'")))
            })
            .transpose()
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get_string(section, key)
            .map(|raw| {
                Self::parse_bool(&raw)
                    .ok_or_else(|| Self::invalid(section, key, format!("expected true or false, got '{raw}'")))
            })
            .transpose()
    }
}
