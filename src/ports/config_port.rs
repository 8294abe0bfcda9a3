//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for a missing key and an error for a
//! present but unparsable value, so callers can apply their own defaults.

use crate::domain::error::ConfigError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, ConfigError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, ConfigError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, ConfigError>;
}
