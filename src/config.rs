//! Runtime configuration read from the page URL.

use tracing::Level;

use crate::embed::{EmbedMode, query_pairs};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub embed: EmbedMode,
    /// From `?log=`; `info` unless given.
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embed: EmbedMode::default(),
            log_level: Level::INFO,
        }
    }
}

impl AppConfig {
    pub fn from_query(query: &str) -> Self {
        let log_level = query_pairs(query)
            .filter(|(key, _)| *key == "log")
            .find_map(|(_, value)| parse_level(value))
            .unwrap_or(Level::INFO);
        Self {
            embed: EmbedMode::from_query(query),
            log_level,
        }
    }

    /// Config for the current page, defaults outside a browser.
    pub fn from_location() -> Self {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .map(|search| Self::from_query(&search))
            .unwrap_or_default()
    }
}

pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flags_and_level() {
        let cfg = AppConfig::from_query("?noAudio=true&log=DEBUG");
        assert!(cfg.embed.no_audio);
        assert!(!cfg.embed.minimal);
        assert_eq!(cfg.log_level, Level::DEBUG);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(AppConfig::from_query("log=loud").log_level, Level::INFO);
        assert_eq!(AppConfig::from_query(""), AppConfig::default());
    }
}
