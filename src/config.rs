use crate::export::DEFAULT_PAGE_SIZE;
use std::{env, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/sales.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// When set, `/api` requests must carry `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
    pub report_page_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let api_token = lookup("APP_API_TOKEN")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            port: parsed(&lookup, "PORT", DEFAULT_PORT),
            data_path,
            api_token,
            report_page_size: parsed(&lookup, "APP_REPORT_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
        }
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw:?}, using the default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/sales.json"));
        assert_eq!(config.api_token, None);
        assert_eq!(config.report_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn values_are_read_and_bad_numbers_fall_back() {
        let config = config(&[
            ("PORT", "9090"),
            ("APP_DATA_PATH", "/tmp/sales.json"),
            ("APP_API_TOKEN", " secret "),
            ("APP_REPORT_PAGE_SIZE", "many"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_path, PathBuf::from("/tmp/sales.json"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.report_page_size, DEFAULT_PAGE_SIZE);
    }
}
