use std::path::PathBuf;

use crate::api::ServerConfig;
use crate::service::CounterPolicy;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data_dir: PathBuf,
    pub counter_policy: CounterPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data_dir: PathBuf::from("./data"),
            counter_policy: CounterPolicy::default(),
        }
    }
}

impl Config {
    /// Creates a config from environment variables.
    ///
    /// Reads:
    /// - `PORT`: Listening port (default: 3000)
    /// - `STUDENTDESK_HOST`: Bind address (default: 0.0.0.0)
    /// - `STUDENTDESK_DATA_DIR`: RocksDB directory (default: ./data)
    /// - `STUDENTDESK_COUNTER_POLICY`: `reconcile` or `independent`
    ///   (default: reconcile)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unparsable values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %v, "Invalid PORT, using default");
                default.server.port
            }),
            None => default.server.port,
        };

        let host = lookup("STUDENTDESK_HOST").unwrap_or(default.server.host);

        let data_dir = lookup("STUDENTDESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(default.data_dir);

        let counter_policy = match lookup("STUDENTDESK_COUNTER_POLICY") {
            Some(v) => v.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Invalid counter policy, using default");
                default.counter_policy
            }),
            None => default.counter_policy,
        };

        Self {
            server: ServerConfig { host, port },
            data_dir,
            counter_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.counter_policy, CounterPolicy::Reconcile);
    }

    #[test]
    fn reads_all_keys() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("STUDENTDESK_HOST", "127.0.0.1"),
            ("STUDENTDESK_DATA_DIR", "/var/lib/studentdesk"),
            ("STUDENTDESK_COUNTER_POLICY", "independent"),
        ]));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/studentdesk"));
        assert_eq!(config.counter_policy, CounterPolicy::Independent);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "eighty"),
            ("STUDENTDESK_COUNTER_POLICY", "sometimes"),
        ]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.counter_policy, CounterPolicy::Reconcile);
    }
}
