use chrono::Duration;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// What to do when the storage backend stops accepting reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragePolicy {
    /// Surface every backend failure to the caller.
    FailLoudly,
    /// Keep the session in memory for the rest of this store's lifetime.
    #[default]
    DegradeToMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown storage policy: {0} (expected \"fail\" or \"degrade\")")]
pub struct ParsePolicyError(pub String);

impl FromStr for StoragePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail_loudly" | "strict" => Ok(StoragePolicy::FailLoudly),
            "degrade" | "degrade_to_memory" | "memory" => Ok(StoragePolicy::DegradeToMemory),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Namespace shared by the four session keys.
    pub key_prefix: String,
    /// Lifetime applied when the backend does not send one.
    pub default_lifetime: Duration,
    pub storage_policy: StoragePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_prefix: "salon_".to_string(),
            default_lifetime: Duration::seconds(DEFAULT_LIFETIME_SECS),
            storage_policy: StoragePolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Missing or unparsable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            key_prefix: lookup("SESSION_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            default_lifetime: lookup("SESSION_DEFAULT_LIFETIME_SECS")
                .and_then(|v| v.trim().parse().ok())
                .and_then(Duration::try_seconds)
                .unwrap_or(defaults.default_lifetime),
            storage_policy: match lookup("SESSION_STORAGE_POLICY") {
                Some(raw) => raw.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}, using {:?}", e, defaults.storage_policy);
                    defaults.storage_policy
                }),
                None => defaults.storage_policy,
            },
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_storage_policy(mut self, policy: StoragePolicy) -> Self {
        self.storage_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();

        assert_eq!(config.key_prefix, "salon_");
        assert_eq!(config.default_lifetime, Duration::seconds(3600));
        assert_eq!(config.storage_policy, StoragePolicy::DegradeToMemory);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fail".parse(), Ok(StoragePolicy::FailLoudly));
        assert_eq!("Degrade".parse(), Ok(StoragePolicy::DegradeToMemory));
        assert!("sometimes".parse::<StoragePolicy>().is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let env = vars(&[
            ("SESSION_KEY_PREFIX", "kiosk_"),
            ("SESSION_DEFAULT_LIFETIME_SECS", "900"),
            ("SESSION_STORAGE_POLICY", "strict"),
        ]);

        let config = SessionConfig::from_lookup(|name| env.get(name).cloned());

        assert_eq!(config.key_prefix, "kiosk_");
        assert_eq!(config.default_lifetime, Duration::seconds(900));
        assert_eq!(config.storage_policy, StoragePolicy::FailLoudly);
    }

    #[test]
    fn test_from_lookup_falls_back_on_bad_values() {
        let env = vars(&[
            ("SESSION_DEFAULT_LIFETIME_SECS", "an hour"),
            ("SESSION_STORAGE_POLICY", "sometimes"),
        ]);

        let config = SessionConfig::from_lookup(|name| env.get(name).cloned());

        assert_eq!(config.key_prefix, "salon_");
        assert_eq!(config.default_lifetime, Duration::seconds(3600));
        assert_eq!(config.storage_policy, StoragePolicy::DegradeToMemory);
    }

    #[test]
    fn test_from_lookup_rejects_out_of_range_lifetime() {
        let env = vars(&[("SESSION_DEFAULT_LIFETIME_SECS", &i64::MAX.to_string())]);

        let config = SessionConfig::from_lookup(|name| env.get(name).cloned());

        assert_eq!(config.default_lifetime, Duration::seconds(3600));
    }
}
