use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use runcrew_crypto::keys::key_from_base64;

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 30;

#[derive(Clone)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    /// Field-cipher key for phone numbers. Rotating it orphans every
    /// stored phone number.
    pub pii_key: [u8; 32],
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl ServiceConfig {
    pub fn new(db_path: impl Into<PathBuf>, pii_key: [u8; 32], jwt_secret: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            pii_key,
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    /// Load `.env` if present, then read `RUNCREW_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("RUNCREW_DB_PATH").unwrap_or_else(|| "runcrew.db".into());

        let jwt_secret = lookup("RUNCREW_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("RUNCREW_JWT_SECRET is unset or still a placeholder");
        }

        let raw_key = lookup("RUNCREW_PII_KEY").context("RUNCREW_PII_KEY is unset")?;
        let pii_key = key_from_base64(&raw_key).context("RUNCREW_PII_KEY must be a base64 32-byte key")?;

        let token_ttl_hours = match lookup("RUNCREW_TOKEN_TTL_HOURS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("RUNCREW_TOKEN_TTL_HOURS is not a number: {}", v))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if token_ttl_hours <= 0 {
            bail!("RUNCREW_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            db_path: db_path.into(),
            pii_key,
            jwt_secret,
            token_ttl_hours,
        })
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("db_path", &self.db_path)
            .field("pii_key", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use runcrew_crypto::keys::{generate_key, key_to_base64};

    use super::*;

    fn lookup_from(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_with_defaults() {
        let key = generate_key();
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("RUNCREW_JWT_SECRET", "s3cret-value".into()),
            ("RUNCREW_PII_KEY", key_to_base64(&key)),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("runcrew.db"));
        assert_eq!(config.pii_key, key);
        assert_eq!(config.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
    }

    #[test]
    fn rejects_placeholder_secret() {
        let err = ServiceConfig::from_lookup(lookup_from(&[
            ("RUNCREW_JWT_SECRET", "dev-secret-change-me".into()),
            ("RUNCREW_PII_KEY", key_to_base64(&generate_key())),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("RUNCREW_JWT_SECRET"));
    }

    #[test]
    fn rejects_missing_or_short_key() {
        assert!(
            ServiceConfig::from_lookup(lookup_from(&[("RUNCREW_JWT_SECRET", "x".into())])).is_err()
        );
        assert!(
            ServiceConfig::from_lookup(lookup_from(&[
                ("RUNCREW_JWT_SECRET", "x".into()),
                ("RUNCREW_PII_KEY", "c2hvcnQ=".into()),
            ]))
            .is_err()
        );
    }

    #[test]
    fn rejects_bad_ttl() {
        let key = key_to_base64(&generate_key());
        for ttl in ["soon", "0"] {
            assert!(
                ServiceConfig::from_lookup(lookup_from(&[
                    ("RUNCREW_JWT_SECRET", "x".into()),
                    ("RUNCREW_PII_KEY", key.clone()),
                    ("RUNCREW_TOKEN_TTL_HOURS", ttl.into()),
                ]))
                .is_err()
            );
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = ServiceConfig::new("x.db", [9u8; 32], "top-secret");
        let out = format!("{config:?}");
        assert!(!out.contains("top-secret"));
        assert!(out.contains("x.db"));
    }
}
