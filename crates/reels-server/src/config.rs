use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub frontend_url: String,
    pub require_verified_email: bool,
    /// `None` logs outgoing mail instead of sending it
    pub mail: Option<MailConfig>,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: Option<String>,
    pub currency: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("REELS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("REELS_JWT_SECRET is unset or still a placeholder. Set it in your .env file and restart.");
        }

        let port: u16 = var("REELS_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("REELS_PORT must be a port number")?;
        let token_ttl_minutes: i64 = var("REELS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|| "60".into())
            .parse()
            .context("REELS_TOKEN_TTL_MINUTES must be a whole number of minutes")?;
        if token_ttl_minutes <= 0 {
            bail!("REELS_TOKEN_TTL_MINUTES must be positive");
        }

        let mail = var("REELS_MAIL_API_URL").map(|api_url| MailConfig {
            api_url,
            api_key: var("REELS_MAIL_API_KEY"),
            from: var("REELS_MAIL_FROM").unwrap_or_else(|| "Make me reels <no-reply@makemereels.com>".into()),
        });

        Ok(Self {
            host: var("REELS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("REELS_DB_PATH").unwrap_or_else(|| "reels.db".into()).into(),
            jwt_secret,
            token_ttl_minutes,
            allowed_origins: var("REELS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().trim_end_matches('/').to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            frontend_url: var("REELS_FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            require_verified_email: var("REELS_REQUIRE_VERIFIED_EMAIL")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            mail,
            stripe_secret_key: var("REELS_STRIPE_SECRET_KEY"),
            stripe_api_base: var("REELS_STRIPE_API_BASE"),
            currency: var("REELS_CURRENCY").unwrap_or_else(|| "pln".into()).to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("REELS_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_path, PathBuf::from("reels.db"));
        assert_eq!(config.token_ttl_minutes, 60);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.currency, "pln");
        assert!(config.allowed_origins.is_empty());
        assert!(!config.require_verified_email);
        assert!(config.mail.is_none());
        assert!(config.stripe_secret_key.is_none());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(load(&[]).is_err());
        assert!(load(&[("REELS_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("REELS_JWT_SECRET", "a-real-secret"),
            ("REELS_PORT", "8080"),
            ("REELS_ALLOWED_ORIGINS", "https://a.test/, https://b.test"),
            ("REELS_FRONTEND_URL", "https://reels.test/"),
            ("REELS_REQUIRE_VERIFIED_EMAIL", "TRUE"),
            ("REELS_MAIL_API_URL", "https://mail.test/send"),
            ("REELS_CURRENCY", "EUR"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.allowed_origins, vec!["https://a.test", "https://b.test"]);
        assert_eq!(config.frontend_url, "https://reels.test");
        assert!(config.require_verified_email);
        assert_eq!(config.mail.unwrap().api_url, "https://mail.test/send");
        assert_eq!(config.currency, "eur");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(load(&[("REELS_JWT_SECRET", "a-real-secret"), ("REELS_PORT", "http")]).is_err());
    }
}
