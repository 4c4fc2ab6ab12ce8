//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL of the storefront (feed and sitemap links)
//! - `CMS_URL` - Base URL of the headless CMS (e.g., `https://cms.example.ru`)
//! - `CMS_API_TOKEN` - CMS API token (read catalog, create leads/orders)
//! - `TELEGRAM_BOT_TOKEN` - Notification bot token
//! - `TELEGRAM_CHAT_ID` - Chat that receives lead and order notifications
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CMS_MEDIA_URL` - Base URL for uploaded media (default: `CMS_URL`)
//! - `TELEGRAM_API_URL` - Bot API base URL (default: <https://api.telegram.org>)
//! - `CURRENCY_API_URL` - Daily exchange rates JSON (default: CBR mirror)
//! - `GEOCODER_URL` - Reverse geocoder base URL (default: Nominatim)
//! - `CITIES_PATH` - City list JSON (default: crates/storefront/data/cities.json)
//! - `CACHE_DIR` - Durable cache directory; empty disables the disk tier
//!   (default: .cache/storefront)
//! - `CACHE_CAPACITY` - In-memory cache entry limit (default: 1000)
//! - `CATALOG_CACHE_TTL_SECS` - Attribute facet cache lifetime (default: 3600)
//! - `CACHE_VERSION` - Cache version tag (default: crate version)
//! - `SHOP_NAME` / `SHOP_COMPANY` - Shop metadata for the product feed
//! - `FEED_ROOT_CATEGORY` - Limit the product feed to one category subtree (slug)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0 / 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Headless CMS connection
    pub cms: CmsConfig,
    /// Notification bot
    pub telegram: TelegramConfig,
    /// Third-party lookups (exchange rates, geocoding)
    pub upstreams: UpstreamConfig,
    /// Two-tier cache settings
    pub cache: CacheConfig,
    /// Shop metadata and feed scope
    pub shop: ShopConfig,
    /// City list used by the city picker
    pub cities_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Headless CMS configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CmsConfig {
    /// CMS base URL (REST API lives under `/api`)
    pub url: String,
    /// API token with read access to the catalog and create access to submissions
    pub api_token: SecretString,
    /// Base URL that relative media paths resolve against
    pub media_url: String,
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("url", &self.url)
            .field("api_token", &"[REDACTED]")
            .field("media_url", &self.media_url)
            .finish()
    }
}

/// Notification bot configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_url: String,
    /// Bot token
    pub bot_token: SecretString,
    /// Target chat ID
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Third-party lookup endpoints.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Daily exchange rates JSON document
    pub currency_url: String,
    /// Reverse geocoder base URL
    pub geocoder_url: String,
}

/// Two-tier cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory for the durable tier; `None` keeps the cache memory-only
    pub dir: Option<PathBuf>,
    /// Maximum number of in-memory entries
    pub capacity: u64,
    /// Lifetime of aggregated catalog data (attribute facets)
    pub catalog_ttl: Duration,
    /// Version tag; entries written under another tag are ignored
    pub version: String,
}

/// Shop metadata for the product feed.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Short shop name
    pub name: String,
    /// Legal company name
    pub company: String,
    /// Optional category slug the feed is limited to (root included)
    pub feed_root_category: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = trim_trailing_slash(get_required_env("STOREFRONT_BASE_URL")?);

        let cache_dir = get_env_or_default("CACHE_DIR", ".cache/storefront");
        let cache = CacheConfig {
            dir: (!cache_dir.trim().is_empty()).then(|| PathBuf::from(cache_dir)),
            capacity: get_parsed_or_default("CACHE_CAPACITY", "1000")?,
            catalog_ttl: Duration::from_secs(get_parsed_or_default(
                "CATALOG_CACHE_TTL_SECS",
                "3600",
            )?),
            version: get_env_or_default("CACHE_VERSION", env!("CARGO_PKG_VERSION")),
        };

        Ok(Self {
            host,
            port,
            base_url,
            cms: CmsConfig::from_env()?,
            telegram: TelegramConfig::from_env()?,
            upstreams: UpstreamConfig {
                currency_url: get_env_or_default(
                    "CURRENCY_API_URL",
                    "https://www.cbr-xml-daily.ru/daily_json.js",
                ),
                geocoder_url: trim_trailing_slash(get_env_or_default(
                    "GEOCODER_URL",
                    "https://nominatim.openstreetmap.org",
                )),
            },
            cache,
            shop: ShopConfig {
                name: get_env_or_default("SHOP_NAME", "Промтех"),
                company: get_env_or_default("SHOP_COMPANY", "ООО «Промтех»"),
                feed_root_category: get_optional_env("FEED_ROOT_CATEGORY"),
            },
            cities_path: PathBuf::from(get_env_or_default(
                "CITIES_PATH",
                "crates/storefront/data/cities.json",
            )),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute storefront URL for a site path.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl CmsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = trim_trailing_slash(get_required_env("CMS_URL")?);
        let media_url = get_optional_env("CMS_MEDIA_URL").map_or_else(|| url.clone(), trim_trailing_slash);
        Ok(Self {
            url,
            api_token: get_validated_secret("CMS_API_TOKEN")?,
            media_url,
        })
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: trim_trailing_slash(get_env_or_default(
                "TELEGRAM_API_URL",
                "https://api.telegram.org",
            )),
            bot_token: get_validated_secret("TELEGRAM_BOT_TOKEN")?,
            chat_id: get_required_env("TELEGRAM_CHAT_ID")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a token is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Paste the token issued by the service."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration pointing every upstream at `upstream`.
    pub(crate) fn test_config(upstream: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://promtech.test".to_string(),
            cms: CmsConfig {
                url: upstream.to_string(),
                api_token: SecretString::from("cms-token"),
                media_url: upstream.to_string(),
            },
            telegram: TelegramConfig {
                api_url: upstream.to_string(),
                bot_token: SecretString::from("bot-token"),
                chat_id: "-100200300".to_string(),
            },
            upstreams: UpstreamConfig {
                currency_url: format!("{upstream}/daily_json.js"),
                geocoder_url: upstream.to_string(),
            },
            cache: CacheConfig {
                dir: None,
                capacity: 100,
                catalog_ttl: Duration::from_secs(60),
                version: "test".to_string(),
            },
            shop: ShopConfig {
                name: "Промтех".to_string(),
                company: "ООО «Промтех»".to_string(),
                feed_root_category: None,
            },
            cities_path: PathBuf::from("data/cities.json"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-cms-token-here", "CMS_API_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "CMS_API_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_bot_token() {
        let result = validate_secret_strength(
            "7351938476:AAGk2mR8vQxZ1pLw9tYhN3bC5dF7jE0uIsO",
            "TELEGRAM_BOT_TOKEN",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr_and_absolute_url() {
        let config = test_config("http://127.0.0.1:9");

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);

        assert_eq!(
            config.absolute_url("/product/press-1"),
            "https://promtech.test/product/press-1"
        );
        assert_eq!(config.absolute_url(""), "https://promtech.test/");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = test_config("http://127.0.0.1:9");
        let cms = format!("{:?}", config.cms);
        let bot = format!("{:?}", config.telegram);

        assert!(cms.contains("[REDACTED]"));
        assert!(!cms.contains("cms-token"));
        assert!(bot.contains("-100200300"));
        assert!(!bot.contains("bot-token"));
    }
}
