//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Connection (one of the credential sets below)
//! - `ELASTICSEARCH_CLOUD_ID` + `ELASTICSEARCH_API_KEY` - Elastic Cloud deployment
//! - `ELASTICSEARCH_URL` + `ELASTICSEARCH_API_KEY` - any cluster, API key auth
//! - `ELASTICSEARCH_URL` + `ELASTICSEARCH_USERNAME` + `ELASTICSEARCH_PASSWORD` - basic auth
//! - `ELASTICSEARCH_URL` - unauthenticated (local development)
//!
//! `ELASTICSEARCH_CLOUD_URL` is accepted as an alias of `ELASTICSEARCH_URL`.
//!
//! ## Optional
//! - `ELASTICSEARCH_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `RETAIL_INVENTORY_INDEX` - Inventory index (default: `retail_store_inventory`)
//! - `RETAIL_SHOPPING_INDEX` - Shopping index (default: `customer_shopping_data.csv`)
//! - `RETAIL_PRODUCTS_INDEX` - Product index (default: `products`)
//! - `RETAIL_REVIEWS_INDEX` - Review index (default: `womens_clothing_reviews`)
//! - `RETAIL_FAQS_INDEX` - FAQ index (default: `faqs_data`)
//! - `RETAIL_FIELD_TABLES` - Path to a YAML file overriding field names
//! - `RETAIL_LOW_STOCK_THRESHOLD` - Low stock band upper bound (default: 10)
//! - `RETAIL_MODERATE_STOCK_THRESHOLD` - Moderate stock band upper bound (default: 50)
//! - `RETAIL_EMBEDDING_MODEL_ID` - Inference model for semantic review search
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use retail_agents_core::FieldTables;
use retail_agents_core::classify::StockThresholds;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_EMBEDDING_MODEL: &str = ".multilingual-e5-small";

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
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error(
        "No search endpoint configured: set ELASTICSEARCH_URL or ELASTICSEARCH_CLOUD_ID \
         with ELASTICSEARCH_API_KEY"
    )]
    NoEndpoint,
    #[error("Invalid cloud id: {0}")]
    InvalidCloudId(String),
    #[error("Invalid field table file {0}: {1}")]
    FieldTables(String, String),
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RetailConfig {
    /// Search cluster connection
    pub connection: ConnectionConfig,
    /// Index names, field tables and thresholds
    pub settings: ToolSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl RetailConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            connection: ConnectionConfig::from_lookup(&lookup)?,
            settings: ToolSettings::from_lookup(&lookup)?,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Connection
// =============================================================================

/// Search cluster connection settings.
///
/// Every credential is optional here; [`resolve`](Self::resolve) picks the
/// first complete option. Implements `Debug` manually to redact secrets.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Cluster URL
    pub endpoint_url: Option<String>,
    /// Elastic Cloud deployment id
    pub cloud_id: Option<String>,
    /// API key (the base64 `id:key` form)
    pub api_key: Option<SecretString>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            cloud_id: None,
            api_key: None,
            username: None,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("cloud_id", &self.cloud_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// How requests authenticate.
#[derive(Clone)]
pub enum Credentials {
    /// `Authorization: ApiKey <key>`
    ApiKey(SecretString),
    /// `Authorization: Basic <base64(user:pass)>`
    Basic {
        /// Username
        username: String,
        /// Password
        password: SecretString,
    },
    /// No authorization header.
    None,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// Resolved cluster address and credentials.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Base URL requests are made against
    pub url: Url,
    /// Authentication scheme
    pub credentials: Credentials,
}

impl ConnectionConfig {
    /// Load connection settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for an unparseable timeout.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_secs = get_or_default(&lookup, "ELASTICSEARCH_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ELASTICSEARCH_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ELASTICSEARCH_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let api_key = get_optional(&lookup, "ELASTICSEARCH_API_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "ELASTICSEARCH_API_KEY") {
                tracing::warn!("ELASTICSEARCH_API_KEY validation warning: {e}");
            }
            SecretString::from(key)
        });

        Ok(Self {
            endpoint_url: get_optional(&lookup, "ELASTICSEARCH_URL")
                .or_else(|| get_optional(&lookup, "ELASTICSEARCH_CLOUD_URL")),
            cloud_id: get_optional(&lookup, "ELASTICSEARCH_CLOUD_ID"),
            api_key,
            username: get_optional(&lookup, "ELASTICSEARCH_USERNAME"),
            password: get_optional(&lookup, "ELASTICSEARCH_PASSWORD").map(SecretString::from),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Pick the first complete credential option, in priority order:
    /// cloud id with API key, URL with API key, URL with username and
    /// password, then URL alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoEndpoint` when no option is complete, and
    /// `ConfigError::InvalidCloudId` or `InvalidEnvVar` for malformed values.
    pub fn resolve(&self) -> Result<Endpoint, ConfigError> {
        if let (Some(cloud_id), Some(api_key)) = (&self.cloud_id, &self.api_key) {
            return Ok(Endpoint {
                url: decode_cloud_id(cloud_id)?,
                credentials: Credentials::ApiKey(api_key.clone()),
            });
        }

        let Some(raw_url) = &self.endpoint_url else {
            return Err(ConfigError::NoEndpoint);
        };
        let url = parse_endpoint(raw_url)?;

        let credentials = match (&self.api_key, &self.username, &self.password) {
            (Some(api_key), _, _) => Credentials::ApiKey(api_key.clone()),
            (None, Some(username), Some(password)) => Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Credentials::None,
        };
        Ok(Endpoint { url, credentials })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("ELASTICSEARCH_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "ELASTICSEARCH_URL".to_string(),
            format!("unsupported URL: {raw}"),
        ));
    }
    Ok(url)
}

/// Decode an Elastic Cloud id into the deployment's Elasticsearch URL.
///
/// A cloud id is `<name>:<base64("host$es_uuid$kibana_uuid")>`; the name
/// prefix is optional.
///
/// # Errors
///
/// Returns `ConfigError::InvalidCloudId` if the id cannot be decoded.
pub fn decode_cloud_id(cloud_id: &str) -> Result<Url, ConfigError> {
    let encoded = cloud_id
        .split_once(':')
        .map_or(cloud_id, |(_, rest)| rest)
        .trim();
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ConfigError::InvalidCloudId(e.to_string()))?;
    let decoded =
        String::from_utf8(bytes).map_err(|e| ConfigError::InvalidCloudId(e.to_string()))?;

    let mut parts = decoded.split('$');
    let host = parts.next().unwrap_or_default().trim();
    let es_uuid = parts.next().unwrap_or_default().trim();
    if host.is_empty() || es_uuid.is_empty() {
        return Err(ConfigError::InvalidCloudId(
            "expected host$es_uuid$kibana_uuid".to_string(),
        ));
    }

    // The host may carry an explicit port (`host:9243`).
    let (host, port) = match host.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) => (h, Some(p)),
        _ => (host, None),
    };
    let url = match port {
        Some(port) => format!("https://{es_uuid}.{host}:{port}"),
        None => format!("https://{es_uuid}.{host}"),
    };
    Url::parse(&url).map_err(|e| ConfigError::InvalidCloudId(e.to_string()))
}

// =============================================================================
// Tool settings
// =============================================================================

/// Index names per domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    /// Store inventory records.
    pub inventory: String,
    /// Customer shopping transactions.
    pub shopping: String,
    /// Product catalog.
    pub products: String,
    /// Clothing reviews with text embeddings.
    pub reviews: String,
    /// Customer support FAQs.
    pub faqs: String,
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            inventory: "retail_store_inventory".to_string(),
            shopping: "customer_shopping_data.csv".to_string(),
            products: "products".to_string(),
            reviews: "womens_clothing_reviews".to_string(),
            faqs: "faqs_data".to_string(),
        }
    }
}

/// Per-deployment data settings injected into the tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Index per domain
    pub indices: IndexNames,
    /// Field names per domain
    pub fields: FieldTables,
    /// Stock band thresholds
    pub thresholds: StockThresholds,
    /// Inference model id used to embed review search text
    pub embedding_model_id: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            indices: IndexNames::default(),
            fields: FieldTables::default(),
            thresholds: StockThresholds::default(),
            embedding_model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ToolSettings {
    /// Load tool settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable thresholds, inverted thresholds,
    /// or an unreadable field table file.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = IndexNames::default();
        let indices = IndexNames {
            inventory: get_or_default(&lookup, "RETAIL_INVENTORY_INDEX", &defaults.inventory),
            shopping: get_or_default(&lookup, "RETAIL_SHOPPING_INDEX", &defaults.shopping),
            products: get_or_default(&lookup, "RETAIL_PRODUCTS_INDEX", &defaults.products),
            reviews: get_or_default(&lookup, "RETAIL_REVIEWS_INDEX", &defaults.reviews),
            faqs: get_or_default(&lookup, "RETAIL_FAQS_INDEX", &defaults.faqs),
        };

        let fields = match get_optional(&lookup, "RETAIL_FIELD_TABLES") {
            Some(path) => load_field_tables(&path)?,
            None => FieldTables::default(),
        };

        let default_thresholds = StockThresholds::default();
        let thresholds = StockThresholds {
            low: get_threshold(&lookup, "RETAIL_LOW_STOCK_THRESHOLD", default_thresholds.low)?,
            moderate: get_threshold(
                &lookup,
                "RETAIL_MODERATE_STOCK_THRESHOLD",
                default_thresholds.moderate,
            )?,
        };
        if thresholds.low > thresholds.moderate {
            return Err(ConfigError::InvalidEnvVar(
                "RETAIL_LOW_STOCK_THRESHOLD".to_string(),
                format!(
                    "{} exceeds the moderate threshold {}",
                    thresholds.low, thresholds.moderate
                ),
            ));
        }

        Ok(Self {
            indices,
            fields,
            thresholds,
            embedding_model_id: get_or_default(
                &lookup,
                "RETAIL_EMBEDDING_MODEL_ID",
                DEFAULT_EMBEDDING_MODEL,
            ),
        })
    }
}

fn load_field_tables(path: &str) -> Result<FieldTables, ConfigError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FieldTables(path.to_string(), e.to_string()))?;
    FieldTables::from_yaml(&source)
        .map_err(|e| ConfigError::FieldTables(path.to_string(), e.to_string()))
}

fn get_threshold(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
    default: f64,
) -> Result<f64, ConfigError> {
    let Some(raw) = get_optional(lookup, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be a non-negative number".to_string(),
        ));
    }
    Ok(value)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable; blank values count as unset.
fn get_optional(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
