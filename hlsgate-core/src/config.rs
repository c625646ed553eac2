use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::storage::AddressingStyle;

/// Longest expiry a SigV4 presigned URL may carry (7 days)
pub const MAX_PRESIGN_EXPIRES_SECONDS: u64 = 604_800;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub hls: HlsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Upper bound for every object store call made on behalf of a request
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8002,
            request_timeout_seconds: 10,
        }
    }
}

/// S3-compatible object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store endpoint (e.g., "<https://ewr1.vultrobjects.com>")
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Signing region; derived from the endpoint when unset
    pub region: Option<String>,
    pub addressing_style: AddressingStyle,
    /// Bucket-side folder prepended to every key before it reaches the store
    pub object_key_prefix: String,
    pub presign_expires_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: None,
            addressing_style: AddressingStyle::Path,
            object_key_prefix: String::new(),
            presign_expires_seconds: 3600,
        }
    }
}

impl StorageConfig {
    /// Region used for signing.
    ///
    /// Providers that encode the region as the first host label
    /// (`ewr1.vultrobjects.com`, `tor1.digitaloceanspaces.com`) get it from
    /// the endpoint; everything else falls back to `us-east-1`.
    #[must_use]
    pub fn effective_region(&self) -> String {
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            return region.to_string();
        }

        url::Url::parse(&self.endpoint)
            .ok()
            .and_then(|url| {
                let host = url.host_str()?.to_string();
                let (label, rest) = host.split_once('.')?;
                (rest == "vultrobjects.com" || rest == "digitaloceanspaces.com")
                    .then(|| label.to_string())
            })
            .unwrap_or_else(|| "us-east-1".to_string())
    }

    #[must_use]
    pub const fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expires_seconds)
    }
}

/// Gateway behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HlsConfig {
    /// Every served key must start with this prefix
    pub allowed_prefix: String,
    /// Public origin of this gateway; empty means root-relative URLs
    pub public_base_url: String,
    /// `Cache-Control` for rewritten manifests
    pub manifest_cache_control: String,
    /// Allowed CORS origins; empty or `*` allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Mount `/hls-debug/presign` (never in production)
    pub debug_routes: bool,
    /// Make HEAD on the redirect route check the object exists first
    pub head_checks_existence: bool,
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self {
            allowed_prefix: "hls/".to_string(),
            public_base_url: String::new(),
            manifest_cache_control: "public, max-age=5".to_string(),
            cors_allowed_origins: Vec::new(),
            debug_routes: false,
            head_checks_existence: false,
        }
    }
}

impl HlsConfig {
    /// Public base without a trailing slash, as used in rewritten URLs
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.is_empty()
            || self.cors_allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // HLSGATE_STORAGE__BUCKET, HLSGATE_HLS__DEBUG_ROUTES, ...
        builder = builder.add_source(
            Environment::with_prefix("HLSGATE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("hls.cors_allowed_origins")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Check the configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.storage.endpoint.is_empty() {
            errors.push("storage.endpoint must be set".to_string());
        } else if url::Url::parse(&self.storage.endpoint).is_err() {
            errors.push(format!(
                "storage.endpoint '{}' is not a valid URL",
                self.storage.endpoint
            ));
        }
        if self.storage.bucket.is_empty() {
            errors.push("storage.bucket must be set".to_string());
        }
        if self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty() {
            errors.push("storage credentials (access_key_id, secret_access_key) must be set".to_string());
        }
        if !(1..=MAX_PRESIGN_EXPIRES_SECONDS).contains(&self.storage.presign_expires_seconds) {
            errors.push(format!(
                "storage.presign_expires_seconds must be between 1 and {MAX_PRESIGN_EXPIRES_SECONDS}"
            ));
        }

        let prefix = &self.hls.allowed_prefix;
        if prefix.is_empty() || !prefix.ends_with('/') || prefix.starts_with('/') {
            errors.push(format!(
                "hls.allowed_prefix '{prefix}' must be a relative directory ending with '/'"
            ));
        }
        if prefix.split('/').any(|segment| segment == "." || segment == "..") {
            errors.push(format!("hls.allowed_prefix '{prefix}' must not contain dot segments"));
        }
        if !self.hls.public_base_url.is_empty() {
            match url::Url::parse(&self.hls.public_base_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => errors.push(format!(
                    "hls.public_base_url '{}' must be an absolute http(s) URL",
                    self.hls.public_base_url
                )),
            }
        }

        if !self
            .hls
            .manifest_cache_control
            .bytes()
            .all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
        {
            errors.push("hls.manifest_cache_control must be a valid header value".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            errors.push("server.request_timeout_seconds must be greater than 0".to_string());
        }
        if let Err(e) = crate::logging::parse_log_level(&self.logging.level) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        Config {
            storage: StorageConfig {
                endpoint: "https://ewr1.vultrobjects.com".to_string(),
                bucket: "media".to_string(),
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                ..StorageConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.hls.allowed_prefix, "hls/");
        assert_eq!(config.storage.addressing_style, AddressingStyle::Path);
        assert_eq!(config.storage.presign_expires_seconds, 3600);
        assert!(!config.hls.debug_routes);
        assert!(config.hls.allows_any_origin());
        assert_eq!(config.http_address(), "0.0.0.0:8002");
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let mut config = Config::default();
        config.hls.allowed_prefix = "../hls".to_string();
        config.storage.presign_expires_seconds = 0;
        config.server.request_timeout_seconds = 0;

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("storage.endpoint")));
        assert!(errors.iter().any(|e| e.contains("storage.bucket")));
        assert!(errors.iter().any(|e| e.contains("credentials")));
        assert!(errors.iter().any(|e| e.contains("presign_expires_seconds")));
        assert!(errors.iter().any(|e| e.contains("allowed_prefix")));
        assert!(errors.iter().any(|e| e.contains("request_timeout_seconds")));
    }

    #[test]
    fn test_validate_rejects_relative_public_base() {
        let mut config = valid_config();
        config.hls.public_base_url = "gateway.local".to_string();
        assert!(config.validate().is_err());

        config.hls.public_base_url = "https://gateway.example.com/".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.hls.api_base(), "https://gateway.example.com");
    }

    #[test]
    fn test_effective_region() {
        let mut storage = valid_config().storage;
        assert_eq!(storage.effective_region(), "ewr1");

        storage.endpoint = "https://tor1.digitaloceanspaces.com".to_string();
        assert_eq!(storage.effective_region(), "tor1");

        storage.endpoint = "http://127.0.0.1:9000".to_string();
        assert_eq!(storage.effective_region(), "us-east-1");

        storage.region = Some("eu-west-2".to_string());
        assert_eq!(storage.effective_region(), "eu-west-2");
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "storage:\n  endpoint: https://ewr1.vultrobjects.com\n  bucket: media\n  addressing_style: virtual\n  presign_expires_seconds: 900\nhls:\n  public_base_url: https://gw.example.com\n  debug_routes: true\n  cors_allowed_origins:\n    - https://app.example.com"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.storage.bucket, "media");
        assert_eq!(config.storage.addressing_style, AddressingStyle::Virtual);
        assert_eq!(config.storage.presign_expiry(), Duration::from_secs(900));
        assert!(config.hls.debug_routes);
        assert!(!config.hls.allows_any_origin());
        // Untouched sections keep their defaults
        assert_eq!(config.hls.allowed_prefix, "hls/");
        assert_eq!(config.server.request_timeout_seconds, 10);
    }
}
