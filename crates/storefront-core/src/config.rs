//! Configuration resolution for Storefront.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/storefront/settings.json`)
//! 3. Project config (`.storefront/settings.json`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)
//!
//! Files are merged key by key, so a project file only needs the keys it
//! overrides. The download signing secret is resolved here once and then
//! travels inside [`PluginConfig`]; nothing else reads the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_crypto::DownloadTokenSigner;

use crate::error::{Error, Result};
use crate::tenant::TenantStrategy;

/// Env var holding the download signing secret when no custom one is configured.
pub const SECRET_ENV: &str = "STOREFRONT_DOWNLOAD_SECRET";

/// Complete, resolved plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    pub digital_file_storage: DigitalFileStorageConfig,
    /// Register collections only; no admin extensions, no seeding.
    pub disabled: bool,
    pub enable_digital_products: bool,
    pub enable_inventory_tracking: bool,
    pub enable_license_generation: bool,
    pub enable_physical_products: bool,
    pub enable_search_indexing: bool,
    pub enable_subscriptions: bool,
    pub payment_providers: Vec<PaymentProviderConfig>,
    /// Extra field names appended to products and variants.
    pub product_variant_fields: Vec<String>,
    pub seed_demo_data: bool,
    pub tenant_strategy: TenantStrategy,
    pub theme_defaults: ThemeDefaults,
    pub log_level: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            digital_file_storage: DigitalFileStorageConfig::default(),
            disabled: false,
            enable_digital_products: true,
            enable_inventory_tracking: true,
            enable_license_generation: true,
            enable_physical_products: true,
            enable_search_indexing: false,
            enable_subscriptions: false,
            payment_providers: vec![PaymentProviderConfig::stripe()],
            product_variant_fields: Vec::new(),
            seed_demo_data: false,
            tenant_strategy: TenantStrategy::default(),
            theme_defaults: ThemeDefaults::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Where digital files live and how download links are signed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalFileStorageConfig {
    pub provider: StorageProvider,
    pub bucket: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "signedUrlTTLSeconds", alias = "signedUrlTtlSeconds")]
    pub signed_url_ttl_secs: u64,
    /// Name of the env var that holds the signing secret.
    pub signing_secret_env: Option<String>,
    /// The signing secret itself. Never serialized back out.
    #[serde(skip_serializing)]
    pub signing_secret: Option<String>,
}

impl Default for DigitalFileStorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::S3,
            bucket: None,
            region: None,
            signed_url_ttl_secs: 600,
            signing_secret_env: None,
            signing_secret: None,
        }
    }
}

impl std::fmt::Debug for DigitalFileStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalFileStorageConfig")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("signing_secret_env", &self.signing_secret_env)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl DigitalFileStorageConfig {
    pub const fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    S3,
    R2,
    Local,
}

impl StorageProvider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::R2 => "r2",
            Self::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProviderType {
    Manual,
    Paypal,
    Stripe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProviderConfig {
    pub slug: String,
    #[serde(rename = "type")]
    pub provider_type: PaymentProviderType,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub default_currency: Option<String>,
    #[serde(default)]
    pub supports_subscriptions: bool,
    #[serde(default)]
    pub webhook_path: Option<String>,
    #[serde(default)]
    pub publishable_key_env: Option<String>,
    #[serde(default)]
    pub secret_key_env: Option<String>,
    #[serde(default)]
    pub webhook_secret_env: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

impl PaymentProviderConfig {
    fn stripe() -> Self {
        Self {
            slug: "stripe".to_string(),
            provider_type: PaymentProviderType::Stripe,
            display_name: Some("Stripe".to_string()),
            default_currency: None,
            supports_subscriptions: true,
            webhook_path: Some("/api/webhooks/stripe".to_string()),
            publishable_key_env: None,
            secret_key_env: None,
            webhook_secret_env: None,
            success_url: None,
            cancel_url: None,
        }
    }
}

/// Default storefront theme applied to new tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeDefaults {
    pub font_family: String,
    pub logo_url: String,
    pub primary_color: String,
    pub secondary_color: String,
}

impl Default for ThemeDefaults {
    fn default() -> Self {
        Self {
            font_family: "Inter, sans-serif".to_string(),
            logo_url: String::new(),
            primary_color: "#111827".to_string(),
            secondary_color: "#2563eb".to_string(),
        }
    }
}

impl PluginConfig {
    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.digital_file_storage.signed_url_ttl_secs == 0 {
            return Err(Error::Config(
                "digitalFileStorage.signedUrlTTLSeconds must be positive".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for provider in &self.payment_providers {
            if !seen.insert(provider.slug.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate payment provider slug '{}'",
                    provider.slug
                )));
            }
        }
        self.tenant_strategy.validate()
    }

    /// Build the download signer from the resolved secret.
    pub fn download_signer(&self) -> Result<DownloadTokenSigner> {
        let secret = self
            .digital_file_storage
            .signing_secret
            .as_deref()
            .ok_or_else(|| {
                Error::Config(format!(
                    "no download signing secret configured (set {})",
                    self.secret_env_name()
                ))
            })?;
        Ok(DownloadTokenSigner::new(secret)?)
    }

    fn secret_env_name(&self) -> &str {
        self.digital_file_storage
            .signing_secret_env
            .as_deref()
            .unwrap_or(SECRET_ENV)
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<PluginConfig> {
    let mut merged = serde_json::to_value(PluginConfig::default())?;

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            merge_config(&mut merged, load_config_file(&global_path)?);
        }
    }

    if let Some(dir) = project_dir {
        let project_path = project_config_path(dir);
        if project_path.exists() {
            merge_config(&mut merged, load_config_file(&project_path)?);
        }
    }

    let mut config: PluginConfig = serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("storefront").join("settings.json"))
}

/// Project config file inside `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".storefront").join("settings.json")
}

/// Default database location.
pub fn database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("storefront").join("store.db"))
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Deep-merge `overlay` into `base`: objects merge per key, anything else replaces.
fn merge_config(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_config(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply environment overrides through `lookup` (normally `std::env::var`).
pub fn apply_env_overrides(config: &mut PluginConfig, lookup: impl Fn(&str) -> Option<String>) {
    let secret_env = config.secret_env_name().to_string();
    if let Some(val) = lookup(&secret_env).filter(|v| !v.is_empty()) {
        config.digital_file_storage.signing_secret = Some(val);
    }
    if let Some(val) = lookup("STOREFRONT_SIGNED_URL_TTL") {
        if let Ok(n) = val.parse() {
            config.digital_file_storage.signed_url_ttl_secs = n;
        }
    }
    if let Some(val) = lookup("STOREFRONT_SEED_DEMO_DATA") {
        if let Ok(b) = val.parse() {
            config.seed_demo_data = b;
        }
    }
    if let Some(val) = lookup("STOREFRONT_LOG_LEVEL") {
        config.log_level = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_plugin_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.digital_file_storage.signed_url_ttl_secs, 600);
        assert_eq!(config.digital_file_storage.provider, StorageProvider::S3);
        assert!(config.enable_digital_products);
        assert!(!config.enable_subscriptions);
        assert!(!config.seed_demo_data);
        assert_eq!(config.payment_providers.len(), 1);
        assert_eq!(config.payment_providers[0].slug, "stripe");
        assert_eq!(config.theme_defaults.primary_color, "#111827");
        assert_eq!(config.theme_defaults.secondary_color, "#2563eb");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PluginConfig =
            serde_json::from_str(r#"{"enableSubscriptions": true, "digitalFileStorage": {"provider": "r2"}}"#)
                .unwrap();
        assert!(config.enable_subscriptions);
        assert_eq!(config.digital_file_storage.provider, StorageProvider::R2);
        assert_eq!(config.digital_file_storage.signed_url_ttl_secs, 600);
        assert!(config.enable_inventory_tracking);
    }

    #[test]
    fn merge_overrides_nested_keys_only() {
        let mut base = serde_json::to_value(PluginConfig::default()).unwrap();
        merge_config(
            &mut base,
            serde_json::json!({"digitalFileStorage": {"signedUrlTTLSeconds": 60}}),
        );
        merge_config(&mut base, serde_json::json!({"digitalFileStorage": {"bucket": "files"}}));
        let config: PluginConfig = serde_json::from_value(base).unwrap();
        assert_eq!(config.digital_file_storage.signed_url_ttl_secs, 60);
        assert_eq!(config.digital_file_storage.bucket.as_deref(), Some("files"));
    }

    #[test]
    fn env_overrides_secret_and_ttl() {
        let mut config = PluginConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (SECRET_ENV, "from-env"),
                ("STOREFRONT_SIGNED_URL_TTL", "30"),
                ("STOREFRONT_SEED_DEMO_DATA", "true"),
            ]),
        );
        assert_eq!(
            config.digital_file_storage.signing_secret.as_deref(),
            Some("from-env")
        );
        assert_eq!(config.digital_file_storage.signed_url_ttl_secs, 30);
        assert!(config.seed_demo_data);
    }

    #[test]
    fn custom_secret_env_name_is_honoured() {
        let mut config = PluginConfig::default();
        config.digital_file_storage.signing_secret_env = Some("MY_SECRET".to_string());
        apply_env_overrides(
            &mut config,
            env(&[(SECRET_ENV, "ignored"), ("MY_SECRET", "custom")]),
        );
        assert_eq!(
            config.digital_file_storage.signing_secret.as_deref(),
            Some("custom")
        );
    }

    #[test]
    fn download_signer_requires_secret() {
        let mut config = PluginConfig::default();
        assert!(matches!(config.download_signer(), Err(Error::Config(_))));
        config.digital_file_storage.signing_secret = Some("k".to_string());
        assert!(config.download_signer().is_ok());
    }

    #[test]
    fn secret_is_not_serialized_or_debug_printed() {
        let mut config = PluginConfig::default();
        config.digital_file_storage.signing_secret = Some("hunter2".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn validate_rejects_zero_ttl_and_duplicate_providers() {
        let mut config = PluginConfig::default();
        config.digital_file_storage.signed_url_ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = PluginConfig::default();
        config
            .payment_providers
            .push(PaymentProviderConfig::stripe());
        assert!(config.validate().is_err());
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r##"{"themeDefaults": {"secondaryColor": "#f97316"}}"##,
        )
        .unwrap();

        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.theme_defaults.secondary_color, "#f97316");
        assert_eq!(config.theme_defaults.primary_color, "#111827");
    }

    #[test]
    fn unreadable_project_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config(Some(dir.path())), Err(Error::Config(_))));
    }
}
