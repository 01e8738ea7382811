//! Configuration check.
//!
//! Loads the storefront configuration exactly as the server does, so a bad
//! deploy fails here instead of at startup.
//!
//! # Usage
//!
//! ```bash
//! nightcap-cli check-config
//! ```

use nightcap_storefront::config::{ConfigError, StorefrontConfig};

/// Validate storefront environment variables.
///
/// # Errors
///
/// Returns the first configuration error found.
pub fn config() -> Result<(), ConfigError> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!(
        addr = %config.socket_addr(),
        base_url = %config.base_url,
        secure_cookies = config.is_secure(),
        backend = %config.backend.api_url,
        backend_api_key = config.backend.api_key.is_some(),
        catalog_cache_ttl_secs = config.backend.catalog_cache_ttl.as_secs(),
        clear_cart_on_business_change = config.clear_cart_on_business_change,
        sentry = config.sentry.dsn.is_some(),
        "Configuration OK"
    );
    Ok(())
}
