use std::path::Path;

use http::{HeaderName, HeaderValue};

use crate::{Config, ProviderConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion or parsing
    /// fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Expand, parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(providers = config.providers.len(), "configuration loaded");

        Ok(config)
    }

    /// Validate that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured or a provider entry is invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured");
        }

        for (name, provider) in &self.providers {
            validate_provider(name, provider)?;
        }

        Ok(())
    }
}

fn validate_provider(name: &str, provider: &ProviderConfig) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("provider names must not be empty");
    }
    // The part before the first '.' keys provider options
    if name.contains('.') {
        anyhow::bail!("provider name '{name}' must not contain '.'");
    }

    let scheme = provider.base_url.scheme();
    if scheme != "http" && scheme != "https" {
        anyhow::bail!("base_url for provider '{name}' must use http or https, got '{scheme}'");
    }

    for (key, value) in &provider.headers {
        HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid header name '{key}' for provider '{name}': {e}"))?;
        HeaderValue::from_str(value)
            .map_err(|e| anyhow::anyhow!("invalid value for header '{key}' for provider '{name}': {e}"))?;
    }

    Ok(())
}
