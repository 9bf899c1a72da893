use crate::config::types::{BrowserConfig, Config, SelectorConfig, SiteConfig, TimingConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_timing_config(&config.timing)?;
    validate_output_config(&config.output)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates the target site URLs
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = parse_http_url("base-url", &config.base_url)?;
    let catalog = parse_http_url("catalog-url", &config.catalog_url)?;

    // Single target site: the catalog must live on the base origin
    if base.host_str() != catalog.host_str() {
        return Err(ConfigError::Validation(format!(
            "catalog-url host {:?} does not match base-url host {:?}",
            catalog.host_str(),
            base.host_str()
        )));
    }

    Ok(())
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::InvalidUrl(format!("{} cannot be empty", field)));
    }

    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(url)
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    if let Some(path) = &config.chrome_executable {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "chrome-executable cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates timing configuration
///
/// Settle durations and optional-control timeouts may be zero; navigation
/// and polling may not.
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout must be > 0".to_string(),
        ));
    }

    if config.poll_interval == 0 {
        return Err(ConfigError::Validation(
            "poll-interval must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every markup binding is present and parses as CSS
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (key, css) in config.css_selectors() {
        if css.trim().is_empty() {
            return Err(ConfigError::InvalidSelector(format!("{} cannot be empty", key)));
        }

        Selector::parse(css)
            .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", key, css, e)))?;
    }

    for (key, label) in [
        ("choose-manually-text", &config.choose_manually_text),
        ("provider-info-label", &config.provider_info_label),
        ("size-label", &config.size_label),
    ] {
        if label.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    Ok(())
}
