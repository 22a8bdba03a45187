//! Semantic validation of parsed configuration

use crate::config::types::Config;
use crate::url::normalize_url;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Checks the constraints that TOML deserialization cannot express: non-empty
/// scope, sane concurrency values, seed URLs that actually parse, and chunk
/// parameters that make progress.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "crawler.seeds must contain at least one URL".to_string(),
        ));
    }

    if config.crawler.allowed_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "crawler.allowed-hosts must contain at least one host".to_string(),
        ));
    }

    for seed in &config.crawler.seeds {
        normalize_url(seed).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", seed, e)))?;
    }

    if config.crawler.max_pages == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-pages must be at least 1".to_string(),
        ));
    }

    if config.rate_limits.per_host_rps <= 0.0 || !config.rate_limits.per_host_rps.is_finite() {
        return Err(ConfigError::Validation(
            "rate-limits.per-host-rps must be a positive number".to_string(),
        ));
    }

    if config.rate_limits.per_host_concurrency == 0 {
        return Err(ConfigError::Validation(
            "rate-limits.per-host-concurrency must be at least 1".to_string(),
        ));
    }

    if config.rate_limits.global_concurrency == 0 {
        return Err(ConfigError::Validation(
            "rate-limits.global-concurrency must be at least 1".to_string(),
        ));
    }

    match config.deduplication.prefer.as_str() {
        "html" | "pdf" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "deduplication.prefer must be \"html\" or \"pdf\", got \"{}\"",
                other
            )))
        }
    }

    if config.rag.chunk_size_tokens == 0 {
        return Err(ConfigError::Validation(
            "rag.chunk-size-tokens must be at least 1".to_string(),
        ));
    }

    if config.rag.chunk_overlap_tokens >= config.rag.chunk_size_tokens {
        return Err(ConfigError::Validation(
            "rag.chunk-overlap-tokens must be smaller than rag.chunk-size-tokens".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        toml::from_str(
            r#"
[crawler]
seeds = ["https://www.policyaddress.gov.hk/2021/eng/policy.html"]
allowed-hosts = ["www.policyaddress.gov.hk"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_empty_seeds_rejected() {
        let mut config = base_config();
        config.crawler.seeds.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_hosts_rejected() {
        let mut config = base_config();
        config.crawler.allowed_hosts.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_malformed_seed_rejected() {
        let mut config = base_config();
        config.crawler.seeds.push("not a url".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_rps_rejected() {
        let mut config = base_config();
        config.rate_limits.per_host_rps = 0.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_global_concurrency_rejected() {
        let mut config = base_config();
        config.rate_limits.global_concurrency = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_preference_rejected() {
        let mut config = base_config();
        config.deduplication.prefer = "docx".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = base_config();
        config.rag.chunk_size_tokens = 100;
        config.rag.chunk_overlap_tokens = 100;
        assert!(validate(&config).is_err());
    }
}
