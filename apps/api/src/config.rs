use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::CompletionOptions;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_AFFILIATE_TAG: &str = "barkadvisor-20";

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is out of range.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub completion: CompletionOptions,
    pub affiliate_tag: String,
    /// Profiles live in memory when unset.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let completion = CompletionOptions {
            model: std::env::var("COMPLETION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: env_or("COMPLETION_TEMPERATURE", 0.1)?,
            max_output_tokens: env_or("COMPLETION_MAX_TOKENS", 1500)?,
            timeout: Duration::from_millis(env_or("COMPLETION_TIMEOUT_MS", 30_000)?),
            max_retries: env_or("COMPLETION_MAX_RETRIES", 3)?,
            json_mode: env_or("COMPLETION_JSON_MODE", false)?,
        };
        validate_completion(&completion)?;

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            completion,
            affiliate_tag: std::env::var("AFFILIATE_TAG")
                .unwrap_or_else(|_| DEFAULT_AFFILIATE_TAG.to_string()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn validate_completion(options: &CompletionOptions) -> Result<()> {
    if !(0.0..=1.0).contains(&options.temperature) {
        bail!(
            "COMPLETION_TEMPERATURE must be within [0, 1], got {}",
            options.temperature
        );
    }
    if options.timeout.is_zero() {
        bail!("COMPLETION_TIMEOUT_MS must be greater than zero");
    }
    if options.max_output_tokens == 0 {
        bail!("COMPLETION_MAX_TOKENS must be greater than zero");
    }
    Ok(())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads and parses an optional variable, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_ranges() {
        let cases = [
            (0.0, 30_000, 1500, true),
            (1.0, 1, 1, true),
            (0.1, 30_000, 1500, true),
            (-0.1, 30_000, 1500, false),
            (1.5, 30_000, 1500, false),
            (f32::NAN, 30_000, 1500, false),
            (0.1, 0, 1500, false),
            (0.1, 30_000, 0, false),
        ];

        for (temperature, timeout_ms, max_output_tokens, ok) in cases {
            let options = CompletionOptions {
                temperature,
                timeout: Duration::from_millis(timeout_ms),
                max_output_tokens,
                ..CompletionOptions::default()
            };
            assert_eq!(
                validate_completion(&options).is_ok(),
                ok,
                "temperature={temperature} timeout_ms={timeout_ms} max_tokens={max_output_tokens}"
            );
        }
    }

    #[test]
    fn test_env_or_uses_default_when_unset() {
        let value: u32 = env_or("ADVISOR_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_env_or_rejects_unparseable_value() {
        std::env::set_var("ADVISOR_TEST_BAD_NUMBER", "twelve");
        let result: Result<u32> = env_or("ADVISOR_TEST_BAD_NUMBER", 1);
        assert!(result.is_err());
        std::env::remove_var("ADVISOR_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_env_or_trims_whitespace() {
        std::env::set_var("ADVISOR_TEST_PADDED_BOOL", " true ");
        let value: bool = env_or("ADVISOR_TEST_PADDED_BOOL", false).unwrap();
        assert!(value);
        std::env::remove_var("ADVISOR_TEST_PADDED_BOOL");
    }
}
