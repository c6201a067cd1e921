use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
// The backend allows up to 120 s for quiz generation.
const DEFAULT_TIMEOUT_SECS: u64 = 130;
const DEFAULT_QUESTIONS_PER_SECTION: u8 = 3;
const MAX_QUESTIONS_PER_SECTION: u8 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub questions_per_section: u8,
}

impl RemoteConfig {
    /// Read `STUDY_API_BASE_URL`, `STUDY_HTTP_TIMEOUT_SECS` and
    /// `STUDY_QUESTIONS_PER_SECTION`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("STUDY_API_BASE_URL") {
            Ok(raw) if !raw.trim().is_empty() => Self::with_base_url(&raw)?,
            _ => Self::default(),
        };
        if let Ok(raw) = env::var("STUDY_HTTP_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("STUDY_HTTP_TIMEOUT_SECS", &raw)?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = env::var("STUDY_QUESTIONS_PER_SECTION") {
            let count = parse_number::<u8>("STUDY_QUESTIONS_PER_SECTION", &raw)?;
            config = config.with_questions_per_section(count);
        }
        Ok(config)
    }

    /// Defaults with the given API root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BaseUrl` if `raw` is not an absolute URL.
    pub fn with_base_url(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(raw)?,
            ..Self::default()
        })
    }

    /// Questions per section is clamped to the backend's accepted range.
    #[must_use]
    pub fn with_questions_per_section(mut self, count: u8) -> Self {
        self.questions_per_section = count.clamp(1, MAX_QUESTIONS_PER_SECTION);
        self
    }
}

impl Default for RemoteConfig {
    /// # Panics
    ///
    /// Panics if the built-in base URL cannot be parsed.
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url should be valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            questions_per_section: DEFAULT_QUESTIONS_PER_SECTION,
        }
    }
}

/// Endpoint paths are joined relative to the base, so it must end in `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| ConfigError::BaseUrl {
        raw: raw.to_string(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        raw: raw.to_string(),
    })
}
