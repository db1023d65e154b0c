//! Configuration types for the chat stream client.

use std::time::Duration;
use url::Url;
use crate::error::{ChatError, ConfigurationError};

/// Default chat backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout for the non-streaming call (120 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Buffer length above which processed text becomes eligible for compaction.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 10_000;

/// Minimum processed prefix worth reclaiming in one compaction.
pub const DEFAULT_MIN_RECLAIM: usize = 5_000;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("integrations-chat-stream/", env!("CARGO_PKG_VERSION"));

/// Buffer retention settings for streaming sessions.
///
/// Lengths are measured in bytes of decoded UTF-8 text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Buffer length that must be exceeded before compaction is considered.
    pub compaction_threshold: usize,
    /// Watermark that must be exceeded before the processed prefix is discarded.
    pub min_reclaim: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            min_reclaim: DEFAULT_MIN_RECLAIM,
        }
    }
}

impl StreamingConfig {
    /// Checks that the thresholds are usable together.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.compaction_threshold == 0 || self.min_reclaim == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "compaction thresholds must be non-zero".to_string(),
            });
        }
        if self.min_reclaim > self.compaction_threshold {
            return Err(ConfigurationError::InvalidConfiguration {
                message: format!(
                    "min_reclaim ({}) must not exceed compaction_threshold ({})",
                    self.min_reclaim, self.compaction_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Configuration for the chat client.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Base URL the `/api/...` endpoints are resolved against.
    pub base_url: Url,
    /// Total timeout for the non-streaming call.
    pub timeout: Duration,
    /// Connect timeout for both calls.
    pub connect_timeout: Duration,
    /// User agent header value.
    pub user_agent: String,
    /// Streaming buffer settings.
    pub streaming: StreamingConfig,
}

impl ChatConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `CHAT_BASE_URL`, `CHAT_TIMEOUT_SECS` and `CHAT_CONNECT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ChatError> {
        let base_url = std::env::var("CHAT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs: u64 = std::env::var("CHAT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let connect_timeout_secs: u64 = std::env::var("CHAT_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Self::builder()
            .base_url(&base_url)?
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            streaming: StreamingConfig::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

/// Builder for ChatConfig.
#[derive(Default)]
pub struct ChatConfigBuilder {
    base_url: Option<Url>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    streaming: Option<StreamingConfig>,
}

impl ChatConfigBuilder {
    /// Set the base URL.
    pub fn base_url(mut self, base_url: &str) -> Result<Self, ChatError> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Set the request timeout for the non-streaming call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Set the streaming buffer configuration.
    pub fn streaming(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = Some(streaming);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ChatConfig, ChatError> {
        let streaming = self.streaming.unwrap_or_default();
        streaming.validate()?;

        let base_url = self.base_url.unwrap_or_else(default_base_url);
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidBaseUrl {
                url: base_url.to_string(),
            }
            .into());
        }

        Ok(ChatConfig {
            base_url,
            timeout: self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            streaming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::builder().build().unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.streaming.compaction_threshold, 10_000);
        assert_eq!(config.streaming.min_reclaim, 5_000);
    }

    #[test]
    fn test_custom_config() {
        let config = ChatConfig::builder()
            .base_url("https://chat.example.com")
            .unwrap()
            .timeout(Duration::from_secs(10))
            .user_agent("demo/1.0")
            .streaming(StreamingConfig {
                compaction_threshold: 2_000,
                min_reclaim: 500,
            })
            .build()
            .unwrap();

        assert_eq!(config.base_url.host_str(), Some("chat.example.com"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "demo/1.0");
        assert_eq!(config.streaming.min_reclaim, 500);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ChatConfig::builder().base_url("not a url"),
            Err(ChatError::Configuration(ConfigurationError::InvalidBaseUrl { .. }))
        ));
        assert!(ChatConfig::builder()
            .base_url("mailto:someone@example.com")
            .unwrap()
            .build()
            .is_err());
    }

    #[test]
    fn test_reclaim_larger_than_threshold_is_rejected() {
        let result = ChatConfig::builder()
            .streaming(StreamingConfig {
                compaction_threshold: 100,
                min_reclaim: 200,
            })
            .build();
        assert!(matches!(
            result,
            Err(ChatError::Configuration(ConfigurationError::InvalidConfiguration { .. }))
        ));
    }
}
