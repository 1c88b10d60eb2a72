use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from curious_mind.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Completion provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub completion_provider: String,
    pub completion_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Attempt ceiling for one logical completion call
    pub retry_attempts: u32,
    /// Base for exponential backoff between completion retries
    pub retry_base_delay_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            completion_provider: "canned".to_string(),
            completion_model: "gpt-4".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Tunables for the question generation loop. The similarity threshold and
/// hallucination cutoff are heuristic calibrations, kept configurable rather
/// than frozen at call sites.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub similarity_threshold: f32,
    pub hallucination_confidence_cutoff: u8,
    pub history_limit: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            similarity_threshold: 0.80,
            hallucination_confidence_cutoff: 70,
            history_limit: 50,
        }
    }
}

/// Offline cache bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub capacity: usize,
    pub expiry_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            expiry_days: 7,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub log_level: String,
    pub http_bind: std::net::SocketAddr,
    /// Force the degraded offline path (serves cached or rule-generated content)
    pub offline: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            log_level: "curious_mind=info".to_string(),
            http_bind: "127.0.0.1:8790"
                .parse()
                .expect("default bind address should parse"),
            offline: false,
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        let mut runtime = Self::default();

        let is_placeholder = |s: &str| {
            let t = s.trim();
            t.is_empty()
                || t.contains("${")
                || t.eq_ignore_ascii_case("your-api-key-here")
                || t.eq_ignore_ascii_case("changeme")
        };

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !is_placeholder(&key) {
                runtime.openai_api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !is_placeholder(&key) {
                runtime.anthropic_api_key = Some(key);
            }
        }
        if let Ok(level) = std::env::var("CURIO_LOG") {
            if !level.trim().is_empty() {
                runtime.log_level = level;
            }
        }
        if let Ok(bind) = std::env::var("CURIO_HTTP_BIND") {
            match bind.parse() {
                Ok(addr) => runtime.http_bind = addr,
                Err(_) => tracing::warn!("CURIO_HTTP_BIND '{}' is not a valid address", bind),
            }
        }
        if let Ok(offline) = std::env::var("CURIO_OFFLINE") {
            runtime.offline = offline == "1" || offline.eq_ignore_ascii_case("true");
        }

        runtime
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            generation: GenerationConfig::default(),
            cache: CacheConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses CURIOUS_MIND_CONFIG environment variable or defaults to "curious_mind.toml".
    pub fn load() -> anyhow::Result<Self> {
        // Load environment variables with smart fallbacks:
        // 1) CURIO_ENV_FILE if set
        // 2) ./.env
        // 3) ../.env (repo root when running from crate dir)
        if let Ok(env_path) = std::env::var("CURIO_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
            let core_present = std::env::var("OPENAI_API_KEY").is_ok()
                || std::env::var("ANTHROPIC_API_KEY").is_ok()
                || std::env::var("CURIO_PROVIDER").is_ok();
            if !core_present {
                let _ = dotenvy::from_path("../.env");
            }
        }

        let config_path = std::env::var("CURIOUS_MIND_CONFIG")
            .unwrap_or_else(|_| "curious_mind.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Apply env overrides for the provider selection (env-first)
        if let Ok(provider) = std::env::var("CURIO_PROVIDER") {
            config.system.completion_provider = provider;
        }
        if let Ok(model) = std::env::var("CURIO_MODEL") {
            config.system.completion_model = model;
        }

        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration, clamping recoverable values and rejecting
    /// nonsensical ones.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if self.system.retry_attempts == 0 {
            self.system.retry_attempts = 1;
        } else if self.system.retry_attempts > 10 {
            tracing::warn!(
                "retry_attempts {} exceeds max 10, clamping to 10",
                self.system.retry_attempts
            );
            self.system.retry_attempts = 10;
        }

        if self.generation.max_attempts == 0 {
            self.generation.max_attempts = 1;
        } else if self.generation.max_attempts > 10 {
            tracing::warn!(
                "max_attempts {} exceeds max 10, clamping to 10",
                self.generation.max_attempts
            );
            self.generation.max_attempts = 10;
        }

        if !(0.0..=1.0).contains(&self.generation.similarity_threshold) {
            anyhow::bail!("generation.similarity_threshold must be between 0.0 and 1.0");
        }
        if self.generation.hallucination_confidence_cutoff > 100 {
            anyhow::bail!("generation.hallucination_confidence_cutoff must be at most 100");
        }
        if self.generation.history_limit == 0 {
            anyhow::bail!("generation.history_limit must be at least 1");
        }

        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be at least 1");
        }
        if self.cache.expiry_days <= 0 {
            anyhow::bail!("cache.expiry_days must be positive");
        }

        if !(0.0..=2.0).contains(&self.system.temperature) {
            anyhow::bail!("system.temperature must be between 0.0 and 2.0");
        }

        match self.system.completion_provider.as_str() {
            "openai" | "anthropic" | "canned" => {}
            other => {
                tracing::warn!(
                    "Unknown completion provider '{}', falling back to canned",
                    other
                );
                self.system.completion_provider = "canned".to_string();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.system.retry_attempts, 3);
        assert_eq!(config.cache.capacity, 100);
    }

    #[test]
    fn attempt_ceilings_are_clamped() {
        let mut config = Config::default();
        config.system.retry_attempts = 50;
        config.generation.max_attempts = 0;
        config.validate().unwrap();
        assert_eq!(config.system.retry_attempts, 10);
        assert_eq!(config.generation.max_attempts, 1);
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let mut config = Config::default();
        config.generation.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_falls_back_to_canned() {
        let mut config = Config::default();
        config.system.completion_provider = "palm".to_string();
        config.validate().unwrap();
        assert_eq!(config.system.completion_provider, "canned");
    }
}
