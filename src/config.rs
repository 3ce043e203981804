use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Chat-completion upstream (OpenAI-compatible)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    /// Model that writes the questions
    pub question_model: String,
    /// Model named in every answer-request record of the batch file
    pub answer_model: String,
    /// Per-attempt timeout (accepts "120", "120s", "2m")
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
    pub question_temperature: f64,
    pub question_max_tokens: u32,
}

/// Tuning of the question generation loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Questions requested per upstream call
    pub batch_size: u32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
    /// Pause between two batches of the same vehicle generation
    pub throttle_ms: u64,
    /// Accepted questions remembered as "do not repeat" candidates
    pub recent_window: usize,
    /// How many of those actually go into the prompt
    pub prompt_context: usize,
    pub answer_temperature: f64,
    pub answer_max_tokens: u32,
}

/// Where batch files land and how they are reached
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: String,
    /// Prefix of the returned `fileUrl`; the server mounts `output_dir` at `/files`
    pub public_base_url: String,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone)]
#[command(name = "faultbase")]
#[command(version, about = "Faultbase - bulk question generation for the vehicle fault knowledge base")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Logging level (overrides config file, e.g., "info,faultbase=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Chat completion API base URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub llm_api_base: Option<String>,

    /// Per-attempt LLM timeout (overrides config file, e.g., "120s", "2m")
    #[arg(long, value_name = "DURATION")]
    pub llm_timeout: Option<String>,

    /// Directory for generated batch files (overrides config file)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Public URL prefix for generated batch files (overrides config file)
    #[arg(long, value_name = "URL")]
    pub public_base_url: Option<String>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(&cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL: Database URL (default: sqlite://data/faultbase.db)
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,faultbase=debug")
    /// - APP_LLM_API_BASE, APP_LLM_QUESTION_MODEL, APP_LLM_ANSWER_MODEL
    /// - APP_LLM_API_KEY (falls back to OPENAI_API_KEY)
    /// - APP_LLM_TIMEOUT_SECS: accepts "120", "120s", "2m"
    /// - APP_GENERATION_BATCH_SIZE, APP_GENERATION_THROTTLE_MS
    /// - APP_STORAGE_OUTPUT_DIR, APP_STORAGE_PUBLIC_BASE_URL
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(api_base) = std::env::var("APP_LLM_API_BASE") {
            self.llm.api_base = api_base;
            tracing::info!("Override llm.api_base from env: {}", self.llm.api_base);
        }

        if let Ok(api_key) = std::env::var("APP_LLM_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            self.llm.api_key = Some(api_key);
            tracing::info!("Override llm.api_key from env");
        }

        if let Ok(model) = std::env::var("APP_LLM_QUESTION_MODEL") {
            self.llm.question_model = model;
            tracing::info!("Override llm.question_model from env: {}", self.llm.question_model);
        }

        if let Ok(model) = std::env::var("APP_LLM_ANSWER_MODEL") {
            self.llm.answer_model = model;
            tracing::info!("Override llm.answer_model from env: {}", self.llm.answer_model);
        }

        if let Ok(timeout) = std::env::var("APP_LLM_TIMEOUT_SECS") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.llm.timeout_secs = val;
                    tracing::info!("Override llm.timeout_secs from env: {}", self.llm.timeout_secs);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_LLM_TIMEOUT_SECS '{}': {} (keep {})",
                    timeout,
                    e,
                    self.llm.timeout_secs
                ),
            }
        }

        if let Ok(batch_size) = std::env::var("APP_GENERATION_BATCH_SIZE")
            && let Ok(batch_size) = batch_size.parse()
        {
            self.generation.batch_size = batch_size;
            tracing::info!("Override generation.batch_size from env: {}", self.generation.batch_size);
        }

        if let Ok(throttle) = std::env::var("APP_GENERATION_THROTTLE_MS")
            && let Ok(throttle) = throttle.parse()
        {
            self.generation.throttle_ms = throttle;
            tracing::info!("Override generation.throttle_ms from env: {}", self.generation.throttle_ms);
        }

        if let Ok(dir) = std::env::var("APP_STORAGE_OUTPUT_DIR") {
            self.storage.output_dir = dir;
            tracing::info!("Override storage.output_dir from env: {}", self.storage.output_dir);
        }

        if let Ok(url) = std::env::var("APP_STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = url;
            tracing::info!(
                "Override storage.public_base_url from env: {}",
                self.storage.public_base_url
            );
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(db_url) = &args.database_url {
            self.database.url = db_url.clone();
            tracing::info!("Override database.url from CLI");
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(api_base) = &args.llm_api_base {
            self.llm.api_base = api_base.clone();
            tracing::info!("Override llm.api_base from CLI: {}", self.llm.api_base);
        }

        if let Some(timeout) = &args.llm_timeout {
            match parse_duration_to_secs(timeout) {
                Ok(val) => {
                    self.llm.timeout_secs = val;
                    tracing::info!("Override llm.timeout_secs from CLI: {}", self.llm.timeout_secs);
                },
                Err(e) => tracing::warn!(
                    "Invalid --llm-timeout '{}': {} (keep {})",
                    timeout,
                    e,
                    self.llm.timeout_secs
                ),
            }
        }

        if let Some(dir) = &args.output_dir {
            self.storage.output_dir = dir.clone();
            tracing::info!("Override storage.output_dir from CLI: {}", self.storage.output_dir);
        }

        if let Some(url) = &args.public_base_url {
            self.storage.public_base_url = url.clone();
            tracing::info!(
                "Override storage.public_base_url from CLI: {}",
                self.storage.public_base_url
            );
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.llm.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            tracing::warn!("⚠️  WARNING: No LLM API key configured!");
            tracing::warn!("⚠️  Set APP_LLM_API_KEY (or OPENAI_API_KEY); generation requests will fail");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.llm.api_base.trim().is_empty() {
            anyhow::bail!("llm.api_base cannot be empty");
        }
        if self.llm.timeout_secs == 0 {
            anyhow::bail!("llm.timeout_secs must be > 0");
        }

        if self.generation.batch_size == 0 {
            anyhow::bail!("generation.batch_size must be > 0");
        }
        if self.generation.max_attempts == 0 {
            anyhow::bail!("generation.max_attempts must be > 0");
        }
        if self.generation.prompt_context > self.generation.recent_window {
            anyhow::bail!("generation.prompt_context cannot exceed generation.recent_window");
        }

        if self.storage.output_dir.trim().is_empty() {
            anyhow::bail!("storage.output_dir cannot be empty");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/faultbase.db".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,faultbase=debug".to_string(),
            file: Some("logs/faultbase.log".to_string()),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            question_model: "gpt-4o-mini".to_string(),
            answer_model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
            question_temperature: 0.9,
            question_max_tokens: 8000,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_attempts: 5,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
            jitter: false,
            throttle_ms: 500,
            recent_window: 200,
            prompt_context: 50,
            answer_temperature: 0.7,
            answer_max_tokens: 2000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { output_dir: "public/batch-files".to_string(), public_base_url: "/files".to_string() }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(&v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_to_secs("45"), Ok(45));
        assert_eq!(parse_duration_to_secs("30s"), Ok(30));
        assert_eq!(parse_duration_to_secs("2m"), Ok(120));
        assert_eq!(parse_duration_to_secs("1h"), Ok(3600));
        assert!(parse_duration_to_secs("10x").is_err());
        assert!(parse_duration_to_secs("s").is_err());
    }

    #[test]
    fn test_toml_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [llm]
            api_base = "http://localhost:11434/v1"
            timeout_secs = "90s"

            [generation]
            batch_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.api_base, "http://localhost:11434/v1");
        assert_eq!(config.llm.timeout_secs, 90);
        assert_eq!(config.llm.question_model, "gpt-4o-mini");
        assert_eq!(config.generation.batch_size, 50);
        assert_eq!(config.generation.max_attempts, 5);
        assert_eq!(config.generation.recent_window, 200);
        assert_eq!(config.storage.public_base_url, "/files");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.generation.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.prompt_context = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
