use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub quotes: QuotesConfig,
    pub commands: CommandsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub signing_secret: SecretString,
    pub bot_token: SecretString,
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub signature_max_age_secs: u64,
}

#[derive(Clone, Debug)]
pub struct QuotesConfig {
    pub path: PathBuf,
}

/// Slash command names and the dataset keys each one reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandsConfig {
    pub random_quote: String,
    pub random_quote_category: String,
    pub author_quote: String,
    pub author_group: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub signing_secret: Option<String>,
    pub bot_token: Option<String>,
    pub api_base_url: Option<String>,
    pub quotes_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                signing_secret: String::new().into(),
                bot_token: String::new().into(),
                api_base_url: "https://slack.com/api".to_string(),
                timeout_secs: 10,
                signature_max_age_secs: 300,
            },
            quotes: QuotesConfig { path: PathBuf::from("messages.json") },
            commands: CommandsConfig::default(),
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 3000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            random_quote: "/randomportuguesequote".to_string(),
            random_quote_category: "random".to_string(),
            author_quote: "/randomauthorquote".to_string(),
            author_group: "author".to_string(),
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file || options.config_path.is_some() {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quotebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(signing_secret) = slack.signing_secret {
                self.slack.signing_secret = secret_value(signing_secret);
            }
            if let Some(bot_token) = slack.bot_token {
                self.slack.bot_token = secret_value(bot_token);
            }
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = slack.timeout_secs {
                self.slack.timeout_secs = timeout_secs;
            }
            if let Some(signature_max_age_secs) = slack.signature_max_age_secs {
                self.slack.signature_max_age_secs = signature_max_age_secs;
            }
        }

        if let Some(quotes) = patch.quotes {
            if let Some(path) = quotes.path {
                self.quotes.path = path;
            }
        }

        if let Some(commands) = patch.commands {
            if let Some(random_quote) = commands.random_quote {
                self.commands.random_quote = random_quote;
            }
            if let Some(random_quote_category) = commands.random_quote_category {
                self.commands.random_quote_category = random_quote_category;
            }
            if let Some(author_quote) = commands.author_quote {
                self.commands.author_quote = author_quote;
            }
            if let Some(author_group) = commands.author_group {
                self.commands.author_group = author_group;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let signing_secret =
            read_env("QUOTEBOT_SLACK_SIGNING_SECRET").or_else(|| read_env("SLACK_SIGNING_KEY"));
        if let Some(value) = signing_secret {
            self.slack.signing_secret = secret_value(value);
        }
        let bot_token = read_env("QUOTEBOT_SLACK_BOT_TOKEN").or_else(|| read_env("SLACK_TOKEN"));
        if let Some(value) = bot_token {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("QUOTEBOT_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }
        if let Some(value) = read_env("QUOTEBOT_SLACK_TIMEOUT_SECS") {
            self.slack.timeout_secs = parse_u64("QUOTEBOT_SLACK_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("QUOTEBOT_SLACK_SIGNATURE_MAX_AGE_SECS") {
            self.slack.signature_max_age_secs =
                parse_u64("QUOTEBOT_SLACK_SIGNATURE_MAX_AGE_SECS", &value)?;
        }

        if let Some(value) = read_env("QUOTEBOT_QUOTES_PATH") {
            self.quotes.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("QUOTEBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUOTEBOT_SERVER_PORT") {
            self.server.port = parse_u16("QUOTEBOT_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }

        let log_level =
            read_env("QUOTEBOT_LOGGING_LEVEL").or_else(|| read_env("QUOTEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEBOT_LOGGING_FORMAT").or_else(|| read_env("QUOTEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(signing_secret) = overrides.signing_secret {
            self.slack.signing_secret = secret_value(signing_secret);
        }
        if let Some(bot_token) = overrides.bot_token {
            self.slack.bot_token = secret_value(bot_token);
        }
        if let Some(api_base_url) = overrides.api_base_url {
            self.slack.api_base_url = api_base_url;
        }
        if let Some(quotes_path) = overrides.quotes_path {
            self.quotes.path = quotes_path;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_quotes(&self.quotes)?;
        validate_commands(&self.commands)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quotebot.toml"), PathBuf::from("config/quotebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if slack.signing_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.signing_secret is required. Get it from https://api.slack.com/apps > Your App > Basic Information > App Credentials".to_string(),
        ));
    }

    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions".to_string(),
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        return Err(ConfigError::Validation(
            "slack.bot_token must start with `xoxb-`. Get it from https://api.slack.com/apps"
                .to_string(),
        ));
    }

    let base_url = slack.api_base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "slack.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if slack.timeout_secs == 0 || slack.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "slack.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if slack.signature_max_age_secs == 0 || slack.signature_max_age_secs > 3_600 {
        return Err(ConfigError::Validation(
            "slack.signature_max_age_secs must be in range 1..=3600".to_string(),
        ));
    }

    Ok(())
}

fn validate_quotes(quotes: &QuotesConfig) -> Result<(), ConfigError> {
    if quotes.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("quotes.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_commands(commands: &CommandsConfig) -> Result<(), ConfigError> {
    for (key, name) in
        [("commands.random_quote", &commands.random_quote), ("commands.author_quote", &commands.author_quote)]
    {
        if !name.starts_with('/') || name.len() < 2 || name.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "{key} must be a slash command such as `/quote` (got `{name}`)"
            )));
        }
    }

    if commands.random_quote == commands.author_quote {
        return Err(ConfigError::Validation(format!(
            "commands.random_quote and commands.author_quote must differ (both are `{}`)",
            commands.random_quote
        )));
    }

    for (key, value) in [
        ("commands.random_quote_category", &commands.random_quote_category),
        ("commands.author_group", &commands.author_group),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    quotes: Option<QuotesPatch>,
    commands: Option<CommandsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    signing_secret: Option<String>,
    bot_token: Option<String>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
    signature_max_age_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotesPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CommandsPatch {
    random_quote: Option<String>,
    random_quote_category: Option<String>,
    author_quote: Option<String>,
    author_group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
