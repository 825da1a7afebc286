use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Default greeting spoken to a human caller before the relay starts.
const DEFAULT_GREETING: &str =
    "お電話ありがとうございます。質問にはなるべく丁寧に答えますので、お気軽にお話しください。";

/// Default instruction for the reply generator.
const DEFAULT_REPLY_PROMPT: &str =
    "質問に対してなるべく丁寧に回答してください。回答はなるべく簡潔に、100文字程度で話し言葉で返答してください。";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Externally reachable hostname used to build websocket and callback
    /// URLs. When unset, the per-request `Host` header is used instead.
    pub public_host: Option<String>,

    pub openai_api_key: String,
    pub chat_model: String,
    pub reply_system_prompt: String,

    pub greeting_text: String,
    pub reply_language: String,
    pub reply_style: u8,
    pub reply_premium: bool,

    pub recognizer_url: String,
    pub recognizer_api_key: String,
    pub recognizer_audio_format: String,
    pub recognizer_grammar: String,
    pub recognizer_connect_timeout_secs: u64,

    /// Fallback window after which a suppressed relay is re-enabled even if
    /// no completion notification arrived.
    pub relay_resume_secs: u64,

    pub vonage_application_id: String,
    pub vonage_private_key_path: PathBuf,
    pub vonage_number: String,
    pub vonage_api_url: Option<String>,

    /// Originating-number prefix that marks a call as one of our own
    /// outbound response calls.
    pub bot_number_prefix: String,

    pub log_level: Level,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let public_host = std::env::var("PUBLIC_HOST").ok();

        let openai_api_key = required("OPENAI_API_KEY")?;
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let reply_system_prompt = std::env::var("REPLY_SYSTEM_PROMPT")
            .unwrap_or_else(|_| DEFAULT_REPLY_PROMPT.to_string());

        let greeting_text =
            std::env::var("GREETING_TEXT").unwrap_or_else(|_| DEFAULT_GREETING.to_string());
        let reply_language =
            std::env::var("REPLY_LANGUAGE").unwrap_or_else(|_| "ja-JP".to_string());
        let reply_style = match std::env::var("REPLY_STYLE") {
            Ok(raw) => raw
                .parse::<u8>()
                .map_err(|e| ConfigError::InvalidValue("REPLY_STYLE".to_string(), e.to_string()))?,
            Err(_) => 3,
        };
        let reply_premium = match std::env::var("REPLY_PREMIUM") {
            Ok(raw) => raw.parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue("REPLY_PREMIUM".to_string(), e.to_string())
            })?,
            Err(_) => true,
        };

        let recognizer_url = std::env::var("RECOGNIZER_URL")
            .unwrap_or_else(|_| "wss://acp-api.amivoice.com/v1/nolog/".to_string());
        let recognizer_api_key = required("RECOGNIZER_API_KEY")?;
        let recognizer_audio_format =
            std::env::var("RECOGNIZER_AUDIO_FORMAT").unwrap_or_else(|_| "LSB8K".to_string());
        let recognizer_grammar =
            std::env::var("RECOGNIZER_GRAMMAR").unwrap_or_else(|_| "-a-general".to_string());
        let recognizer_connect_timeout_secs = parse_u64("RECOGNIZER_CONNECT_TIMEOUT_SECS", 10)?;

        let relay_resume_secs = parse_u64("RELAY_RESUME_SECS", 45)?;

        let vonage_application_id = required("VONAGE_APPLICATION_ID")?;
        let vonage_private_key_path = PathBuf::from(required("VONAGE_PRIVATE_KEY_PATH")?);
        let vonage_number = required("VONAGE_NUMBER")?;
        let vonage_api_url = std::env::var("VONAGE_API_URL").ok();

        let bot_number_prefix =
            std::env::var("BOT_NUMBER_PREFIX").unwrap_or_else(|_| "t".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            public_host,
            openai_api_key,
            chat_model,
            reply_system_prompt,
            greeting_text,
            reply_language,
            reply_style,
            reply_premium,
            recognizer_url,
            recognizer_api_key,
            recognizer_audio_format,
            recognizer_grammar,
            recognizer_connect_timeout_secs,
            relay_resume_secs,
            vonage_application_id,
            vonage_private_key_path,
            vonage_number,
            vonage_api_url,
            bot_number_prefix,
            log_level,
        })
    }
}
