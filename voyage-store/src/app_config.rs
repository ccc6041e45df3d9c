use serde::Deserialize;
use std::env;
use voyage_shared::pii::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub amadeus: AmadeusConfig,
    pub unsplash: UnsplashConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: Option<Masked<String>>,
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusConfig {
    pub api_key: Option<Masked<String>>,
    pub secret_key: Option<Masked<String>>,
    /// `sandbox` selects the test host.
    pub env: Option<String>,
    /// Explicit host; ignored unless it starts with http:// or https://.
    pub base_url: Option<String>,
    #[serde(default = "default_amadeus_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_amadeus_timeout_secs() -> u64 {
    20
}

pub const AMADEUS_PRODUCTION: &str = "https://api.amadeus.com";
pub const AMADEUS_SANDBOX: &str = "https://test.api.amadeus.com";

impl AmadeusConfig {
    pub fn resolved_base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().map(str::trim) {
            if url.starts_with("http://") || url.starts_with("https://") {
                return url.to_string();
            }
        }
        if self.env.as_deref() == Some("sandbox") {
            AMADEUS_SANDBOX.to_string()
        } else {
            AMADEUS_PRODUCTION.to_string()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnsplashConfig {
    pub access_key: Option<Masked<String>>,
    pub app_id: Option<String>,
    pub base_url: String,
}

// Conventional variable names, honored alongside the VOYAGE__ prefixed ones.
const WELL_KNOWN_ENV: [(&str, &str); 8] = [
    ("OPENAI_API_KEY", "llm.api_key"),
    ("AMADEUS_API_KEY", "amadeus.api_key"),
    ("AMADEUS_SECRET_KEY", "amadeus.secret_key"),
    ("AMADEUS_ENV", "amadeus.env"),
    ("AMADEUS_BASE_URL", "amadeus.base_url"),
    ("UNSPLASH_ACCESS_KEY", "unsplash.access_key"),
    ("UNSPLASH_APP_ID", "unsplash.app_id"),
    ("DATABASE_URL", "database.url"),
];

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VOYAGE__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("VOYAGE").separator("__"));

        for (var, key) in WELL_KNOWN_ENV {
            let value = env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        builder.build()?.try_deserialize()
    }
}
