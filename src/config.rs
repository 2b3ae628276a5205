//! Application configuration.
//!
//! Layered the usual way: built-in defaults, then an optional YAML
//! file, then `BOOK_`-prefixed environment variables (`__` separator,
//! e.g. `BOOK_SERVER__PORT=8080`), then explicit CLI flags on top.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Directory backing durable storage
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<String>,

    /// Run without durable storage (sign-up/sign-in become unavailable)
    #[arg(long, env = "STORAGE_DISABLED")]
    pub storage_disabled: bool,

    /// Base URL of the remote answering service
    #[arg(long, env = "ANSWERING_URL")]
    pub answering_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// When false the no-op backend is used: the service still serves
    /// pages and chat, but registration and sign-in report storage as
    /// unavailable.
    pub enabled: bool,
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Base URL of the question-answering backend.
    pub answering_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.enabled", true)?
            .set_default("storage.data_dir", "data")?
            .set_default("chat.answering_url", "http://127.0.0.1:8000")?;

        // An explicitly named file must exist; the ./config.yaml
        // fallback is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("BOOK")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags win over every other source.
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(dir) = &cli.data_dir {
            builder = builder.set_override("storage.data_dir", dir.as_str())?;
        }
        if cli.storage_disabled {
            builder = builder.set_override("storage.enabled", false)?;
        }
        if let Some(endpoint) = &cli.answering_url {
            builder = builder.set_override("chat.answering_url", endpoint.as_str())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;

        // Fail fast on an endpoint reqwest could never use.
        url::Url::parse(&cfg.chat.answering_url)
            .map_err(|e| ConfigError::Message(format!("invalid chat.answering_url: {e}")))?;

        Ok(cfg)
    }
}
