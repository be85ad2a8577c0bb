use std::path::Path;

use anyhow::Result;
use clap_serde_derive::ClapSerde;

#[derive(ClapSerde, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub(crate) address: String,

    /// The port the listener binds to
    #[default(5000)]
    #[arg(short, long, env)]
    pub(crate) port: u16,

    /// Secret used as bearer token against the completion API
    #[default("".to_string())]
    #[arg(long, env = "SECRET_KEY")]
    pub(crate) api_key: String,

    /// URL of the text completion endpoint
    #[default("https://api.openai.com/v1/completions".to_string())]
    #[arg(long, env)]
    pub(crate) completion_url: String,

    /// Model requested from the text completion endpoint
    #[default("gpt-3.5-turbo-instruct".to_string())]
    #[arg(long, env)]
    pub(crate) completion_model: String,

    /// URL of the chat completion endpoint
    #[default("https://api.openai.com/v1/chat/completions".to_string())]
    #[arg(long, env)]
    pub(crate) chat_url: String,

    /// Model requested from the chat completion endpoint
    #[default("gpt-3.5-turbo".to_string())]
    #[arg(long, env)]
    pub(crate) chat_model: String,

    /// Connection string of the document store
    #[default("sqlite://agile_assist.db".to_string())]
    #[arg(long, env)]
    pub(crate) database_url: String,

    /// CSV file the salary models are fitted on, also served by /data
    #[default("data/Data.csv".to_string())]
    #[arg(long, env)]
    pub(crate) dataset_path: String,

    /// OTLP endpoint that traces and metrics are exported to
    #[default("".to_string())]
    #[arg(long, env)]
    pub(crate) otel_endpoint: String,

    /// Also log to the console when exporting to OTLP
    #[default(false)]
    #[arg(long, env)]
    pub(crate) console: bool,

    /// PEM certificate, enables TLS together with the key file
    #[default("".to_string())]
    #[arg(long, env)]
    pub(crate) tls_cert_file: String,

    /// PEM private key, enables TLS together with the certificate file
    #[default("".to_string())]
    #[arg(long, env)]
    pub(crate) tls_key_file: String,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        let opt: <Config as ClapSerde>::Opt = toml::from_str(&str)?;
        Ok(Config::from(opt))
    }

    /// Like [`Config::from_toml`], but a missing file yields the defaults when `optional` is set.
    /// Unreadable or malformed files are always errors.
    pub fn load(path: &str, optional: bool) -> Result<Self> {
        if optional && !Path::new(path).exists() {
            return Ok(Config::default());
        }
        Self::from_toml(path)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn otel_endpoint(&self) -> Option<&str> {
        non_empty(&self.otel_endpoint)
    }

    /// Certificate and key paths, only when both are set
    pub fn tls_files(&self) -> Option<(&str, &str)> {
        non_empty(&self.tls_cert_file).zip(non_empty(&self.tls_key_file))
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
