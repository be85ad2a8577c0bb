use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::completion::client::{OpenAiClient, Upstream};
use crate::completion::CompletionHandler;
use crate::config::Config;
use crate::prediction::dataset::SalaryDataset;
use crate::prediction::SalaryModels;
use crate::store::{DocumentStore, FEEDBACK_COLLECTION, WAITLIST_COLLECTION};
use crate::telemetry::{init_telemetry, shutdown_telemetry};

mod api;
mod completion;
mod config;
mod error;
mod extractors;
mod prediction;
mod store;
mod telemetry;

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_CONFIG_FILE: &str = "AgileAssist.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

/// Everything a request handler may touch, built once at startup
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) completion: Arc<dyn CompletionHandler>,
    pub(crate) salary_models: Arc<SalaryModels>,
    pub(crate) store: DocumentStore,
    pub(crate) dataset_path: Arc<PathBuf>,
}

impl AppState {
    async fn from_config(config: &Config) -> Result<Self> {
        let completion = OpenAiClient::new(
            config.api_key(),
            Upstream::parse(&config.completion_url, &config.completion_model)?,
            Upstream::parse(&config.chat_url, &config.chat_model)?,
        )?;

        let dataset = SalaryDataset::from_path(&config.dataset_path)?;
        let salary_models = SalaryModels::from_dataset(&dataset)?;
        let store = DocumentStore::connect(&config.database_url).await?;
        info!(
            feedback = store.count(FEEDBACK_COLLECTION).await?,
            waitlist = store.count(WAITLIST_COLLECTION).await?,
            "Document store ready"
        );

        Ok(Self {
            completion: Arc::new(completion),
            salary_models: Arc::new(salary_models),
            store,
            dataset_path: Arc::new(PathBuf::from(&config.dataset_path)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let optional = args.config_file == DEFAULT_CONFIG_FILE;
    let config = match Config::load(&args.config_file, optional) {
        Ok(conf) => conf.merge(args.opt_config),
        Err(err) => {
            eprintln!(
                "Failed to read configuration file {} with error: {:#}",
                args.config_file, err
            );
            std::process::exit(1);
        }
    };
    init_telemetry(config.otel_endpoint(), config.console)?;

    let state = match AppState::from_config(&config).await {
        Ok(state) => state,
        Err(err) => exit_err!(1, "Failed to start: {:#}", err),
    };
    let router = api::router(state);

    let address: SocketAddr = format!("{}:{}", config.address, config.port)
        .parse()
        .context("Invalid listen address")?;
    match config.tls_files() {
        Some((cert_file, key_file)) => {
            let tls = RustlsConfig::from_pem_file(cert_file, key_file)
                .await
                .context("Failed to load TLS certificate or key")?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            info!("Listening on https://{}", address);
            axum_server::bind_rustls(address, tls)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(address).await?;
            info!("Listening on http://{}", listener.local_addr()?);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[macro_export]
macro_rules! exit_err {
    ($code:expr, $fmt:expr $(, $arg:expr)*) => {
        {
            error!($fmt $(, $arg)*);
            std::process::exit($code);
        }
    };
}
