use clap::{Parser, ValueEnum};
use kitten_core::config::{EngineKind, ServerConfig};
use kitten_core::{GatewayConfig, SERVER_VERSION};
use kitten_gateway::GatewayServer;
use kitten_voice::{build_engine, engine_retry, EngineCell};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Tone,
    Remote,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Tone => EngineKind::Tone,
            EngineArg::Remote => EngineKind::Remote,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kittentts", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "KITTENTTS_CONFIG", default_value = "kittentts.toml")]
    config: PathBuf,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Synthesis engine
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Remote engine endpoint, e.g. http://127.0.0.1:5000/synthesize
    #[arg(long)]
    engine_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(engine) = self.engine {
            config.engine.kind = engine.into();
        }
        if let Some(url) = &self.engine_url {
            config.engine.url = Some(url.clone());
        }
        if self.json_logs {
            config.server.json_logs = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Config first: it decides the log level and format.
    let (mut config, load_error) = match GatewayConfig::load(&args.config) {
        Ok(cfg) => (cfg, None),
        Err(e) => (GatewayConfig::from_env(), Some(e)),
    };
    args.apply(&mut config);
    init_tracing(&config.server);

    info!("Starting KittenTTS gateway v{}", SERVER_VERSION);
    match load_error {
        None => info!("Loaded config from {}", args.config.display()),
        Some(e) => info!(
            "Config {} not loaded ({:#}), using defaults",
            args.config.display(),
            e
        ),
    }
    info!(
        "Limits: max_total_chars={}, max_chars_per_chunk={}, chunking={}",
        config.text.max_total_chars, config.text.max_chars_per_chunk, config.text.enable_chunking
    );

    let engine = Arc::new(EngineCell::new());
    let server = GatewayServer::new(config.clone(), engine.clone());
    let listener = server.listen().await?;

    // Requests get 503 until this finishes; a final failure stops the server.
    let (failed_tx, failed_rx) = tokio::sync::oneshot::channel::<anyhow::Error>();
    tokio::spawn(async move {
        let started = Instant::now();
        info!("Initializing {:?} speech engine...", config.engine.kind);
        let retry = engine_retry(&config);
        match engine
            .initialize_with_retry(&retry, || build_engine(&config))
            .await
        {
            Ok(_) => info!(
                "Speech engine loaded in {:.2}s",
                started.elapsed().as_secs_f64()
            ),
            Err(e) => {
                error!("Failed to initialize speech engine: {:#}", e);
                let _ = failed_tx.send(e);
            }
        }
    });

    tokio::select! {
        result = server.serve(listener, shutdown_signal()) => result?,
        Ok(e) = failed_rx => return Err(e.context("Speech engine unavailable, shutting down")),
    }
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", server.log_level)));

    let fmt_layer = if server.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
