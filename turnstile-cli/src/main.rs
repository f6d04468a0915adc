use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use turnstile_core::IceServerConfig;
use turnstile_server::{
    DEFAULT_STUN_URL, Gateway, GatewayConfig, LocalDescriptionPolicy, TransformRegistry,
    WebRtcEngine, serve,
};

#[derive(Debug, Parser)]
#[command(
    name = "turnstile",
    version,
    about = "WebRTC signaling gateway serving one media session at a time"
)]
struct Cli {
    /// Address the signaling server listens on.
    #[arg(long, env = "TURNSTILE_LISTEN", default_value = "0.0.0.0:8764")]
    listen: SocketAddr,

    /// Clients allowed in the queue at once, the negotiating one included.
    #[arg(long, env = "TURNSTILE_MAX_CONNECTIONS", default_value_t = 3)]
    max_connections: usize,

    #[arg(long, env = "TURNSTILE_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    #[arg(long, env = "TURNSTILE_OFFER_TIMEOUT_SECS", default_value_t = 30)]
    offer_timeout_secs: u64,

    #[arg(long, env = "TURNSTILE_CONNECT_TIMEOUT_SECS", default_value_t = 60)]
    connect_timeout_secs: u64,

    #[arg(long, env = "STUN_SV_URL", default_value = DEFAULT_STUN_URL)]
    stun_url: String,

    #[arg(long, env = "TURN_SV_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_SV_USER")]
    turn_user: Option<String>,

    #[arg(long, env = "TURN_SV_PASSWORD", hide_env_values = true)]
    turn_password: Option<String>,

    /// Answer even when the engine rejects its own local description.
    #[arg(long, env = "TURNSTILE_LENIENT_LOCAL_DESCRIPTION")]
    lenient_local_description: bool,
}

impl Cli {
    fn into_config(self) -> Result<GatewayConfig> {
        anyhow::ensure!(self.max_connections > 0, "--max-connections must be at least 1");
        anyhow::ensure!(self.poll_interval_ms > 0, "--poll-interval-ms must be at least 1");

        let mut ice_servers = vec![IceServerConfig::stun(self.stun_url)];
        match (self.turn_url, self.turn_user, self.turn_password) {
            (Some(url), Some(user), Some(password)) => {
                ice_servers.push(IceServerConfig::turn(url, user, password));
            }
            (Some(url), _, _) => {
                warn!("TURN server {} configured without credentials, ignoring it", url);
            }
            _ => {}
        }

        let local_description_policy = if self.lenient_local_description {
            LocalDescriptionPolicy::Lenient
        } else {
            LocalDescriptionPolicy::Strict
        };

        Ok(GatewayConfig {
            listen_addr: self.listen,
            max_connections: self.max_connections,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            offer_timeout: Duration::from_secs(self.offer_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ice_servers,
            local_description_policy,
            ..GatewayConfig::default()
        })
    }
}

fn init_tracing() {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter_layer)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();

    let config = cli.into_config()?;
    info!(
        max_connections = config.max_connections,
        ice_servers = config.ice_servers.len(),
        policy = ?config.local_description_policy,
        "Configuration loaded"
    );

    let transforms = TransformRegistry::new();
    info!("Video transforms: {}", transforms.names().join(", "));
    let engine = Arc::new(WebRtcEngine::new(transforms, config.ice_gathering_timeout));

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    let gateway = Gateway::new(config, engine);

    serve(listener, gateway, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
