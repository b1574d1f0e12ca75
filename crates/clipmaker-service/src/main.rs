//! clipmakerd: the clip maker web service.

use std::net::SocketAddr;

use clap::Parser;
use clipmaker_service::{server, AppConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "clipmakerd", version, about = "Clip maker behind identity and entitlement gates")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CLIPMAKER_CONFIG")]
    config: Option<String>,

    /// Socket address to bind, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Platform API key
    #[arg(long, env = "WHOP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Platform application id
    #[arg(long, env = "WHOP_APP_ID")]
    app_id: Option<String>,

    /// Company id used for the dashboard link
    #[arg(long, env = "WHOP_COMPANY_ID")]
    company_id: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(config: &AppConfig, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(api_key) = cli.api_key {
        config.platform.api_key = api_key;
    }
    if let Some(app_id) = cli.app_id {
        config.platform.app_id = app_id;
    }
    if let Some(company_id) = cli.company_id {
        config.platform.company_id = company_id;
    }

    init_tracing(&config, cli.log_json);
    tracing::debug!(?config, "resolved configuration");

    server::serve(config).await?;
    Ok(())
}
