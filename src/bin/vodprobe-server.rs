use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use vodprobe::app::{AppState, router};
use vodprobe::config::SourceRegistry;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// YAML source registry.
    #[arg(long, env = "VODPROBE_SOURCES", default_value = "config/sources.yaml")]
    sources: PathBuf,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    vodprobe::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting vodprobe-server");

    let registry = SourceRegistry::load(&args.sources)?;
    tracing::info!(
        sources = registry.all().len(),
        enabled = registry.enabled().len(),
        "loaded source registry"
    );

    let state = AppState::from_env(registry)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
