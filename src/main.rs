use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    vodprobe::logging::init().context("init logging")?;

    let cli = vodprobe::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        vodprobe::cli::Command::Probe(args) => {
            vodprobe::commands::probe(args).await.context("probe")?;
        }
        vodprobe::cli::Command::Search(args) => {
            vodprobe::commands::search(args).await.context("search")?;
        }
        vodprobe::cli::Command::Detail(args) => {
            vodprobe::commands::detail(args).await.context("detail")?;
        }
        vodprobe::cli::Command::Sources(args) => {
            vodprobe::commands::sources(args).context("sources")?;
        }
    }

    Ok(())
}
