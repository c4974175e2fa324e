use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// HEAD-probe one media URL and print the verdict.
    Probe(ProbeArgs),
    /// Run the full multi-source search pipeline.
    Search(SearchArgs),
    /// Fetch one video and keep only playable episodes.
    Detail(DetailArgs),
    /// List the configured sources.
    Sources(SourcesArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Media URL (http/https).
    pub url: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// YAML source registry.
    #[arg(long, env = "VODPROBE_SOURCES", default_value = "config/sources.yaml")]
    pub sources: PathBuf,

    #[arg(long)]
    pub query: String,

    /// Source id to search (repeatable; default: all enabled sources).
    #[arg(long = "source")]
    pub source_ids: Vec<String>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("origin").required(true).args(["source", "custom_api"])))]
pub struct DetailArgs {
    /// YAML source registry (ignored with `--custom-api`).
    #[arg(long, env = "VODPROBE_SOURCES", default_value = "config/sources.yaml")]
    pub sources: PathBuf,

    #[arg(long)]
    pub id: String,

    /// Registered source id.
    #[arg(long)]
    pub source: Option<String>,

    /// CMS API base outside the registry.
    #[arg(long)]
    pub custom_api: Option<String>,
}

#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// YAML source registry.
    #[arg(long, env = "VODPROBE_SOURCES", default_value = "config/sources.yaml")]
    pub sources: PathBuf,
}
