//! Debugging entry points behind the `vodprobe` binary. Each prints JSON to stdout.

use anyhow::Context as _;
use serde::Serialize;

use crate::app::AppState;
use crate::app::model::SearchQuery;
use crate::cli::{DetailArgs, ProbeArgs, SearchArgs, SourcesArgs};
use crate::config::{ProbeSettings, SourceRegistry};
use crate::detail::DetailRequest;
use crate::probe::{HttpProbe, LivenessProbe as _};

pub async fn probe(args: ProbeArgs) -> anyhow::Result<()> {
    let probe = HttpProbe::new(ProbeSettings::from_env())?;
    let result = probe.probe(&args.url).await;
    print_json(&result)
}

pub async fn search(args: SearchArgs) -> anyhow::Result<()> {
    let registry = SourceRegistry::load(&args.sources)?;
    let query = SearchQuery {
        q: Some(args.query),
        query: None,
        sources: (!args.source_ids.is_empty()).then(|| args.source_ids.join(",")),
        page: Some(args.page.to_string()),
    };
    let search = query.validate(&registry)?;

    let state = AppState::from_env(registry)?;
    let response = state
        .aggregator
        .search(&search.query, &search.sources, search.page)
        .await;
    print_json(&response)
}

pub async fn detail(args: DetailArgs) -> anyhow::Result<()> {
    let registry = match args.custom_api {
        Some(_) => SourceRegistry::default(),
        None => SourceRegistry::load(&args.sources)?,
    };
    let request = DetailRequest {
        id: Some(args.id),
        source: args.source,
        custom_api: args.custom_api,
    };

    let state = AppState::from_env(registry)?;
    let detail = state.detail.fetch(&request).await?;
    print_json(&detail)
}

pub fn sources(args: SourcesArgs) -> anyhow::Result<()> {
    let registry = SourceRegistry::load(&args.sources)?;
    print_json(&registry.all())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}
