use std::path::PathBuf;
use std::sync::Arc;

use bgmtv::BgmtvClient;
use catalog::{
    EnrichmentPipeline, FileBlobStore, Item, MemoryResultCache, Orchestrator, Settings,
    SnapshotStore,
};
use clap::{Args, Parser, Subcommand};
use metadata::{BgmtvCatalog, ListRequest, LookupProvider, TmdbProvider, TvdbProvider, CALENDAR_LIST};
use parking_lot::RwLock;
use tmdb::TmdbClient;
use tvdb::TvdbClient;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(version, about = "Airing anime calendar enriched from TMDB and TheTVDB", long_about = None)]
struct Cli {
    /// Settings file, created with defaults if missing
    #[arg(short, long, default_value = "catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the list, refreshing it only if the stored copy is stale
    List(ListArgs),
    /// Rebuild and store the list now
    Refresh(ListArgs),
    /// Print items added by the last refresh
    New(ListArgs),
    /// Write the default settings file
    InitConfig,
}

#[derive(Args)]
struct ListArgs {
    /// Only this weekday (1 = Monday, 7 = Sunday)
    #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..=7))]
    weekday: Option<i32>,

    /// At most this many items
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    fn request(&self) -> ListRequest {
        let mut request = ListRequest::new(CALENDAR_LIST);
        if let Some(weekday) = self.weekday {
            request = request.with_weekday(weekday);
        }
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        request
    }
}

fn build_orchestrator(settings: &Settings) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("catalog-cli/", env!("CARGO_PKG_VERSION")))
        .build()?;

    if settings.tmdb.api_key.is_empty() {
        tracing::warn!("tmdb.api_key is not set, TMDB lookups will fail");
    }
    if settings.tvdb.api_key.is_empty() {
        tracing::warn!("tvdb.api_key is not set, TheTVDB lookups will fail");
    }

    let tmdb = TmdbClient::new(http.clone(), Arc::new(RwLock::new(settings.tmdb.api_key.clone())));
    let tvdb = TvdbClient::new(http.clone(), settings.tvdb.api_key.clone());
    let bgmtv = BgmtvClient::new(http);

    let reference: Arc<dyn LookupProvider> = Arc::new(TmdbProvider::new(Arc::new(tmdb)));
    let secondary: Arc<dyn LookupProvider> = Arc::new(TvdbProvider::new(Arc::new(tvdb)));
    let pipeline = EnrichmentPipeline::new(
        reference,
        secondary,
        settings.enrichment.markers()?,
        settings.pipeline_options(),
    );

    let blobs = FileBlobStore::new(settings.store.root.clone());
    let snapshots = SnapshotStore::new(Arc::new(blobs), settings.store.max_document_bytes);

    Ok(Orchestrator::new(
        Arc::new(BgmtvCatalog::new(Arc::new(bgmtv))),
        pipeline,
        snapshots,
    )
    .with_freshness(settings.freshness.policy()?)
    .with_cache(Arc::new(MemoryResultCache::new(settings.cache.ttl()?))))
}

fn print_items(items: &[Item], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    for item in items {
        println!(
            "{:>8}  {:<10}  {}",
            item.source_id,
            item.air_date.as_deref().unwrap_or("-"),
            item.display_title().unwrap_or("(untitled)")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_or_create(&cli.config).await?;

    match cli.command {
        Command::InitConfig => {
            println!("Settings at {}", cli.config.display());
        }
        Command::List(args) => {
            let orchestrator = build_orchestrator(&settings)?;
            let items = orchestrator.get_list_cached_or_fresh(&args.request()).await?;
            print_items(&items, args.json)?;
        }
        Command::Refresh(args) => {
            let orchestrator = build_orchestrator(&settings)?;
            let refreshed = orchestrator.force_refresh(&args.request()).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&refreshed)?);
            } else {
                print_items(&refreshed.items, false)?;
                println!(
                    "{} items, {} new, {} provider lookups",
                    refreshed.items.len(),
                    refreshed.new_items.len(),
                    refreshed.report.lookups()
                );
            }
        }
        Command::New(args) => {
            let orchestrator = build_orchestrator(&settings)?;
            let items = orchestrator.whats_new(&args.request()).await?;
            print_items(&items, args.json)?;
        }
    }

    Ok(())
}
