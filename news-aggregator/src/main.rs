use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use news_aggregator::digest::{latest_update, summary, SUMMARY_CHARS};
use news_aggregator::export::{export_detailed, export_plain, write_report};
use news_aggregator::{
    Aggregator, AggregatorConfig, CategoryFilter, DigestArchive, DigestLoad, FetchConfig, HttpSourceFetcher, Query,
    Session, SourceRegistry, View, ALL_CATEGORIES,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "news-aggregator", version, about = "Aggregate the last 24 hours of news from RSS feeds")]
struct Cli {
    /// JSON file with the source catalog; the built-in catalog is used when absent
    #[arg(long, global = true, env = "NEWS_SOURCES")]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, merge and print the news list
    News(NewsArgs),
    /// Print the daily digest file for a date
    Digest(DigestArgs),
    /// List configured sources and categories
    Sources,
}

#[derive(Args)]
struct NewsArgs {
    /// Restrict to these source labels (repeatable); defaults to the enabled sources
    #[arg(long = "source")]
    source_labels: Vec<String>,

    #[arg(long, default_value = ALL_CATEGORIES)]
    category: String,

    /// Case-insensitive title filter
    #[arg(long, default_value = "")]
    search: String,

    /// Write the result to a plain-text report
    #[arg(long)]
    export: Option<PathBuf>,

    /// Include links and read status in the report
    #[arg(long)]
    detailed: bool,

    /// Keep running and re-render every `refresh_secs`
    #[arg(long)]
    watch: bool,

    #[arg(long, env = "NEWS_REFRESH_SECS", default_value_t = 300)]
    refresh_secs: u64,

    #[arg(long, env = "NEWS_CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,

    #[arg(long, env = "NEWS_MAX_CONCURRENCY", default_value_t = 8)]
    max_concurrency: usize,

    #[arg(long, env = "NEWS_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Args)]
struct DigestArgs {
    /// Day to show (YYYY-MM-DD); today when absent
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Directory holding news.txt and archive/
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let registry = match &cli.sources {
        Some(path) => SourceRegistry::from_json_file(path)
            .with_context(|| format!("loading sources from {}", path.display()))?,
        None => SourceRegistry::builtin(),
    };

    match cli.command {
        Command::News(args) => run_news(registry, args).await,
        Command::Digest(args) => run_digest(args),
        Command::Sources => {
            list_sources(&registry);
            Ok(())
        }
    }
}

async fn run_news(registry: SourceRegistry, args: NewsArgs) -> anyhow::Result<()> {
    let fetch_config = FetchConfig {
        timeout_seconds: args.timeout_secs,
        ..FetchConfig::default()
    };
    let aggregator_config = AggregatorConfig {
        max_concurrent_fetches: args.max_concurrency,
        cache_ttl_seconds: args.cache_ttl_secs,
        ..AggregatorConfig::default()
    };

    let category = CategoryFilter::parse(&args.category);
    let mut q = if args.source_labels.is_empty() {
        Query::defaults(&registry)
    } else {
        Query::for_sources(&registry, args.source_labels.iter().cloned()).with_context(|| {
            let known: Vec<_> = registry.labels().into_iter().collect();
            format!("known sources: {}", known.join(", "))
        })?
    };
    q = q.with_category(category).with_search(args.search.clone());

    let fetcher = Arc::new(HttpSourceFetcher::new(fetch_config)?);
    let aggregator = Arc::new(Aggregator::new(Arc::new(registry), fetcher, aggregator_config));
    let session = Session::new(aggregator);

    info!("Starting news aggregation ({} sources active)", q.active_sources.len());
    render(&session, &q, &args).await?;

    if !args.watch {
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(args.refresh_secs.max(1)));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => render(&session, &q, &args).await?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, exiting");
                return Ok(());
            }
        }
    }
}

async fn render(session: &Session, q: &Query, args: &NewsArgs) -> anyhow::Result<()> {
    let view = session.view(q).await;
    let report = session.aggregator().last_report().await;

    if let Some(report) = &report {
        if !report.sources_failed.is_empty() {
            warn!("Sources without data this cycle: {}", report.sources_failed.join(", "));
        }
    }

    match &view {
        View::NoData => println!("Nessuna fonte ha restituito notizie nelle ultime 24 ore."),
        View::NoMatches => println!("Nessuna notizia corrisponde ai filtri selezionati."),
        View::Items(result) => {
            println!(
                "{} notizie ({} nuove) - aggiornato {}",
                result.len(),
                result.unseen_count(),
                Local::now().format("%H:%M:%S")
            );
            for (index, item) in result.items().iter().enumerate() {
                let marker = if result.is_new(index) { "*" } else { " " };
                println!(
                    "{} [{}] {}: {}\n    {}",
                    marker,
                    item.published_at.with_timezone(&Local).format("%H:%M"),
                    item.source_label,
                    item.title,
                    item.link
                );
            }
        }
    }

    if let (Some(path), View::Items(result)) = (&args.export, &view) {
        let text = if args.detailed {
            export_detailed(result, &q.category, Local::now())
        } else {
            export_plain(result, &q.category, Local::now())
        };
        write_report(path, &text).with_context(|| format!("writing report to {}", path.display()))?;
    }

    Ok(())
}

fn run_digest(args: DigestArgs) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let date = args.date.unwrap_or(today);
    let archive = DigestArchive::new(&args.root);
    let path = archive.path_for(date, today);
    let label = if date == today {
        "oggi".to_string()
    } else {
        date.format("%d/%m/%Y").to_string()
    };

    match archive.load(date, today)? {
        DigestLoad::Missing => {
            println!("Nessun file trovato per {}.", label);
            println!("Controlla che esista: {}", path.display());
        }
        DigestLoad::Invalid => {
            println!("Nessuna notizia valida trovata per {}.", label);
            println!("Possibile problema di formato nel file.");
        }
        DigestLoad::Entries(entries) => {
            if let Some(latest) = latest_update(&entries) {
                println!("Ultimo aggiornamento: {} - {}", latest, label);
            }
            for entry in &entries {
                println!("\n{}\n  {}\n  {}", entry.title, entry.updated_at, summary(&entry.body, SUMMARY_CHARS));
            }
        }
    }
    Ok(())
}

fn list_sources(registry: &SourceRegistry) {
    for source in registry.sources() {
        let categories: Vec<_> = source.categories.iter().map(String::as_str).collect();
        println!(
            "{:<10} {:<24} [{}]{}",
            source.short_label,
            source.display_name,
            categories.join(", "),
            if source.default_enabled { "" } else { " (off)" }
        );
    }
    let categories: Vec<_> = registry.categories().into_iter().collect();
    println!("\nCategorie: {}", categories.join(", "));
}
