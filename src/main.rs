use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use craigslist_housing::adapters::llm::client::ChatCompletionClassifier;
use craigslist_housing::adapters::scraper::client::CraigslistScraper;
use craigslist_housing::config::load_config;
use craigslist_housing::config::types::Config;
use craigslist_housing::domain::listing::{FetchReport, Listing};
use craigslist_housing::domain::search_params::{
    Category, Laundry, Neighborhood, SearchFilters, SearchRequest,
};
use craigslist_housing::scout::Scout;

#[derive(Parser)]
#[command(name = "craigslist-housing")]
#[command(about = "Search Craigslist housing ads and enrich them with a language model", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to config.yaml")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and print every fetched listing as JSON.
    Search(SearchArgs),
    /// Fetch and print a single listing page.
    Listing {
        #[arg(help = "URL of the listing page")]
        url: String,
    },
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, default_value = "", help = "Free-text search query")]
    query: String,

    #[arg(long, default_value = "apartment", value_parser = parse_arg::<Category>, help = "apartment, sublet or room")]
    category: Category,

    #[arg(long, default_value = "sfbay", help = "Site subdomain, e.g. sfbay")]
    city: String,

    #[arg(long)]
    max_bedrooms: Option<u32>,

    #[arg(long)]
    max_price: Option<u32>,

    #[arg(long = "neighborhood", value_parser = parse_arg::<Neighborhood>, help = "Neighborhood slug or name (repeatable)")]
    neighborhoods: Vec<Neighborhood>,

    #[arg(long, value_parser = parse_arg::<Laundry>, help = "in-unit, in-building, on-site, hookups or none (repeatable)")]
    laundry: Vec<Laundry>,

    #[arg(long, help = "Fetch at most this many search results")]
    limit: Option<usize>,
}

impl SearchArgs {
    fn into_request(self) -> SearchRequest {
        SearchRequest::new(self.query, self.category, self.city).with_filters(SearchFilters {
            max_bedrooms: self.max_bedrooms,
            max_price: self.max_price,
            neighborhoods: self.neighborhoods.into_iter().collect(),
            laundry: self.laundry.into_iter().collect(),
        })
    }
}

fn parse_arg<T>(s: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e: T::Err| e.to_string())
}

fn find_config_path() -> PathBuf {
    let candidates = [PathBuf::from("config.yaml"), exe_dir().join("config.yaml")];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn build_scout(config: Config) -> Result<Scout> {
    let model = config.model.resolve_model()?;
    let api_key = config.model.resolve_api_key();
    if api_key.is_none() {
        warn!(env = %config.model.api_key_env, "No model API key set");
    }

    let scraper = CraigslistScraper::new(&config.scraper).context("failed to build HTTP client")?;
    let classifier = ChatCompletionClassifier::new(model, &config.model, api_key)
        .context("failed to build model client")?;
    info!(model = classifier.model(), "Using model");

    let scout = Scout::new(Arc::new(scraper), Arc::new(classifier));
    Ok(match config.scraper.base_url {
        Some(base) => scout.with_base_url(base),
        None => scout,
    })
}

fn print_listing(listing: &Listing, report: &FetchReport) -> Result<()> {
    for failure in &report.failed_enrichments {
        warn!(url = listing.url(), field = %failure.field, reason = %failure.reason, "Field not enriched");
    }
    println!("{}", serde_json::to_string_pretty(listing)?);
    Ok(())
}

async fn run_search(scout: &Scout, args: SearchArgs) -> Result<()> {
    let limit = args.limit;
    let request = args.into_request();

    let report = scout.search(&request).await?;
    if !report.is_success() {
        warn!(url = %report.url, status = report.status, "Search returned no results page");
        return Ok(());
    }

    let total = report.listings.len();
    let mut fetched = 0usize;
    for mut listing in report.listings.into_iter().take(limit.unwrap_or(usize::MAX)) {
        match scout.fetch_listing(&mut listing).await {
            Ok(fetch) if fetch.is_success() => {
                print_listing(&listing, &fetch)?;
                fetched += 1;
            }
            Ok(fetch) => warn!(url = listing.url(), status = fetch.status, "Skipping listing"),
            Err(e) => warn!(url = listing.url(), error = %e, "Skipping listing"),
        }
    }

    info!(found = total, fetched, "Done");
    Ok(())
}

async fn run_listing(scout: &Scout, url: &str) -> Result<()> {
    let (listing, report) = scout.fetch_url(url).await?;
    if !report.is_success() {
        bail!("listing {url} returned HTTP {}", report.status);
    }
    print_listing(&listing, &report)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON listings.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(find_config_path);
    let config = load_config(&config_path)?;
    let scout = build_scout(config)?;

    match cli.command {
        Commands::Search(args) => run_search(&scout, args).await,
        Commands::Listing { url } => run_listing(&scout, &url).await,
    }
}
