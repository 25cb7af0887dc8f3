use clap::{Args, Parser, Subcommand};
use gadgetcache::{
    AdvisorConfig, CacheCoordinator, NormalizerConfig, ReplayScraper, SpecFilter, WorkingSet,
};
use gadgetcache_providers::ProviderConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Semantic cache for scraped phone listings
#[derive(Parser, Debug)]
#[command(name = "gadgetcache")]
#[command(version, about = "Answer phone queries from a semantic cache before scraping", long_about = None)]
struct Cli {
    /// Path to the cache directory
    #[arg(short, long, env = "GADGETCACHE_DATA_DIR", default_value = "./cache_db", global = true)]
    data_dir: PathBuf,

    /// Embedding dimension
    #[arg(long, env = "GADGETCACHE_EMBEDDING_DIM", default_value_t = 256, global = true)]
    embedding_dim: usize,

    /// LMDB map size in MiB
    #[arg(long, env = "GADGETCACHE_MAP_SIZE_MB", default_value_t = 1024, global = true)]
    map_size_mb: usize,

    /// Minimum relevance (0-100) for a cached record to count as a hit
    #[arg(long, env = "GADGETCACHE_MIN_RELEVANCE", global = true)]
    min_relevance: Option<f32>,

    #[command(flatten)]
    llm: LlmArgs,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// OpenAI-compatible API base URL
    #[arg(long, env = "GADGETCACHE_LLM_API_BASE", default_value = "https://api.openai.com/v1", global = true)]
    llm_api_base: String,

    /// API key; enables assisted spec extraction and query rewriting
    #[arg(long, env = "GADGETCACHE_LLM_API_KEY", hide_env_values = true, global = true)]
    llm_api_key: Option<String>,

    /// Chat model
    #[arg(long, env = "GADGETCACHE_LLM_MODEL", default_value = "gpt-4o-mini", global = true)]
    llm_model: String,

    /// Embedding model; the local hash embedder is used when unset
    #[arg(long, env = "GADGETCACHE_EMBEDDING_MODEL", global = true)]
    embedding_model: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "GADGETCACHE_LLM_TIMEOUT_MS", default_value_t = 20_000, global = true)]
    llm_timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show record count, brands and price range
    Stats,
    /// Nearest cached records for a query
    Search {
        query: String,
        #[arg(short, long, default_value_t = 15)]
        limit: usize,
        /// Only records at or below this price
        #[arg(long)]
        max_price: Option<u32>,
    },
    /// Answer from cache, scraping the listings file on a miss
    Resolve {
        query: String,
        #[arg(short, long, default_value_t = 15)]
        limit: usize,
        /// Budget ceiling, used for query phrasing
        #[arg(short, long)]
        budget: Option<u32>,
        /// JSON array of raw listings to scrape from
        #[arg(long)]
        listings: PathBuf,
    },
    /// Filter cached records by name and specs
    Browse {
        /// Substring of the name or model
        #[arg(default_value = "")]
        name: String,
        #[arg(long)]
        brand: Vec<String>,
        #[arg(long)]
        max_price: Option<u32>,
        #[arg(long)]
        min_ram: Option<u32>,
        #[arg(long)]
        min_camera: Option<u32>,
        #[arg(long)]
        min_battery: Option<u32>,
    },
    /// Upsert records from a JSON array file
    Ingest { file: PathBuf },
    /// Write every cached record to a JSON array file
    Export { file: PathBuf },
}

impl Cli {
    fn config(&self) -> AdvisorConfig {
        let llm = if self.llm.llm_api_key.is_some() || self.llm.embedding_model.is_some() {
            Some(ProviderConfig {
                api_base: self.llm.llm_api_base.clone(),
                api_key: self.llm.llm_api_key.clone().unwrap_or_default(),
                model: self.llm.llm_model.clone(),
                embedding_model: self.llm.embedding_model.clone(),
                timeout_ms: self.llm.llm_timeout_ms,
                ..ProviderConfig::default()
            })
        } else {
            None
        };

        AdvisorConfig {
            data_dir: self.data_dir.clone(),
            embedding_dim: self.embedding_dim,
            map_size_mb: self.map_size_mb,
            min_relevance: self.min_relevance,
            normalizer: NormalizerConfig::default(),
            llm,
            ..AdvisorConfig::default()
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.config();
    info!("gadgetcache v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    match &cli.command {
        Command::Stats => {
            let store = config.open_store()?;
            print_json(&store.stats())?;
        }
        Command::Search { query, limit, max_price } => {
            let store = config.open_store()?;
            let hits = match max_price {
                Some(max_price) => {
                    let filter = SpecFilter::new().with_max_price(*max_price);
                    store.search_filtered(query, *limit, &filter)?
                }
                None => store.search(query, *limit)?,
            };
            print_json(&hits)?;
        }
        Command::Resolve { query, limit, budget, listings } => {
            let scraper = Arc::new(ReplayScraper::from_file(listings)?);
            let coordinator = CacheCoordinator::from_config(&config, scraper)?;
            let resolution = coordinator.resolve(query, *limit, *budget);
            info!(
                "Resolved '{}' as '{}' from {:?} ({} records)",
                query,
                resolution.query,
                resolution.source,
                resolution.records.len()
            );
            print_json(&resolution)?;
        }
        Command::Browse { name, brand, max_price, min_ram, min_camera, min_battery } => {
            let store = config.open_store()?;
            let working_set = WorkingSet::from_records(store.get_all());
            let filter = SpecFilter {
                brands: brand.clone(),
                max_price: *max_price,
                min_ram: *min_ram,
                min_camera: *min_camera,
                min_battery: *min_battery,
                ..SpecFilter::default()
            };
            print_json(&serde_json::json!({
                "brands": working_set.brands(),
                "price_range": working_set.price_range(),
                "records": working_set.search(name, &filter),
            }))?;
        }
        Command::Ingest { file } => {
            let store = config.open_store()?;
            let written = store.ingest_json(file)?;
            print_json(&serde_json::json!({ "written": written, "total": store.count() }))?;
        }
        Command::Export { file } => {
            let store = config.open_store()?;
            let exported = store.export_json(file)?;
            print_json(&serde_json::json!({ "exported": exported, "file": file }))?;
        }
    }

    Ok(())
}
