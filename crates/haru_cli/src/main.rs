use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use haru_core::Result;
use haru_crawler::{batch, CrawlPipeline, Fetcher, ScheduledCrawler};
use haru_inference::{create_model, Config as ModelConfig};
use haru_storage::create_store;
use haru_web::{create_app, AppState, AuthState};

#[derive(Parser, Debug)]
#[command(name = "haru", version, about = "Journal crawl and summarize backend")]
struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    store: String,

    /// SQLite database path
    #[arg(long, default_value = "haru.db")]
    db_path: PathBuf,

    /// Crawler configuration file
    #[arg(long, default_value = "crawler_config.json")]
    config_file: PathBuf,

    /// Language model: openai or dummy
    #[arg(long, default_value = "openai")]
    model: String,

    /// API key for the model (falls back to OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
        /// Token required on mutating routes (falls back to
        /// HARU_ADMIN_TOKEN); unset leaves them open
        #[arg(long)]
        admin_token: Option<String>,
    },
    /// Crawl a single article URL
    Crawl { url: String },
    /// Crawl an inclusive range of article numbers
    CrawlRange {
        start_number: u32,
        end_number: u32,
        #[arg(long, default_value_t = 1.0)]
        delay: f64,
    },
    /// Crawl the next N articles after the given number
    CrawlNext {
        current_number: u32,
        #[arg(long, default_value_t = 5)]
        count: u32,
        #[arg(long, default_value_t = 1.0)]
        delay: f64,
    },
    /// Crawl the N articles before the given number
    CrawlPrevious {
        current_number: u32,
        #[arg(long, default_value_t = 5)]
        count: u32,
        #[arg(long, default_value_t = 1.0)]
        delay: f64,
    },
    /// Run the monthly crawl if it is due
    Monthly,
    /// Crawl a fixed count starting at the given number, ignoring the gate
    Manual {
        start_number: u32,
        #[arg(long, default_value_t = 10)]
        count: u32,
    },
    /// Delete the N oldest stored articles
    Cleanup { count: u64 },
    /// Show crawler configuration and schedule
    Status,
}

fn crawl_delay(delay: f64) -> Duration {
    Duration::from_secs_f64(delay.max(0.0))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let store = create_store(&cli.store, &cli.db_path).await?;
    info!(backend = %cli.store, "storage initialized");

    let model_config = ModelConfig {
        api_key: cli.api_key.clone(),
        model_name: None,
        base_url: None,
    };
    let (summarizer, vision) = create_model(&cli.model, &model_config)?;
    info!(model = summarizer.name(), "language model initialized");

    let pipeline = CrawlPipeline::new(Fetcher::new()?, summarizer, store.clone());
    let crawler = Arc::new(ScheduledCrawler::new(pipeline, store.clone(), &cli.config_file));

    match cli.command {
        Commands::Serve { addr, admin_token } => {
            let admin_token = admin_token.or_else(|| std::env::var("HARU_ADMIN_TOKEN").ok());
            let state = AppState {
                store,
                crawler,
                vision,
            };
            let app = create_app(state, AuthState::new(admin_token));
            haru_web::serve(app, addr).await?;
        }
        Commands::Crawl { url } => match crawler.pipeline().crawl_url(&url).await {
            Ok(article) => print_json(&serde_json::json!({
                "title": article.title,
                "content": article.content,
                "reference": article.reference,
            }))?,
            Err(e) if e.is_handled() => print_json(&serde_json::json!({
                "error": e.to_string(),
                "reference": url,
            }))?,
            Err(e) => return Err(e),
        },
        Commands::CrawlRange {
            start_number,
            end_number,
            delay,
        } => {
            let results = batch::crawl_range(
                crawler.pipeline(),
                start_number,
                end_number,
                crawl_delay(delay),
            )
            .await;
            print_json(&results)?;
        }
        Commands::CrawlNext {
            current_number,
            count,
            delay,
        } => {
            let results = batch::crawl_next(
                crawler.pipeline(),
                current_number,
                count,
                crawl_delay(delay),
            )
            .await;
            print_json(&results)?;
        }
        Commands::CrawlPrevious {
            current_number,
            count,
            delay,
        } => {
            let results = batch::crawl_previous(
                crawler.pipeline(),
                current_number,
                count,
                crawl_delay(delay),
            )
            .await;
            print_json(&results)?;
        }
        Commands::Monthly => print_json(&crawler.monthly_crawl().await)?,
        Commands::Manual {
            start_number,
            count,
        } => print_json(&crawler.manual_crawl_from(start_number, count).await)?,
        Commands::Cleanup { count } => print_json(&crawler.cleanup_oldest(count).await)?,
        Commands::Status => print_json(&crawler.status().await)?,
    }

    Ok(())
}
