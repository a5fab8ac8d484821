use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use webook_search::config::Config;
use webook_search::messaging::{MessagingService, SyncEvent, SyncEventProducer};
use webook_search::search::{load_registry, IndexBootstrap, SearchEngine, TantivyEngine};

#[derive(Parser)]
#[command(name = "webook-search-cli")]
#[command(about = "webook search operator CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or verify every registered index in the configured index path
    Bootstrap,

    /// Run a search against a running server
    Search {
        /// Search expression, e.g. "redis case:cache"
        #[arg(value_name = "EXPR")]
        keywords: String,

        #[arg(short, long, default_value = "0")]
        offset: usize,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Publish a sync event onto the configured bus
    Publish {
        /// Target index
        #[arg(short, long)]
        index: String,

        /// Document id
        #[arg(short, long)]
        doc_id: String,

        /// Document as raw JSON
        #[arg(short = 'D', long)]
        data: String,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Bootstrap => {
            let config = Config::load()?;
            let registry = Arc::new(load_registry(&config.search)?);
            let engine: Arc<dyn SearchEngine> = Arc::new(TantivyEngine::new(config.search.clone()));

            let bootstrap = IndexBootstrap::new(engine, registry);
            let report = bootstrap.ensure_all().await?;

            println!("{}", serde_json::to_string_pretty(report)?);
        }

        Commands::Search {
            keywords,
            offset,
            limit,
        } => {
            let response = client
                .post(format!("{}/search/list", cli.endpoint))
                .json(&json!({
                    "keywords": keywords,
                    "offset": offset,
                    "limit": limit,
                }))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Publish {
            index,
            doc_id,
            data,
        } => {
            // Reject obviously broken documents before they reach the bus
            serde_json::from_str::<serde_json::Value>(&data)?;

            let config = Config::load()?;
            let messaging = Arc::new(MessagingService::new(config.messaging.clone()).await?);
            let producer = SyncEventProducer::with_topic(messaging, config.sync.topic.clone());

            let event = SyncEvent {
                index,
                doc_id,
                data: serde_json::Value::String(data),
            };
            producer.produce(&event).await?;

            println!(
                "Published {}/{} to {}",
                event.index,
                event.doc_id,
                producer.topic()
            );
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let status = response.status();
            let body: serde_json::Value = response.json().await?;
            println!("{} {}", status, serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
