use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod analysis;
mod config;
mod db;
mod error;
mod llm;
mod models;
mod report;
mod risk;
mod server;
mod window;
mod workload;

use analysis::AnalysisRequest;
use config::Config;

#[derive(Parser)]
#[command(name = "burnout-detector")]
#[command(about = "Assignment workload and burnout risk API for students", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo student with assignments around the current week
    Seed,
    /// Import assignments from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one burnout analysis and print the JSON result
    Analyze {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Week")]
        view: String,
        /// ISO-8601 anchor date; defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the prompt that would be sent to the model
    Prompt {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Week")]
        view: String,
        #[arg(long)]
        date: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(config.json_logs);

    let pool = connect(&config).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} assignments from {}.", csv.display());
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;

            let llm = llm::OpenAiClient::from_config(&config.llm)?;
            let state = server::AppState {
                store: Arc::new(db::PgStore::new(pool)),
                llm: Arc::new(llm),
            };
            server::serve(addr, state).await?;
        }
        Commands::Analyze { email, view, date } => {
            let store = db::PgStore::new(pool);
            let llm = llm::OpenAiClient::from_config(&config.llm)?;
            let request = AnalysisRequest {
                email,
                view: Some(view),
                date,
            };
            let result = analysis::run_analysis(&store, &llm, &request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Prompt { email, view, date } => {
            let store = db::PgStore::new(pool);
            let request = AnalysisRequest {
                email,
                view: Some(view),
                date,
            };
            let plan = analysis::prepare_prompt(&store, &request).await?;
            print!("{}", plan.prompt);
        }
    }

    Ok(())
}
