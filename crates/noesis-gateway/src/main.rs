//! Noesis — multi-agent reasoning hub: gateway server and terminal chat.

use clap::{Parser, Subcommand};
use noesis_agents::AgentRegistry;
use noesis_core::{CycleId, HubConfig};
use noesis_hub::Hub;
use noesis_llm::{
    DisabledGeneration, GenerationProvider, OpenAiEmbeddings, OpenAiProvider, SimilarityIndex,
    UnavailableIndex,
};
use noesis_memory::{MemoryStore, StoreIndex};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "noesis", about = "Noesis multi-agent reasoning hub")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "noesis.toml")]
    config: PathBuf,

    /// Override the configured data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        #[arg(short, long, default_value = "8710")]
        port: u16,
    },
    /// Chat with the hub in the terminal
    Chat,
    /// Run one reflection pass and print the result
    Reflect {
        /// Cycle id to reflect on (default: most recent record)
        #[arg(long)]
        cycle_id: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noesis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = HubConfig::load(&cli.config);
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    let (hub, store) = build_hub(config)?;

    match cli.command {
        Commands::Serve { port } => {
            noesis_gateway::serve(hub, port).await?;
        }

        Commands::Chat => {
            run_chat(hub).await?;
        }

        Commands::Reflect { cycle_id } => {
            let target = match cycle_id {
                Some(id) => Some(id),
                None => store.latest_id().await,
            };
            let Some(target) = target else {
                anyhow::bail!("memory store is empty, nothing to reflect on");
            };
            let reflection = hub.reflector().reflect(&CycleId::from(target)).await?;
            println!("Insight: {}", reflection.insight);
            println!("Adjustment: {}", reflection.behavioral_adjustment);
            println!("Tags: {}", reflection.tags.join(", "));
            for point in &reflection.key_points {
                println!("- {}", point);
            }
        }
    }

    Ok(())
}

fn build_hub(config: HubConfig) -> anyhow::Result<(Arc<Hub>, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::open(config.data_dir.join("memory"))?);

    let api_key = std::env::var("OPENAI_API_KEY").ok();
    let generation: Arc<dyn GenerationProvider> = match &api_key {
        Some(key) => Arc::new(OpenAiProvider::new(key.clone(), &config.models.generation)),
        None => {
            warn!("OPENAI_API_KEY not set, generation runs degraded");
            Arc::new(DisabledGeneration)
        }
    };
    let index: Arc<dyn SimilarityIndex> = match &api_key {
        Some(key) => Arc::new(StoreIndex::new(
            Arc::new(OpenAiEmbeddings::new(key.clone(), &config.models.embedding)),
            store.clone(),
        )),
        None => Arc::new(UnavailableIndex),
    };

    let registry = AgentRegistry::builtin(generation.clone());
    let hub = Hub::new(config, generation, index, store.clone(), registry)?;
    Ok((Arc::new(hub), store))
}

async fn run_chat(hub: Arc<Hub>) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let outcome = hub.run_cycle(input).await?;
        println!("\nNoesis: {}\n", outcome.response);
        if !outcome.diagnostics.is_empty() {
            println!("Diagnostics:\n{}\n", outcome.diagnostics);
        }
    }
    Ok(())
}
