//! Document Q&A server binary
//!
//! Run with: cargo run -p doc-rag --bin doc-rag-server -- --config doc-rag.toml

use clap::Parser;
use doc_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "doc-rag-server")]
#[command(about = "Ask questions about an uploaded document with a local model", long_about = None)]
#[command(version)]
struct Args {
    #[arg(short, long, help = "TOML configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Bind address (overrides config)")]
    host: Option<String>,

    #[arg(short, long, help = "Port (overrides config)")]
    port: Option<u16>,

    #[arg(long, help = "Model for both embeddings and chat (overrides config)")]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      Document Q&A                         ║
║          Upload a document, ask it questions              ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let mut config = match &args.config {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = args.model {
        config.llm.embed_model = model.clone();
        config.llm.chat_model = model;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = RagServer::new(config.clone())?;

    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    if server.state().is_ready().await {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!("  2. Pull model: ollama pull {}", config.llm.chat_model);
    }

    println!("\nServer starting...");
    println!("  Form: http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ask                    - Upload and ask (form)");
    println!("  POST /api/sessions               - Create a session");
    println!("  POST /api/sessions/:id/document  - Upload a document");
    println!("  POST /api/sessions/:id/query     - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
