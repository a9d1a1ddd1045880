use clap::Parser;
use eternal_tools::adapters::OllamaGenerator;
use eternal_tools::server::shutdown_signal;
use eternal_tools::server::textgen::{self, TextGenState};
use eternal_tools::utils::logger;
use eternal_tools::utils::validation::{validate_socket_addr, Validate};
use eternal_tools::{ToolError, ToolsConfig};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "textgen-server")]
#[command(about = "Streaming text generation service backed by Ollama")]
struct Args {
    /// Path to eternal.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address; overrides textgen.bind
    #[arg(long)]
    bind: Option<String>,

    /// Model tag; overrides textgen.model
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    max_concurrent_streams: Option<usize>,
}

async fn run(args: Args) -> Result<(), ToolError> {
    let config = ToolsConfig::load(args.config.as_deref())?;
    logger::init_server_logger(config.logging.json, config.logging.filter.as_deref());

    let mut section = config.textgen.clone();
    if let Some(bind) = args.bind {
        section.bind = bind;
    }
    if let Some(model) = args.model {
        section.model = model;
    }
    if let Some(limit) = args.max_concurrent_streams {
        section.max_concurrent_streams = limit;
    }
    section.validate()?;
    let addr = validate_socket_addr("textgen.bind", &section.bind)?;

    let generator = OllamaGenerator::new(
        &section.backend_url,
        &section.model,
        section.max_tokens,
        Duration::from_secs(section.connect_timeout_seconds),
    )?;
    let state = TextGenState::new(Arc::new(generator), section.max_concurrent_streams);
    let app = textgen::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        model = %section.model,
        max_streams = section.max_concurrent_streams,
        "🚀 textgen-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("textgen-server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        tracing::error!("❌ textgen-server failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
