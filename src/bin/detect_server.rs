use clap::Parser;
use eternal_tools::adapters::{GenerationSettings, HttpVisionModel};
use eternal_tools::server::detect::{self, DetectState};
use eternal_tools::server::shutdown_signal;
use eternal_tools::utils::logger;
use eternal_tools::utils::validation::{validate_socket_addr, Validate};
use eternal_tools::{ToolError, ToolsConfig};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "detect-server")]
#[command(about = "HTTP object detection endpoint backed by a Florence-2 model server")]
struct Args {
    /// Path to eternal.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address; overrides detection.bind
    #[arg(long)]
    bind: Option<String>,

    /// Vision model endpoint; overrides detection.backend_url
    #[arg(long)]
    backend_url: Option<String>,
}

async fn run(args: Args) -> Result<(), ToolError> {
    let config = ToolsConfig::load(args.config.as_deref())?;
    logger::init_server_logger(config.logging.json, config.logging.filter.as_deref());

    let mut section = config.detection.clone();
    if let Some(bind) = args.bind {
        section.bind = bind;
    }
    if let Some(url) = args.backend_url {
        section.backend_url = url;
    }
    section.validate()?;
    let addr = validate_socket_addr("detection.bind", &section.bind)?;

    let model = HttpVisionModel::new(
        &section.backend_url,
        GenerationSettings {
            max_new_tokens: section.max_new_tokens,
            num_beams: section.num_beams,
        },
        Duration::from_secs(section.timeout_seconds),
    )?;
    let state = DetectState {
        model: Arc::new(model),
    };
    let app = detect::router(state, section.max_upload_mb * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = %section.backend_url, "🚀 detect-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("detect-server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        tracing::error!("❌ detect-server failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
