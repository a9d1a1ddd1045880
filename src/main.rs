use clap::Parser;
use eternal_tools::adapters::ollama::model_reference;
use eternal_tools::adapters::{LocalStorage, OllamaEmbedder};
use eternal_tools::core::similarity::{format_embedding, format_matrix};
use eternal_tools::domain::model::EmbeddingReport;
use eternal_tools::domain::ports::Storage;
use eternal_tools::utils::{logger, validation::Validate};
use eternal_tools::{EmbedConfig, EmbeddingRun, ToolError, ToolsConfig};
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let args = EmbedConfig::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting embed");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    if let Err(e) = run(&args).await {
        tracing::error!(
            "❌ Embedding failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(args: &EmbedConfig) -> Result<(), ToolError> {
    let file_config = ToolsConfig::load(args.config.as_deref())?;
    let section = args.resolve(&file_config.embedding);
    section.validate()?;

    let model = model_reference(&section.model, section.revision.as_deref());
    println!("Backend: {} (model {})", section.backend_url, model);

    let embedder = OllamaEmbedder::new(
        &section.backend_url,
        &model,
        Duration::from_secs(section.timeout_seconds),
    )?;
    let run = EmbeddingRun::new_with_monitoring(
        embedder,
        section.chunk_size,
        section.chunk_overlap,
        args.monitor,
    );

    let report = run.run(&args.texts()).await?;
    print_report(&report);

    if let Some(path) = &args.output_json {
        write_report(path, &report).await?;
        tracing::info!("📁 Report saved to: {}", path);
    }

    Ok(())
}

fn print_report(report: &EmbeddingReport) {
    for (chunk, embedding) in report.chunks.iter().zip(report.embeddings.iter()) {
        println!("Chunk: {}", chunk.text);
        println!("Embedding: {}", format_embedding(embedding));
        println!();
    }

    println!("{}", format_matrix(&report.similarity));
}

async fn write_report(path: &str, report: &EmbeddingReport) -> Result<(), ToolError> {
    let path = Path::new(path);
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ToolError::InvalidConfigValueError {
            field: "output_json".to_string(),
            value: path.display().to_string(),
            reason: "Path has no file name".to_string(),
        })?;

    let storage = LocalStorage::new(base.to_string_lossy().to_string());
    let json = serde_json::to_vec_pretty(report)?;
    storage.write_file(file_name, &json).await
}
