use clap::Parser;
use eternal_tools::adapters::SdCliGenerator;
use eternal_tools::config::toml_config::ImageGenSection;
use eternal_tools::core::diffusion::DEFAULT_PROMPT;
use eternal_tools::domain::model::SdParams;
use eternal_tools::domain::ports::ImageGenerator;
use eternal_tools::utils::validation::{validate_required_field, Validate};
use eternal_tools::utils::logger;
use eternal_tools::{ToolError, ToolsConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "txt2img")]
#[command(about = "Generate an image from a text prompt with stable-diffusion.cpp")]
struct Args {
    /// Text prompt
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Negative prompt
    #[arg(short, long)]
    negative_prompt: Option<String>,

    /// Model weights (.safetensors / .gguf); overrides imagegen.model
    #[arg(short, long)]
    model: Option<String>,

    /// Output image path; overrides imagegen.output
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    steps: Option<u32>,

    #[arg(long)]
    cfg_scale: Option<f32>,

    #[arg(long)]
    seed: Option<i64>,

    #[arg(short = 'W', long)]
    width: Option<u32>,

    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Path to the sd binary; overrides imagegen.sd_binary
    #[arg(long)]
    sd_binary: Option<String>,

    /// Path to eternal.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Print the sd command line without running it
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn build_params(args: &Args, section: &ImageGenSection) -> Result<SdParams, ToolError> {
    let model = match &args.model {
        Some(model) => model.clone(),
        None => validate_required_field("imagegen.model", &section.model)?.clone(),
    };

    Ok(SdParams {
        model,
        prompt: args.prompt.clone(),
        negative_prompt: args.negative_prompt.clone(),
        vae: section.vae.clone(),
        init_image: None,
        mode: None,
        output: args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&section.output)),
        cfg_scale: args.cfg_scale.unwrap_or(section.cfg_scale),
        steps: args.steps.unwrap_or(section.steps),
        seed: args.seed.unwrap_or(section.seed),
        sampling_method: section.sampling_method.clone(),
        schedule: section.schedule.clone(),
        width: args.width.unwrap_or(section.width),
        height: args.height.unwrap_or(section.height),
        clip_skip: section.clip_skip,
        threads: section.threads,
    })
}

async fn run(args: &Args) -> Result<(), ToolError> {
    let config = ToolsConfig::load(args.config.as_deref())?;
    config.imagegen.validate()?;

    let params = build_params(args, &config.imagegen)?;
    params.validate()?;

    let binary = args
        .sd_binary
        .clone()
        .unwrap_or_else(|| config.imagegen.sd_binary.clone());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - sd will not be started");
        println!("{} {}", binary, params.to_args().join(" "));
        return Ok(());
    }

    let generator = SdCliGenerator::new(binary);
    let image = generator.generate(&params).await?;

    tracing::debug!("sd output:\n{}", image.backend_output);
    println!(
        "✅ Saved {}x{} image to {}",
        image.width,
        image.height,
        image.path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    if let Err(e) = run(&args).await {
        tracing::error!("❌ Image generation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
