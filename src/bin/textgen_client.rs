use clap::Parser;
use eternal_tools::adapters::TextGeneratorClient;
use eternal_tools::core::line_buffer::LineBuffer;
use eternal_tools::domain::ports::TextGenerator;
use eternal_tools::utils::logger;
use eternal_tools::utils::validation::validate_url;
use eternal_tools::ToolError;
use futures::StreamExt;

#[derive(Parser)]
#[command(name = "textgen-client")]
#[command(about = "Send a prompt to textgen-server and print the streamed answer line by line")]
struct Args {
    /// textgen-server base URL
    #[arg(long, default_value = "http://localhost:50051")]
    url: String,

    #[arg(short, long, default_value = "write a hello world in golang.")]
    prompt: String,

    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: &Args) -> Result<(), ToolError> {
    validate_url("url", &args.url)?;

    let client = TextGeneratorClient::new(&args.url);
    let mut stream = client.generate_stream(&args.prompt).await?;
    let mut lines = LineBuffer::new();

    while let Some(fragment) = stream.next().await {
        for line in lines.push(&fragment?) {
            println!("{}", line);
        }
    }
    if let Some(rest) = lines.flush() {
        println!("{}", rest);
    }

    tracing::debug!("stream finished");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    if let Err(e) = run(&args).await {
        tracing::error!("❌ Stream failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}
