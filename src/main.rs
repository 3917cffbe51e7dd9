use clap::{Parser, Subcommand, ValueEnum};
use dealscout::bootstrap::build_pipeline;
use dealscout::config::AppConfig;
use dealscout_api::RestApi;
use dealscout_core::Strategy;
use dealscout_pipeline::{MarkdownRenderer, ResultRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Hybrid structured + semantic search over startup funding records
#[derive(Parser, Debug)]
#[command(name = "dealscout")]
#[command(about = "Hybrid structured + semantic startup search", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON array of documents to load into the in-memory store
    #[arg(short, long, global = true)]
    documents: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API
    Serve {
        /// HTTP API port (overrides the config file)
        #[arg(long)]
        http_port: Option<u16>,
    },
    /// Run one query and print the report
    Query {
        text: String,

        /// Skip routing and force a strategy
        #[arg(long)]
        strategy: Option<String>,

        #[arg(long, value_enum, default_value_t = Output::Markdown)]
        output: Output,
    },
}

/// Slack on top of the query deadline before a CLI search is abandoned
const QUERY_GRACE: Duration = Duration::from_millis(2_000);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    Markdown,
    Json,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    if args.documents.is_some() {
        config.store.documents = args.documents.clone();
    }

    info!("Starting DealScout v{}", env!("CARGO_PKG_VERSION"));
    info!("Store backend: {:?}", config.store.backend);
    info!("Classifier: {:?}", config.classifier.kind);

    // Blocking HTTP clients are built here, outside any async runtime
    let pipeline = Arc::new(build_pipeline(&config)?);

    match args.command {
        Command::Serve { http_port } => {
            let port = http_port.unwrap_or(config.server.http_port);
            info!("HTTP API: http://localhost:{}/", port);
            let sys = actix_web::rt::System::new();
            sys.block_on(RestApi::start(pipeline, port))?;
            info!("Shutting down...");
        }
        Command::Query {
            text,
            strategy,
            output,
        } => {
            let strategy: Option<Strategy> = strategy
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let outcome = pipeline.search_bounded(&text, strategy, QUERY_GRACE);
            match output {
                Output::Markdown => print!("{}", MarkdownRenderer.render(&text, &outcome)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
        }
    }

    Ok(())
}
