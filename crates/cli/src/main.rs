use clap::{Parser, Subcommand};
use lib::channels::{CommandExtractor, InboundEvent};
use lib::intent::IntentClassifier;

#[derive(Parser)]
#[command(name = "biva")]
#[command(about = "Biva chat assistant CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: BIVA_CONFIG_PATH or ~/.biva/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway (health probes and POST /webhook/smax).
    Serve {
        /// Config file path (default: BIVA_CONFIG_PATH or ~/.biva/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Strip assistant aliases from TEXT, classify it, and print the result as JSON.
    Classify {
        /// Message text as a user would type it, e.g. "@BotBiva báo cáo tuần".
        text: String,

        /// Config file path (default: BIVA_CONFIG_PATH or ~/.biva/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("biva {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Classify { text, config }) => {
            if let Err(e) = run_classify(&text, config) {
                log::error!("classify failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_file(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("using config {}", path.display());
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    lib::gateway::run_gateway(config).await
}

fn run_classify(text: &str, config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let extractor = CommandExtractor::new(&config.assistant)?;
    let classifier = IntentClassifier::new()?;
    let command = extractor.extract_command(&InboundEvent::from_text(text));
    let result = classifier.classify(&command);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
