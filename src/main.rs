use anyhow::Context;
use clap::{Parser, Subcommand};
use plate_reader::batch::{self, BatchOptions, DEFAULT_WORKERS};
use plate_reader::config::{ServerConfig, Settings};
use plate_reader::engine::{RecognizerConfig, DEFAULT_WHITELIST};
use plate_reader::engines::EngineRegistry;
use plate_reader::overlay;
use plate_reader::pipeline::PlatePipeline;
use plate_reader::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "plate-reader")]
#[command(about = "Locate license plates in photographs and read their text")]
#[command(version)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// JSON file overriding processing settings
    #[arg(long, global = true, env = "LPR_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Path to tessdata directory (downloaded to the user cache if not set)
    #[arg(long, global = true, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<PathBuf>,

    /// Language model for recognition (e.g., "eng")
    #[arg(long, global = true, env = "LPR_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Characters the recognizer may emit
    #[arg(long, global = true, env = "LPR_WHITELIST", default_value = DEFAULT_WHITELIST)]
    pub whitelist: String,

    /// TrueType font for plate text on annotated images
    #[arg(long, global = true, env = "LPR_FONT")]
    pub font: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every image in a directory
    Batch {
        /// Directory of .jpg/.jpeg/.png/.bmp images
        input_dir: PathBuf,

        /// Root directory for per-image artifacts
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,

        /// Maximum number of images processed concurrently
        #[arg(long, env = "LPR_WORKERS", default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Recognize glyphs one at a time instead of the whole plate
        #[arg(long)]
        split_glyphs: bool,

        /// Do not write edge maps, crops or annotated images
        #[arg(long)]
        no_artifacts: bool,
    },

    /// Serve recognition over HTTP
    Serve {
        /// Host address to bind to
        #[arg(long, env = "LPR_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "LPR_PORT", default_value = "9292")]
        port: u16,

        /// Maximum upload size in bytes (default: 20MB)
        #[arg(long, env = "LPR_MAX_FILE_SIZE", default_value = "20971520")]
        max_file_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting plate-reader v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Command::Batch { split_glyphs: true, .. } = args.command {
        settings.split_glyphs = true;
    }

    let recognizer_config = RecognizerConfig {
        data_path: args.tessdata_path.clone(),
        language_model: args.language.clone(),
        whitelist: args.whitelist.clone(),
        ..RecognizerConfig::default()
    };

    let registry = EngineRegistry::new(&recognizer_config).context("initializing recognizers")?;
    let recognizer = registry
        .default()
        .context("no default recognizer available")?;
    tracing::info!("Using {} recognizer", registry.default_name());

    let font = overlay::load_font(args.font.as_deref())?;
    let pipeline = Arc::new(PlatePipeline::new(settings, recognizer, recognizer_config, font)?);

    match args.command {
        Command::Batch {
            input_dir,
            output_dir,
            recursive,
            workers,
            no_artifacts,
            ..
        } => {
            let options = BatchOptions {
                input_dir,
                output_dir: (!no_artifacts).then_some(output_dir),
                recursive,
                workers,
            };
            let summary = batch::run(pipeline, options).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Serve {
            host,
            port,
            max_file_size,
        } => {
            tracing::info!("Binding to {}:{}", host, port);
            let state = AppState {
                pipeline,
                engines: Arc::new(registry.info()),
                config: Arc::new(ServerConfig {
                    host,
                    port,
                    max_file_size,
                }),
            };
            server::run(state).await
        }
    }
}
