//! FarmGuide binary entry point.

use farmguide::cli::{AskArgs, Cli, Commands, TranscribeArgs};
use farmguide::config::FarmGuideConfig;
use farmguide::error::FarmGuideError;
use farmguide::language::Language;
use farmguide::pipeline::PipelineCoordinator;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let result = match FarmGuideConfig::load(cli.config.as_deref()) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut config: FarmGuideConfig) -> Result<(), FarmGuideError> {
    match command {
        Commands::Serve(args) => {
            if let Some(bind) = args.bind {
                config.settings_mut().bind = bind;
            }
            farmguide::server::serve(&config).await
        }
        Commands::Ask(args) => handle_ask(args, &config).await,
        Commands::Transcribe(args) => handle_transcribe(args, &config).await,
    }
}

async fn handle_ask(args: AskArgs, config: &FarmGuideConfig) -> Result<(), FarmGuideError> {
    let language = match args.language.as_deref() {
        Some(code) => Language::parse(code)?,
        None => config.settings().default_language,
    };
    let pipeline = PipelineCoordinator::from_config(config);
    let result = pipeline
        .process_text_query_in_session(&args.ocr_text, &args.query, language, args.session.as_deref())
        .await?;

    println!("{}", result.response);
    if !language.is_pivot() {
        println!("\n[{language}] {}", result.translated_response);
    }
    if let Some(path) = result.audio_path {
        eprintln!("audio: {}", path.display());
    }
    Ok(())
}

async fn handle_transcribe(args: TranscribeArgs, config: &FarmGuideConfig) -> Result<(), FarmGuideError> {
    let language = Language::parse(&args.language)?;
    let audio = tokio::fs::read(&args.file).await?;
    let pipeline = PipelineCoordinator::from_config(config);
    let transcript = pipeline
        .transcribe(&audio, farmguide::cli::mime_for_path(&args.file), language)
        .await?;
    println!("{transcript}");
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
