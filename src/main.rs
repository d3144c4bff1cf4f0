use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use tablero::api::ApiServer;
use tablero::inference::OpenAiClient;
use tablero::{codec, prompt, Config, InferenceClient, Language, OpenAiProvider, Provider, Workflow};

/// Tablero - draw, describe, narrate
#[derive(Parser)]
#[command(name = "tablero", version, about)]
struct Cli {
    /// Port to listen on (overrides `TABLERO_PORT` and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the board over HTTP (default)
    Serve,
    /// Test TTS output by writing the narration to a file
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hola, esta es una prueba de la narración.")]
        text: String,
        /// Narration language (es, en, fr)
        #[arg(short, long)]
        language: Option<Language>,
        /// Where to write the MP3
        #[arg(short, long, default_value = "tablero-test.mp3")]
        output: PathBuf,
    },
    /// Describe a PNG file without the board
    Describe {
        /// Path to a PNG image
        path: PathBuf,
        /// Description language (es, en, fr)
        #[arg(short, long)]
        language: Option<Language>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,tablero=info",
        1 => "info,tablero=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::TestTts {
            text,
            language,
            output,
        } => {
            let language = language.unwrap_or(config.board.language);
            test_tts(&config, &text, language, &output).await
        }
        Command::Describe { path, language } => {
            let language = language.unwrap_or(config.board.language);
            describe(&config, &path, language).await
        }
    }
}

/// Run the board server until interrupted
async fn serve(config: Config) -> anyhow::Result<()> {
    if !config.has_api_key() {
        tracing::warn!("OPENAI_API_KEY not set; enter a key in the board settings");
    }

    tracing::info!(
        port = config.server.port,
        model = %config.llm.model,
        tts = %config.voice.provider,
        language = %config.board.language,
        artifact = %config.server.artifact_path.display(),
        "starting tablero"
    );

    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(&config));
    let workflow = Workflow::from_config(&config, provider)?;
    let server = ApiServer::new(workflow, config.server.port)
        .static_dir(config.server.static_dir.clone());

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

/// Synthesize a sentence and write the audio to disk
async fn test_tts(
    config: &Config,
    text: &str,
    language: Language,
    output: &Path,
) -> anyhow::Result<()> {
    println!("Testing TTS ({}) with text: \"{text}\"\n", config.voice.provider);

    let key = api_key(config)?;
    let tts = OpenAiProvider::from_config(config).speech(&key)?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text, language).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    tokio::fs::write(output, &mp3_data).await?;
    println!("Wrote {}", output.display());

    Ok(())
}

/// Describe a PNG file the same way the board does
async fn describe(config: &Config, path: &Path, language: Language) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path).await?;
    // Re-encode so the model receives exactly what the board would send
    let drawing = codec::decode_png(&bytes)?;
    let png = codec::encode_png(&drawing)?;

    let key = api_key(config)?;
    let client = OpenAiClient::new(reqwest::Client::new(), &key, &config.llm)?;
    tracing::debug!(model = client.model(), bytes = png.len(), "describing file");

    let description = client.describe(&png, prompt::describe(language)).await?;
    println!("{description}");

    Ok(())
}

fn api_key(config: &Config) -> anyhow::Result<SecretString> {
    config
        .api_keys
        .openai
        .as_ref()
        .map(|k| SecretString::from(k.expose_secret().to_owned()))
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required"))
}
