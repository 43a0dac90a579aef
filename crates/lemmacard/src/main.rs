use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use lemmacard::deck::{DEFAULT_DECK_NAME, DeckFormat};
use lemmacard::{
    AppState, AudioLocalizer, CommandLocalizer, Deck, build_deck, open_engine, read_word_list, router,
};
use lemmacard_morph::MatchMode;
use lemmacard_resolve::{Automatic, DEFAULT_LANGUAGE, DisambiguationPolicy, Interactive};
use lemmacard_source::DEFAULT_CACHE_CAPACITY;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lemmacard", version, about = "Look up word forms and build flashcard decks")]
struct Cli {
    /// Directory of `<word>.json` dictionary payloads.
    #[arg(long, env = "LEMMACARD_DICT_DIR", default_value = "data", global = true)]
    dict_dir: PathBuf,
    #[arg(long, env = "LEMMACARD_LANGUAGE", default_value = DEFAULT_LANGUAGE, global = true)]
    language: String,
    /// Never prompt: take the first option.
    #[arg(long, global = true)]
    auto: bool,
    /// Answer to "use base word?" questions in automatic mode.
    #[arg(long, value_enum, default_value_t = Answer::Yes, global = true)]
    confirm_default: Answer,
    /// Only replace inflectional endings at the end of a word.
    #[arg(long, global = true)]
    anchored_endings: bool,
    /// Dictionary payloads kept in memory.
    #[arg(long, env = "LEMMACARD_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY, global = true)]
    cache_capacity: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve words and print the chosen sense.
    Lookup {
        #[arg(required = true)]
        words: Vec<String>,
        /// 1-based sense to use when a word has several.
        #[arg(long)]
        sense: Option<usize>,
    },
    /// Build a deck from a word list.
    Build {
        #[arg(long, default_value = "words.txt")]
        input: PathBuf,
        /// `.apkg` for a complete Anki package, anything else for tab-separated text.
        #[arg(long, default_value = "deck.apkg")]
        output: PathBuf,
        #[arg(long, default_value = "vocab")]
        audio_dir: PathBuf,
        #[arg(long)]
        no_audio: bool,
        #[arg(long, default_value = DEFAULT_DECK_NAME)]
        deck_name: String,
        #[arg(long, env = "LEMMACARD_FFMPEG", default_value = "ffmpeg")]
        ffmpeg: String,
    },
    /// Serve the read-only lookup API.
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Answer {
    Yes,
    No,
}

impl Cli {
    fn match_mode(&self) -> MatchMode {
        if self.anchored_endings {
            MatchMode::Suffix
        } else {
            MatchMode::Substring
        }
    }

    fn confirm_default(&self) -> bool {
        matches!(self.confirm_default, Answer::Yes)
    }

    fn policy(&self) -> Box<dyn DisambiguationPolicy> {
        if self.auto {
            Box::new(Automatic::with_confirm_default(self.confirm_default()))
        } else {
            Box::new(Interactive::stdio())
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let start = Instant::now();
    let engine = open_engine(
        &cli.dict_dir,
        &cli.language,
        cli.match_mode(),
        cli.cache_capacity,
    )
        .with_context(|| format!("opening dictionary at {}", cli.dict_dir.display()))?;
    info!(
        "using dictionary at {} ({}, {:?} endings) in {} ms",
        cli.dict_dir.display(),
        cli.language,
        cli.match_mode(),
        start.elapsed().as_millis()
    );

    match &cli.command {
        Command::Lookup { words, sense } => {
            ensure!(*sense != Some(0), "--sense must be >= 1");
            let mut policy = cli.policy();
            for word in words {
                let word = word.trim().to_lowercase();
                let resolution =
                    engine.resolve_traced(&word, sense.map(|s| s - 1), policy.as_mut())?;
                if !resolution.is_found() {
                    println!("No definition found for {word}");
                    continue;
                }
                if resolution.path.len() > 1 {
                    info!("{word} resolved via {}", resolution.path.join(" -> "));
                }
                print!("{}", resolution.sense);
            }
        }
        Command::Build {
            input,
            output,
            audio_dir,
            no_audio,
            deck_name,
            ffmpeg,
        } => {
            info!("parsing input file {}", input.display());
            let words = read_word_list(input)
                .with_context(|| format!("reading word list {}", input.display()))?;
            let command_localizer = CommandLocalizer::new(audio_dir).with_ffmpeg(ffmpeg);
            let localizer: Option<&dyn AudioLocalizer> =
                if *no_audio { None } else { Some(&command_localizer) };
            let mut deck = Deck::new(deck_name);
            let mut policy = cli.policy();

            let report = build_deck(
                &engine,
                &words,
                policy.as_mut(),
                localizer,
                &mut deck,
            )?;
            let media = deck.export(output)?;
            if DeckFormat::for_path(output) == DeckFormat::Text && !media.is_empty() {
                info!(
                    "{} audio files in {} belong in the collection's media folder",
                    media.len(),
                    audio_dir.display()
                );
            }
            print!("{report}");
            let stats = engine.source().stats();
            info!(
                "{} notes, {} dictionary reads ({} cached)",
                report.added, stats.misses, stats.hits
            );
        }
        Command::Serve { host, port } => {
            let state = AppState {
                engine: Arc::new(engine),
                confirm_default: cli.confirm_default(),
            };
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(serve(state, host, *port))?;
        }
    }
    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    info!("binding to {host}:{port}");
    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
}
