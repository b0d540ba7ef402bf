use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use emocare::api::ApiServer;
use emocare::journal::{AutoExtractor, JournalDocument};
use emocare::reference::{mood_action, mood_music};
use emocare::session::{Avatar, FocusArea, Mood, Role, Session};
use emocare::{Companion, Config};

/// EmoCare - a gentle wellness companion
#[derive(Parser)]
#[command(name = "emocare", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable voice features (no STT/TTS even when a key is configured)
    #[arg(long, env = "EMOCARE_DISABLE_VOICE", global = true)]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Directory with a web UI to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Chat in the terminal
    Chat,
    /// Show word-cloud terms and redactions for a journal file
    Journal {
        /// PDF or text file
        path: PathBuf,

        /// Number of terms to show
        #[arg(short, long, default_value = "25")]
        terms: usize,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,

        /// Where to write the MP3
        #[arg(short, long, default_value = "emocare-tts-test.mp3")]
        out: PathBuf,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,emocare=info",
        1 => "info,emocare=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
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
    let command = cli.command.unwrap_or(Command::Serve {
        port: None,
        static_dir: None,
    });

    match command {
        Command::Setup => emocare::setup::run_setup(),
        Command::Journal { path, terms } => show_journal(&path, terms),
        Command::Serve { port, static_dir } => {
            let config = Config::load_with_options(cli.disable_voice)?;
            tracing::debug!(?config, "loaded configuration");
            serve(&config, port, static_dir).await
        }
        Command::Chat => {
            let config = Config::load_with_options(cli.disable_voice)?;
            chat(&config).await
        }
        Command::TestTts { text, out } => {
            let config = Config::load_with_options(cli.disable_voice)?;
            test_tts(&config, &text, &out).await
        }
    }
}

async fn serve(config: &Config, port: Option<u16>, static_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut server = config.server.clone();
    if let Some(port) = port {
        server.port = port;
    }
    if static_dir.is_some() {
        server.static_dir = static_dir;
    }
    let companion = Arc::new(Companion::from_config(config));

    tracing::info!(
        port = server.port,
        max_sessions = server.max_sessions,
        session_ttl_secs = server.session_ttl.as_secs(),
        "starting EmoCare API"
    );

    ApiServer::new(companion, &server).run().await?;
    Ok(())
}

const CHAT_HELP: &str = "\
Commands:
  /mood <label>      set your mood (e.g. /mood sad / low)
  /focus <label>     set the focus area
  /avatar <name>     Bunny, Pandy or Silly
  /journal <path>    attach a PDF or text journal
  /joke              hear a joke
  /tips              action and music for your mood
  /history           show the conversation so far
  /quit              leave";

/// Terminal chat loop
async fn chat(config: &Config) -> anyhow::Result<()> {
    let companion = Companion::from_config(config);
    let mut session = Session::new();

    if let Some(reason) = companion.capabilities().generation.reason {
        println!("(replies unavailable: {reason})");
    }
    println!(
        "{} {}\n{CHAT_HELP}\n",
        session.context.avatar.emoji(),
        session.context.avatar.greeting()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
            let arg = arg.trim();
            match name {
                "quit" | "exit" => break,
                "help" => println!("{CHAT_HELP}"),
                "mood" => match arg.parse::<Mood>() {
                    Ok(mood) => {
                        session.context.current_mood = mood;
                        println!("Mood set to {mood}");
                    }
                    Err(_) => println!("Moods: {}", labels(Mood::ALL)),
                },
                "focus" => match arg.parse::<FocusArea>() {
                    Ok(focus) => {
                        session.context.focus_area = focus;
                        println!("Focus set to {focus}");
                    }
                    Err(_) => println!("Focus areas: {}", labels(FocusArea::ALL)),
                },
                "avatar" => match arg.parse::<Avatar>() {
                    Ok(avatar) => {
                        session.context.avatar = avatar;
                        println!("{} {}", avatar.emoji(), avatar.greeting());
                    }
                    Err(_) => println!("Avatars: {}", labels(Avatar::ALL)),
                },
                "journal" => match std::fs::read(arg) {
                    Ok(bytes) => {
                        let filename = PathBuf::from(arg)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned());
                        match companion.load_journal(&mut session, bytes, filename).await {
                            Ok(summary) => {
                                if summary.empty {
                                    println!("No readable text found in {arg}");
                                } else {
                                    println!("Loaded journal ({} chars)", summary.chars);
                                }
                                if !summary.redactions.is_empty() {
                                    println!("Redactions made: {}", labels(&summary.redactions));
                                }
                            }
                            Err(e) => println!("Could not load {arg}: {e}"),
                        }
                    }
                    Err(e) => println!("Could not read {arg}: {e}"),
                },
                "joke" => {
                    let joke = companion.tell_joke(&mut session).await;
                    println!("{} {joke}", session.context.avatar.emoji());
                }
                "tips" => {
                    let mood = session.context.current_mood.label();
                    println!("Try: {}", mood_action(mood));
                    println!("Music: {}", mood_music(mood));
                }
                "history" => {
                    for turn in session.transcript.render() {
                        let who = match turn.role {
                            Role::User => "You",
                            Role::Assistant => "EmoCare",
                        };
                        let journal = if turn.used_journal { " [journal]" } else { "" };
                        println!("[{}] {who}{journal}: {}", turn.timestamp.format("%H:%M:%S"), turn.text);
                    }
                }
                _ => println!("Unknown command. Type /help"),
            }
            continue;
        }

        let reply = companion.send_message(&mut session, line).await?;
        println!("\n{} {}\n", session.context.avatar.emoji(), reply.reply);
    }

    println!("Take care of yourself. 💛");
    Ok(())
}

fn labels<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print what ingestion would do with a journal file
fn show_journal(path: &Path, terms: usize) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let journal = JournalDocument::ingest(&AutoExtractor, &bytes, filename);

    if journal.is_empty() {
        println!("No readable text found in {}", path.display());
        return Ok(());
    }

    println!("{} characters", journal.text.chars().count());
    if journal.redactions.is_empty() {
        println!("No redactions needed");
    } else {
        println!("Redactions made: {}", labels(&journal.redactions));
    }

    let cloud = journal.word_cloud(terms);
    if cloud.is_empty() {
        println!("Not enough meaningful words for a word cloud yet.");
    }
    for term in cloud {
        println!("{:>4}  {:<20} {:.2}", term.count, term.word, term.weight);
    }
    Ok(())
}

/// Synthesize a sentence and write it to disk
async fn test_tts(config: &Config, text: &str, out: &Path) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let companion = Companion::from_config(config);
    let audio = companion.synthesize(text).await?;
    println!("Got {} bytes of audio data", audio.len());

    // Check MP3 header
    if audio.len() > 3 {
        println!(
            "First 4 bytes: {:02x} {:02x} {:02x} {:02x}",
            audio[0], audio[1], audio[2], audio[3]
        );
    }

    std::fs::write(out, &audio)?;
    println!("\nWrote {}", out.display());
    println!("If it plays, TTS is working!");
    Ok(())
}
