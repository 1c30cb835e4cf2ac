//! Voice Calculator Console
//!
//! Drives the half-duplex arbiter from the terminal: typed lines play the role
//! of recognition transcripts and announcements are printed instead of spoken.
//! Speech → Transcript → Command → Calculator → Announcement

mod engines;

use anyhow::{Context, Result};
use clap::Parser;
use duplex_arbiter::{channel, ArbiterConfig, ArbiterHandle, ArbiterRuntime, DeviceArbiter};
use engines::{ConsoleCalculator, ConsoleMic, ConsoleSpeaker};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voice_local::{EngineEvent, EngineEventSink};

#[derive(Parser)]
#[command(name = "voice-console")]
#[command(about = "Voice-controlled calculator input, driven from the console")]
struct Args {
    /// JSON config file (written with defaults if missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay transcripts from a file, one per line
    #[arg(long)]
    script: Option<PathBuf>,

    /// Simulated playback time per character of an announcement
    #[arg(long, default_value = "60")]
    speech_ms_per_char: u64,

    /// Parse one transcript, print the command and exit
    #[arg(long)]
    test_command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();

    if let Some(text) = args.test_command {
        println!("🎤 \"{}\" → {}", text, intent_parser::describe_command(&text));
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ArbiterConfig::load(path)?,
        None => ArbiterConfig::default(),
    };
    info!(
        language = %config.asr.language,
        retry_ms = config.recognition_retry_ms,
        "starting voice console"
    );

    let (handle, inbox) = channel();
    let mic = ConsoleMic::default();
    let speaker = ConsoleSpeaker::new(handle.clone(), args.speech_ms_per_char, config.tts.clone());
    let arbiter = DeviceArbiter::new(mic.clone(), speaker, ConsoleCalculator::default(), config);
    let runtime = ArbiterRuntime::new(arbiter, handle.clone(), inbox);

    let lines = match &args.script {
        Some(path) => {
            let script = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading script: {}", path.display()))?;
            Input::Script(script.lines().map(str::to_string).collect())
        }
        None => {
            print_help();
            Input::Interactive
        }
    };

    handle.start_listening()?;
    let feeder = tokio::spawn(feed_input(lines, mic, handle));
    let arbiter = runtime.run().await;
    feeder.abort();

    info!(context = ?arbiter.context(), "voice console finished");
    Ok(())
}

enum Input {
    Script(Vec<String>),
    Interactive,
}

async fn feed_input(input: Input, mic: ConsoleMic, handle: ArbiterHandle) -> Result<()> {
    match input {
        Input::Script(lines) => {
            for line in lines {
                let line = line.trim();
                if !line.is_empty() {
                    dispatch(line, &mic, &handle).await?;
                }
            }
            // Let the last announcements play out.
            tokio::time::sleep(Duration::from_secs(3)).await;
            handle.shutdown()?;
        }
        Input::Interactive => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if !dispatch(line, &mic, &handle).await? {
                    break;
                }
            }
            handle.shutdown()?;
        }
    }
    Ok(())
}

/// Returns `false` once the user asked to quit.
async fn dispatch(line: &str, mic: &ConsoleMic, handle: &ArbiterHandle) -> Result<bool> {
    match line {
        "/quit" | "/exit" => return Ok(false),
        "/start" => handle.start_listening()?,
        "/stop" => handle.stop_listening()?,
        "/focus" => handle.emit(EngineEvent::FocusGained),
        "/blur" => handle.emit(EngineEvent::FocusLost),
        "/error" => handle.emit(EngineEvent::RecognitionError("simulated".into())),
        transcript => {
            if !wait_for_microphone(mic).await {
                warn!(transcript, "microphone stayed closed, transcript dropped");
                println!("🔇 not listening, dropped: {transcript}");
                return Ok(true);
            }
            println!("🗣  {transcript}");
            mic.hear(handle, transcript);
        }
    }
    Ok(true)
}

async fn wait_for_microphone(mic: &ConsoleMic) -> bool {
    for _ in 0..200 {
        if mic.is_capturing() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

fn print_help() {
    println!("🎤 Voice Calculator Console");
    println!("Type what you would say and press Enter. Examples:");
    println!("  - '距离150米'  /  '三百五十米'");
    println!("  - '角度30度'  /  '付35度' (negative)");
    println!("  - '三点五米'  /  '二十五点八度'");
    println!("  - '计算'");
    println!("Controls: /start /stop /focus /blur /error /quit");
    println!();
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
