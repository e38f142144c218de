//! CLI binary for parley.
//!
//! Reads utterances line by line from stdin, resolves each one and prints
//! transcript events and queued speech as a stand-in synthesis consumer.

use clap::Parser;
use parley::config::IntentMode;
use parley::intent::LlmIntentClassifier;
use parley::pipeline::messages::ContentKind;
use parley::scheduler::{SchedulerBridge, WorkerPool};
use parley::tools::{DispatchMode, HeartRateTool, ToolRegistry};
use parley::{ChannelSessionControl, SessionConfig, SessionContext, SessionEvent, TurnOutcome, TurnResolver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

/// How often the speech printer polls the queue.
const SPEECH_POLL: Duration = Duration::from_millis(50);

/// Parley: resolve typed utterances the way a voice session would.
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the intent pass and treat every turn as direct function-call chat.
    #[arg(long)]
    direct: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => SessionConfig::from_file(path)?,
        None => {
            let path = SessionConfig::default_config_path();
            if path.is_file() {
                SessionConfig::from_file(&path)?
            } else {
                SessionConfig::default()
            }
        }
    };
    if cli.direct {
        config.intent.mode = IntentMode::FunctionCall;
    }
    let config = Arc::new(config);

    let control = Arc::new(ChannelSessionControl::new(64));
    let session = Arc::new(SessionContext::new(&config, control.clone()));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(HeartRateTool::new(&config.heart_rate)?));
    let classifier = LlmIntentClassifier::new(
        &config.llm,
        &registry.schemas_for_api(),
        &config.intent.continue_sentinel,
    )?;

    let pool = WorkerPool::new(
        config.workers.threads,
        info_span!(parent: session.span(), "workers"),
    )?;
    let resolver = TurnResolver::new(
        Arc::clone(&config),
        Arc::new(registry),
        Arc::new(pool),
        SchedulerBridge::current()?,
        info_span!(parent: session.span(), "resolver"),
    )
    .with_classifier(Arc::new(classifier));
    info!(?resolver, "session ready");

    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            ctrl_c.cancel();
        }
    });

    let events = tokio::spawn(print_events(control.subscribe(), cancel.clone()));
    let speech = tokio::spawn(print_speech(Arc::clone(&session), cancel.clone()));

    println!("Parley v{}", env!("CARGO_PKG_VERSION"));
    println!("Type an utterance per line. Ctrl+D or Ctrl+C to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match resolver.handle_user_intent(&session, line).await {
            TurnOutcome::NotHandled => println!("(chat) {line}"),
            TurnOutcome::Dispatched(dispatch) => {
                if dispatch.mode == DispatchMode::Wait {
                    if let Err(e) = dispatch.job.join().await {
                        warn!(error = %e, tool = %dispatch.tool_name, "tool job lost");
                    }
                }
            }
            _ => {}
        }
    }

    cancel.cancel();
    let _ = events.await;
    let _ = speech.await;
    Ok(())
}

async fn print_events(
    mut rx: tokio::sync::broadcast::Receiver<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => return,
            event = rx.recv() => event,
        };
        match event {
            Ok(SessionEvent::Transcript(text)) => println!("[heard] {text}"),
            Ok(SessionEvent::SpeechStopped) => println!("[speech stopped]"),
            Ok(SessionEvent::CloseRequested) => {
                println!("[session closed]");
                cancel.cancel();
                return;
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "event printer lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn print_speech(session: Arc<SessionContext>, cancel: CancellationToken) {
    let mut tick = tokio::time::interval(SPEECH_POLL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = tick.tick() => {}
        }
        flush_speech(&session);
    }
    flush_speech(&session);
}

fn flush_speech(session: &SessionContext) {
    for segment in session.speech().drain() {
        if segment.kind != ContentKind::Text {
            continue;
        }
        if let Some(text) = segment.content {
            println!("parley> {text}");
        }
    }
}
