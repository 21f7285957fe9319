//! Interactive chat with the Ogun Startup Advisor.
//!
//! This binary runs a terminal conversation with a Gemini model playing a
//! startup mentor for aspiring business owners in Ogun State, Nigeria.
//!
//! # Usage
//!
//! ```bash
//! # The key is read from GEMINI_API_KEY (or api_key), also from a .env file
//! ogstartup-chat
//!
//! # Pick a model
//! ogstartup-chat --model gemini-2.5-pro
//!
//! # Disable colors (useful for piping output)
//! ogstartup-chat --no-color
//! ```
//!
//! Type `quit` or `exit` to leave.  Ctrl-C abandons a reply that is taking
//! too long.  Set `RUST_LOG=debug` to see request logs on stderr.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ogstartup::Renderer;
use ogstartup::chat::{self, ChatArgs, ChatConfig, ChatSession, EditorSource, PlainTextRenderer};
use ogstartup::client::load_env_file;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let env_file = load_env_file();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }

    let (args, _) = ChatArgs::from_command_line_relaxed("ogstartup-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let use_color = config.use_color;

    let mut session = ChatSession::from_config(config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut source = EditorSource::new()?;

    // Set while a request is in flight to abandon it.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let outcome = chat::run(&mut session, &mut source, &mut renderer, &interrupted).await;

    let stats = session.stats();
    info!(
        model = %stats.model,
        turns = stats.turn_count,
        requests = stats.total_requests,
        prompt_tokens = stats.total_prompt_tokens,
        reply_tokens = stats.total_reply_tokens,
        "session stats"
    );

    match outcome {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            renderer.print_error(&err.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}
