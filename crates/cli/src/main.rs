//! Console front-end
//!
//! Reads one message per line from stdin and prints the engine's
//! response. Intended for local runs and manual smoke testing; real
//! deployments embed the engine behind their own transport.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use support_agent_config::{PhraseLexicon, Settings};
use support_agent_engine::DialogueEngine;
use support_agent_session::{FileDurableStore, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config file is optional; env vars and defaults cover the rest.
    let mut settings = match std::env::var("SUPPORT_AGENT_CONFIG") {
        Ok(path) => Settings::load(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        Err(_) => Settings::default(),
    };
    if let Ok(path) = std::env::var("SUPPORT_AGENT_LEXICON") {
        PhraseLexicon::from_file(&path)
            .with_context(|| format!("loading phrase lexicon from {path}"))?
            .apply(&mut settings);
        settings.validate().context("validating lexicon overrides")?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting support agent");

    let data_dir =
        std::env::var("SUPPORT_AGENT_DATA_DIR").unwrap_or_else(|_| "./sessions".to_string());
    let store = Arc::new(SessionStore::new(
        Arc::new(FileDurableStore::new(&data_dir)),
        settings.session.clone(),
    ));

    let engine = Arc::new(
        DialogueEngine::builder(settings)
            .store(store)
            .build()
            .context("wiring dialogue engine")?,
    );
    let sweeper = engine.start_sweeper();

    let session_id = Uuid::new_v4().to_string();
    tracing::info!(session_id = %session_id, data_dir = %data_dir, "session opened");
    println!("Connected. Type a message and press enter; /end to finish.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/end" {
            break;
        }
        match engine.handle_turn(&session_id, text, Utc::now()).await {
            Ok(outcome) => println!("\n{}\n", outcome.response_text),
            Err(err) => {
                tracing::error!(session_id = %session_id, error = %err, "turn failed");
                break;
            }
        }
    }

    engine.end_session(&session_id, Utc::now()).await?;
    sweeper.stop().await;
    println!("Session ended. Take care.");
    Ok(())
}
