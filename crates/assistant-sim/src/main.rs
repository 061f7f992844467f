//! Simulator for the document assistant.
//!
//! Uploads a file into an in-memory backend, walks it through the processing
//! pipeline while the document tracker reports every phase, then asks the
//! chat session a question once the document is ready.
//!
//! ```text
//! RUST_LOG=debug cargo run -p assistant-sim -- --file notes.pdf --poll-interval-ms 1000
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use assistant_core::{DocumentView, Level, Notification, NotificationSink, Phase};
use chat_feed::ChatSession;
use chrono::Utc;
use clap::Parser;
use document_tracker::DocumentTracker;
use mock_backend::{
    DelayedChat, EchoChat, FileRecord, MemoryBlobStore, MemoryMessageStore, MemoryStatusChannel,
    PipelineOutcome, PipelineSimulator,
};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::{Args, SimConfig};

/// Upper bound on waiting for the pipeline or the chat reply.
const WAIT_LIMIT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SimConfig::from_args(Args::parse())?;
    info!(user_id = %config.user_id, session_id = %config.session.session_id, "Starting simulator");

    let blobs = Arc::new(MemoryBlobStore::new());
    let statuses = Arc::new(MemoryStatusChannel::new());
    let messages = Arc::new(MemoryMessageStore::new());
    let chat = Arc::new(DelayedChat::new(
        EchoChat::persisting_to(Arc::clone(&messages)),
        Duration::from_millis(300),
    ));

    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_notifications(notice_rx));
    let sink: Arc<dyn NotificationSink> = Arc::new(notice_tx);

    let tracker = DocumentTracker::new(
        Arc::clone(&blobs),
        Arc::clone(&statuses),
        Arc::clone(&sink),
        config.tracker.clone(),
    )?;

    // The upload lands in storage before the pipeline reports on it
    blobs.put(
        &config.user_id,
        FileRecord::new(config.file.as_str(), config.size, Utc::now()),
    );

    let tracking = tracker.start(&config.user_id);
    let mut views = tracking.views();

    let outcome = match &config.fail_with {
        Some(message) => PipelineOutcome::Failed(Some(message.clone())),
        None => PipelineOutcome::Completed,
    };
    let pipeline = PipelineSimulator::new(Arc::clone(&statuses), config.step);
    let user_id = config.user_id.clone();
    let file = config.file.clone();
    tokio::spawn(async move { pipeline.run(&user_id, &file, outcome).await });

    let finished = timeout(WAIT_LIMIT, wait_for_terminal(&mut views, &config.file)).await;
    print_documents(&tracking.current());

    match finished {
        Ok(Some(Phase::Completed)) => {
            let session = ChatSession::start(
                Arc::clone(&messages),
                Arc::clone(&chat),
                Arc::clone(&sink),
                config.session.clone(),
            );
            let mut feed = session.messages();

            session.submit(&config.prompt).await;

            match timeout(WAIT_LIMIT, feed.wait_for(|list| list.len() >= 2)).await {
                Ok(Ok(list)) => {
                    for message in list.iter() {
                        println!("[{}] {}", message.role().as_str(), message.text());
                    }
                }
                _ => warn!(session_id = %session.session_id(), "No reply arrived"),
            }

            session.cancel();
        }
        Ok(Some(phase)) => info!(file_name = %config.file, phase = %phase, "Document not usable, skipping chat"),
        Ok(None) | Err(_) => warn!(file_name = %config.file, "Document never finished processing"),
    }

    tracking.cancel();

    // Closing the last sender ends the printer
    drop(tracker);
    drop(sink);
    if timeout(Duration::from_secs(1), printer).await.is_err() {
        warn!("Notification printer did not stop");
    }

    Ok(())
}

/// Wait until `file_name` shows a terminal phase and return it.
async fn wait_for_terminal(
    views: &mut watch::Receiver<Vec<DocumentView>>,
    file_name: &str,
) -> Option<Phase> {
    loop {
        let terminal = views
            .borrow_and_update()
            .iter()
            .find(|doc| doc.file_name == file_name && doc.tracked && doc.phase.is_terminal())
            .map(|doc| doc.phase);
        if terminal.is_some() {
            return terminal;
        }
        if views.changed().await.is_err() {
            return None;
        }
    }
}

async fn print_notifications(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        let marker = match notification.level {
            Level::Info => "i",
            Level::Success => "+",
            Level::Error => "!",
        };
        match notification.title {
            Some(title) => println!("{} {}: {}", marker, title, notification.text),
            None => println!("{} {}", marker, notification.text),
        }
    }
}

fn print_documents(documents: &[DocumentView]) {
    println!("Documents:");
    for doc in documents {
        println!(
            "  {:<30} {:>10}  {}",
            doc.file_name,
            doc.formatted_size(),
            doc.status_text()
        );
    }
}
