//! Command line and environment configuration.

use std::time::Duration;

use chat_feed::{ChatSessionConfig, DEFAULT_SESSION_ID};
use clap::Parser;
use document_tracker::TrackerConfig;

/// Command line arguments. Each flag falls back to its environment variable.
#[derive(Debug, Parser)]
#[command(name = "assistant-sim")]
#[command(about = "Track a simulated upload through processing, then chat about it")]
#[command(args_override_self = true)]
pub struct Args {
    /// User whose documents are tracked
    #[arg(long = "user", env = "ASSISTANT_USER_ID", default_value = "demo-user")]
    pub user_id: String,

    /// Chat session id
    #[arg(long = "session", env = "ASSISTANT_SESSION_ID", default_value = DEFAULT_SESSION_ID)]
    pub session_id: String,

    /// Listing poll interval in milliseconds
    #[arg(long = "poll-interval-ms", env = "ASSISTANT_POLL_INTERVAL_MS", default_value_t = 5000)]
    pub poll_interval_ms: u64,

    /// Delay between simulated pipeline phases in milliseconds
    #[arg(long, default_value_t = 500)]
    pub step_ms: u64,

    /// Name of the uploaded file
    #[arg(long, default_value = "report.pdf")]
    pub file: String,

    /// Size of the uploaded file in bytes
    #[arg(long, default_value_t = 1_048_576)]
    pub size: u64,

    /// Make processing fail with this message
    #[arg(long)]
    pub fail_with: Option<String>,

    /// Prompt sent once the document is ready
    #[arg(long, default_value = "What is in my documents?")]
    pub prompt: String,

    /// Chat timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub chat_timeout_secs: u64,
}

/// Validated simulator configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub user_id: String,
    pub file: String,
    pub size: u64,
    pub fail_with: Option<String>,
    pub prompt: String,
    pub step: Duration,
    pub tracker: TrackerConfig,
    pub session: ChatSessionConfig,
}

impl SimConfig {
    /// Validate parsed arguments.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let user_id = args.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(ConfigError::MissingUserId);
        }

        let session_id = args.session_id.trim().to_string();
        if session_id.is_empty() {
            return Err(ConfigError::MissingSessionId);
        }

        if args.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        if args.file.trim().is_empty() {
            return Err(ConfigError::MissingFileName);
        }

        if args.chat_timeout_secs == 0 {
            return Err(ConfigError::InvalidChatTimeout);
        }

        let tracker = TrackerConfig::with_poll_interval(Duration::from_millis(args.poll_interval_ms));
        tracker
            .validate()
            .map_err(|e| ConfigError::Tracker(e.to_string()))?;

        Ok(Self {
            user_id,
            file: args.file.trim().to_string(),
            size: args.size,
            fail_with: args.fail_with,
            prompt: args.prompt,
            step: Duration::from_millis(args.step_ms),
            tracker,
            session: ChatSessionConfig::for_session(session_id)
                .chat_timeout(Duration::from_secs(args.chat_timeout_secs)),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("a user id is required (--user or ASSISTANT_USER_ID)")]
    MissingUserId,

    #[error("a session id is required (--session or ASSISTANT_SESSION_ID)")]
    MissingSessionId,

    #[error("ASSISTANT_POLL_INTERVAL_MS must be greater than zero")]
    InvalidPollInterval,

    #[error("a file name is required")]
    MissingFileName,

    #[error("chat timeout must be greater than zero")]
    InvalidChatTimeout,

    #[error("invalid tracker configuration: {0}")]
    Tracker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec![
            "assistant-sim",
            "--user",
            "u1",
            "--session",
            "001",
            "--poll-interval-ms",
            "5000",
        ];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = SimConfig::from_args(parse(&[])).unwrap();

        assert_eq!(config.user_id, "u1");
        assert_eq!(config.session.session_id, "001");
        assert_eq!(config.tracker.poll_interval, Duration::from_secs(5));
        assert_eq!(config.session.gate.chat_timeout, Duration::from_secs(60));
        assert_eq!(config.file, "report.pdf");
        assert!(config.fail_with.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = SimConfig::from_args(parse(&[
            "--poll-interval-ms",
            "250",
            "--file",
            "notes.txt",
            "--fail-with",
            "bad pdf",
        ]))
        .unwrap();

        assert_eq!(config.tracker.poll_interval, Duration::from_millis(250));
        assert_eq!(config.file, "notes.txt");
        assert_eq!(config.fail_with.as_deref(), Some("bad pdf"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            SimConfig::from_args(parse(&["--user", "  "])),
            Err(ConfigError::MissingUserId)
        ));
        assert!(matches!(
            SimConfig::from_args(parse(&["--poll-interval-ms", "0"])),
            Err(ConfigError::InvalidPollInterval)
        ));
        assert!(matches!(
            SimConfig::from_args(parse(&["--chat-timeout-secs", "0"])),
            Err(ConfigError::InvalidChatTimeout)
        ));
    }
}
