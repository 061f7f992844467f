//! Scripted walk of a file through the processing pipeline.

use std::sync::Arc;
use std::time::Duration;

use assistant_core::{Phase, ProcessingStatus};
use chrono::Utc;
use tokio::time::sleep;
use tracing::debug;

use crate::status::MemoryStatusChannel;

/// How a simulated pipeline run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    Failed(Option<String>),
}

/// Pushes the phases of a pipeline run into a [`MemoryStatusChannel`].
///
/// Phases: uploading (0%) → processing (25%) → vectorizing (60%) → the outcome.
#[derive(Clone)]
pub struct PipelineSimulator {
    channel: Arc<MemoryStatusChannel>,
    step: Duration,
}

impl PipelineSimulator {
    /// Create a simulator that waits `step` between phases.
    pub fn new(channel: Arc<MemoryStatusChannel>, step: Duration) -> Self {
        Self { channel, step }
    }

    /// Run one file through the pipeline.
    pub async fn run(&self, user_id: &str, file_name: &str, outcome: PipelineOutcome) {
        let started_at = Utc::now();
        let steps = [
            (Phase::Uploading, 0),
            (Phase::Processing, 25),
            (Phase::Vectorizing, 60),
        ];

        for (phase, progress) in steps {
            let mut status = ProcessingStatus::new(user_id, file_name, phase).with_progress(progress);
            status.started_at = Some(started_at);
            debug!(file_name, phase = %phase, "Pipeline step");
            self.channel.upsert(status);
            sleep(self.step).await;
        }

        let mut last = match outcome {
            PipelineOutcome::Completed => {
                ProcessingStatus::new(user_id, file_name, Phase::Completed).with_progress(100)
            }
            PipelineOutcome::Failed(message) => {
                let status = ProcessingStatus::new(user_id, file_name, Phase::Failed);
                match message {
                    Some(message) => status.with_error(message),
                    None => status,
                }
            }
        };
        last.started_at = Some(started_at);
        last.completed_at = Some(Utc::now());
        debug!(file_name, phase = %last.phase, "Pipeline finished");
        self.channel.upsert(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_ends_in_outcome() {
        let channel = Arc::new(MemoryStatusChannel::new());
        let sim = PipelineSimulator::new(Arc::clone(&channel), Duration::from_millis(1));

        sim.run("u1", "a.pdf", PipelineOutcome::Completed).await;
        let current = channel.current("u1");
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].phase, Phase::Completed);
        assert!(current[0].completed_at.is_some());

        sim.run("u1", "b.pdf", PipelineOutcome::Failed(Some("bad pdf".into())))
            .await;
        let failed = channel
            .current("u1")
            .into_iter()
            .find(|s| s.file_name == "b.pdf")
            .unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("bad pdf"));
    }
}
