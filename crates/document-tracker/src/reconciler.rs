//! Merges the polled listing with the pushed status sets.
//!
//! The reconciler holds three pieces of state: the latest file snapshot, the
//! latest status set, and the last phase observed per file. The last one is
//! used only for edge detection: a file produces a [`Transition`] the first
//! time it is seen and whenever its phase differs from the last phase
//! observed for that file, never for a repeated identical phase. The
//! remembered phase survives deliveries that omit the file.
//!
//! The reconciler performs no I/O and cannot fail. Empty inputs mean
//! "nothing known": they never produce transitions and never erase the
//! remembered phases.

use std::collections::{HashMap, HashSet};

use assistant_core::{DocumentView, FileRecord, Notification, Phase, ProcessingStatus};

/// Fallback shown when a failed status carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// An observed change of a file's phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub file_name: String,
    /// Phase seen in an earlier delivery, `None` on first observation.
    pub from: Option<Phase>,
    pub to: Phase,
    pub error_message: Option<String>,
}

impl Transition {
    /// Whether this is the first time the file was observed.
    pub fn is_first_observation(&self) -> bool {
        self.from.is_none()
    }

    /// Render the transition as a user-visible notification.
    pub fn notification(&self) -> Notification {
        let file = &self.file_name;
        match self.to {
            Phase::Uploading => Notification::info(format!(
                "{} uploaded successfully. Processing will begin shortly...",
                file
            )),
            Phase::Processing => Notification::info(format!("{} is being processed...", file)),
            Phase::Vectorizing => {
                Notification::info(format!("{} is being vectorized for search...", file))
            }
            Phase::Completed => Notification::success(format!("{} is ready for chat!", file)),
            Phase::Failed => Notification::error(format!(
                "{} processing failed: {}",
                file,
                self.error_message.as_deref().unwrap_or(UNKNOWN_ERROR)
            )),
        }
    }
}

/// Per-user reconciliation state.
#[derive(Debug, Default)]
pub struct Reconciler {
    files: Vec<FileRecord>,
    statuses: HashMap<String, ProcessingStatus>,
    previous_phase_by_file: HashMap<String, Phase>,
}

impl Reconciler {
    /// Create a reconciler that knows nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the file list with a new snapshot.
    pub fn apply_snapshot(&mut self, files: Vec<FileRecord>) {
        self.files = files;
    }

    /// Apply a full status set and return the transitions it reveals.
    ///
    /// Every comparison is made against the phases remembered *before* this
    /// delivery. Files missing from the set keep their remembered phase.
    pub fn apply_statuses(&mut self, statuses: Vec<ProcessingStatus>) -> Vec<Transition> {
        // Only the first record per file counts
        let mut seen = HashSet::new();
        let delivered: Vec<ProcessingStatus> = statuses
            .into_iter()
            .filter(|status| seen.insert(status.file_name.clone()))
            .collect();

        let transitions: Vec<Transition> = delivered
            .iter()
            .filter_map(|status| {
                let from = self.previous_phase_by_file.get(&status.file_name).copied();
                (from != Some(status.phase)).then(|| Transition {
                    file_name: status.file_name.clone(),
                    from,
                    to: status.phase,
                    error_message: status.error_message.clone(),
                })
            })
            .collect();

        for status in &delivered {
            self.previous_phase_by_file
                .insert(status.file_name.clone(), status.phase);
        }

        // Latest delivery wins as a whole
        self.statuses = delivered
            .into_iter()
            .map(|status| (status.file_name.clone(), status))
            .collect();

        transitions
    }

    /// The unified document list: every listed file joined with its status.
    pub fn view(&self) -> Vec<DocumentView> {
        self.files
            .iter()
            .map(|file| DocumentView::from_record(file, self.statuses.get(&file.file_name)))
            .collect()
    }

    /// The current file snapshot.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// The last phase observed for `file_name`, if any.
    pub fn previous_phase(&self, file_name: &str) -> Option<Phase> {
        self.previous_phase_by_file.get(file_name).copied()
    }
}
