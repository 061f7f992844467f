//! Document listing and processing-status types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root folder under which each user's uploads are stored.
pub const USER_DOCUMENTS_ROOT: &str = "user-documents";

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Storage scope holding one user's uploaded documents.
pub fn user_scope(user_id: &str) -> String {
    format!("{}/{}", USER_DOCUMENTS_ROOT, user_id)
}

/// A stored object returned by a blob listing, before its metadata is read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef {
    /// File name within the scope.
    pub name: String,
    /// Full object path (scope + name).
    pub full_path: String,
}

impl BlobRef {
    /// Create a reference to `name` inside `scope`.
    pub fn new(scope: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_path: format!("{}/{}", scope, name),
            name,
        }
    }
}

/// Metadata for one stored file, as seen by a single listing cycle.
///
/// Records are never patched: the next cycle replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name, unique per user.
    #[serde(rename = "name")]
    pub file_name: String,
    /// Size in bytes.
    pub size: u64,
    /// When the object was created (upload time).
    #[serde(rename = "timeCreated")]
    pub created_at: DateTime<Utc>,
    /// When the object was last modified.
    #[serde(rename = "updated")]
    pub last_modified_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a record whose creation and modification times are equal.
    pub fn new(file_name: impl Into<String>, size: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            size,
            created_at,
            last_modified_at: created_at,
        }
    }
}

/// Pipeline phase of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Uploading,
    Processing,
    Vectorizing,
    Completed,
    Failed,
}

impl Phase {
    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uploading => "uploading",
            Phase::Processing => "processing",
            Phase::Vectorizing => "vectorizing",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }

    /// Whether the pipeline has stopped for this document.
    ///
    /// A terminal phase can still be left again (a failed file may be retried).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current pipeline state for one `(user_id, file_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub user_id: String,
    pub file_name: String,
    #[serde(rename = "status")]
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(
        rename = "progress_percentage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProcessingStatus {
    /// Create a status with no progress, error or timestamps.
    pub fn new(user_id: impl Into<String>, file_name: impl Into<String>, phase: Phase) -> Self {
        Self {
            user_id: user_id.into(),
            file_name: file_name.into(),
            phase,
            error_message: None,
            progress_percent: None,
            started_at: None,
            completed_at: None,
            updated_at: None,
        }
    }

    /// Builder method to set the error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Builder method to set the progress percentage (clamped to 100).
    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress_percent = Some(percent.min(100));
        self
    }

    /// Builder method to set `updated_at`.
    pub fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// One row of the document panel: a listed file joined with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub file_name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub phase: Phase,
    pub progress_percent: Option<u8>,
    pub error_message: Option<String>,
    /// Whether a pipeline status backs this row.
    pub tracked: bool,
}

impl DocumentView {
    /// Join a listed file with its current status.
    ///
    /// Files without a status predate status tracking (or their status
    /// expired) and are shown as completed.
    pub fn from_record(record: &FileRecord, status: Option<&ProcessingStatus>) -> Self {
        let (phase, progress_percent, error_message) = match status {
            Some(status) => (
                status.phase,
                status.progress_percent,
                status.error_message.clone(),
            ),
            None => (Phase::Completed, None, None),
        };

        Self {
            file_name: record.file_name.clone(),
            size: record.size,
            uploaded_at: record.created_at,
            modified_at: record.last_modified_at,
            phase,
            progress_percent,
            error_message,
            tracked: status.is_some(),
        }
    }

    /// Short label describing the row's state.
    pub fn status_text(&self) -> String {
        if !self.tracked {
            return "Completed".to_string();
        }

        // A zero percentage reads as "no progress yet"
        let progress = match self.progress_percent {
            Some(p) if p > 0 => format!(" ({}%)", p),
            _ => String::new(),
        };

        match self.phase {
            Phase::Uploading => format!("Uploading...{}", progress),
            Phase::Processing => format!("Processing...{}", progress),
            Phase::Vectorizing => format!("Vectorizing...{}", progress),
            Phase::Completed => "Ready for chat".to_string(),
            Phase::Failed => "Processing failed".to_string(),
        }
    }

    /// File size formatted for display.
    pub fn formatted_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Format a byte count using base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_status_wire_names() {
        let json = r#"{
            "user_id": "u1",
            "file_name": "a.pdf",
            "status": "failed",
            "error_message": "bad pdf",
            "progress_percentage": 40,
            "updated_at": "2024-05-01T10:00:00Z"
        }"#;
        let status: ProcessingStatus = serde_json::from_str(json).unwrap();

        assert_eq!(status.phase, Phase::Failed);
        assert_eq!(status.error_message.as_deref(), Some("bad pdf"));
        assert_eq!(status.progress_percent, Some(40));
        assert!(status.started_at.is_none());
        assert!(status.updated_at.is_some());

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["progress_percentage"], 40);
        assert!(value.get("completed_at").is_none());
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let json = r#"{"user_id":"u1","file_name":"a.pdf","status":"cancelled"}"#;
        assert!(serde_json::from_str::<ProcessingStatus>(json).is_err());
    }

    #[test]
    fn test_file_record_wire_names() {
        let json = r#"{"name":"a.pdf","size":2048,"timeCreated":"2024-05-01T10:00:00Z","updated":"2024-05-01T10:05:00Z"}"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.file_name, "a.pdf");
        assert_eq!(record.size, 2048);
        assert!(record.last_modified_at > record.created_at);
    }

    #[test]
    fn test_untracked_file_is_completed() {
        let record = FileRecord::new("old.pdf", 10, ts(100));
        let view = DocumentView::from_record(&record, None);

        assert_eq!(view.phase, Phase::Completed);
        assert!(!view.tracked);
        assert_eq!(view.status_text(), "Completed");
    }

    #[test]
    fn test_status_is_authoritative_for_phase() {
        let record = FileRecord::new("a.pdf", 10, ts(100));
        let status = ProcessingStatus::new("u1", "a.pdf", Phase::Processing).with_progress(40);
        let view = DocumentView::from_record(&record, Some(&status));

        assert_eq!(view.phase, Phase::Processing);
        assert_eq!(view.size, 10);
        assert_eq!(view.uploaded_at, ts(100));
        assert_eq!(view.status_text(), "Processing... (40%)");
    }

    #[test]
    fn test_status_text_hides_zero_progress() {
        let record = FileRecord::new("a.pdf", 10, ts(100));
        let status = ProcessingStatus::new("u1", "a.pdf", Phase::Uploading).with_progress(0);
        let view = DocumentView::from_record(&record, Some(&status));
        assert_eq!(view.status_text(), "Uploading...");

        let failed = ProcessingStatus::new("u1", "a.pdf", Phase::Failed).with_error("boom");
        let view = DocumentView::from_record(&record, Some(&failed));
        assert_eq!(view.status_text(), "Processing failed");
        assert_eq!(view.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_phase_terminal() {
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::Vectorizing.is_terminal());
        assert_eq!(Phase::Vectorizing.to_string(), "vectorizing");
    }

    #[test]
    fn test_blob_ref_path() {
        let blob = BlobRef::new(&user_scope("u1"), "a.pdf");
        assert_eq!(blob.full_path, "user-documents/u1/a.pdf");
    }
}
