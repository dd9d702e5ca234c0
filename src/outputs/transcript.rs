//! JSON transcript of a closed job session.
//!
//! Transcripts are grouped by the UTC date the session closed and named
//! after the job id and close time, so repeated runs of the same job never
//! overwrite each other within a second.

use crate::models::JobSession;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// File name for a transcript: the job id with anything outside
/// `[A-Za-z0-9_-]` replaced, then the close time.
pub fn transcript_file_name(job_id: &str, closed_at: DateTime<Utc>) -> String {
    let safe_id: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{}.json", safe_id, closed_at.format("%H%M%S"))
}

/// Write `session` under `{dir}/{date}/` and return the file path.
///
/// # Arguments
///
/// * `session` - A closed session, serialized as pretty JSON
/// * `dir` - Transcript root; the date subdirectory is created as needed
/// * `closed_at` - Close time, which picks the date directory and file name
///
/// # Returns
///
/// Path of the written file, or the serialization / filesystem error.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), job_id = %session.job_id))]
pub async fn write_transcript(
    session: &JobSession,
    dir: &Path,
    closed_at: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(session)?;

    let day_dir = dir.join(closed_at.format("%Y-%m-%d").to_string());
    if let Err(e) = fs::create_dir_all(&day_dir).await {
        error!(path = %day_dir.display(), error = %e, "Failed to create transcript dir");
        return Err(e.into());
    }

    let path = day_dir.join(transcript_file_name(&session.job_id, closed_at));
    fs::write(&path, json).await?;
    info!(path = %path.display(), lines = session.lines.len(), "Wrote session transcript");

    Ok(path)
}
