//! # Record Ledger
//!
//! Append-only text file of upload records, one line per upload:
//!
//! ```text
//! <identifier> <sourceTag> <label> <timestamp>
//! ```
//!
//! The file is opened, written and closed on every append. No handle is
//! kept between calls.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tracing::debug;

use crate::domain::{ContentIdentifier, GatewayKind, ProbeError, UploadRecord, LEDGER_TIMESTAMP_FORMAT};

/// Default ledger file name inside the workspace.
pub const LEDGER_FILE_NAME: &str = "filehashes.txt";

/// Append-only upload ledger.
#[derive(Clone, Debug)]
pub struct RecordLedger {
    path: PathBuf,
}

impl RecordLedger {
    /// Ledger at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger at `<workspace>/filehashes.txt`.
    pub fn in_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(LEDGER_FILE_NAME))
    }

    /// Ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &UploadRecord) -> Result<(), ProbeError> {
        let line = record.ledger_line();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ProbeError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ProbeError::io(&self.path, e))?;
        debug!(fid = %record.cid, ledger = %self.path.display(), "Recorded upload");
        Ok(())
    }

    /// Parse every record currently in the ledger. Malformed lines are skipped.
    pub fn read_records(&self) -> Result<Vec<UploadRecord>, ProbeError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| ProbeError::io(&self.path, e))?;
        Ok(text.lines().filter_map(parse_line).collect())
    }
}

fn parse_line(line: &str) -> Option<UploadRecord> {
    let mut parts = line.splitn(4, ' ');
    let cid = parts.next()?;
    let origin = match parts.next()? {
        "pub" => GatewayKind::Public,
        "slf" => GatewayKind::SelfHosted,
        _ => return None,
    };
    let display_name = parts.next()?;
    let timestamp = DateTime::parse_from_str(parts.next()?, LEDGER_TIMESTAMP_FORMAT).ok()?;
    Some(UploadRecord {
        cid: ContentIdentifier::new(cid),
        display_name: display_name.to_string(),
        origin,
        timestamp,
    })
}
